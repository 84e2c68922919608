//! Webhook delivery with bounded exponential backoff.

use std::time::Duration;

use tracing::warn;

use redwatch_core::config::WEBHOOK_TIMEOUT_SECS;

/// Attempts per delivery, including the first.
pub const MAX_ATTEMPTS: u32 = 3;
/// First retry delay; doubles per retry (1 s, 2 s).
pub const INITIAL_BACKOFF_SECS: u64 = 1;

pub fn build_webhook_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
        .build()
}

/// POST `payload` to `url`, retrying on any non-200/204 response or
/// transport error. Returns whether delivery eventually succeeded.
///
/// A receiver may accept a request whose response never arrives, so the
/// chat target sees at-least-once delivery.
pub async fn send_webhook(
    client: &reqwest::Client,
    url: &str,
    payload: &serde_json::Value,
) -> bool {
    let mut backoff = INITIAL_BACKOFF_SECS;

    for attempt in 1..=MAX_ATTEMPTS {
        match client.post(url).json(payload).send().await {
            Ok(resp) if matches!(resp.status().as_u16(), 200 | 204) => return true,
            Ok(resp) => warn!(
                status = resp.status().as_u16(),
                attempt,
                max_attempts = MAX_ATTEMPTS,
                "webhook returned error status"
            ),
            Err(e) => warn!(
                error = %e,
                attempt,
                max_attempts = MAX_ATTEMPTS,
                "webhook request failed"
            ),
        }

        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }

    false
}
