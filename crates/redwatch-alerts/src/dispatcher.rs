//! Pending-match dispatcher.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use redwatch_store::{MatchRecord, Store};

use crate::deliver::{build_webhook_client, send_webhook};
use crate::embed::{batch_payload, single_match_payload};
use crate::error::Result;
use crate::notify::{FailureNotice, NoticeQueue};

/// A tenant's group is collapsed into one batched message when it has
/// at least this many pending matches...
pub const BATCH_THRESHOLD: usize = 3;
/// ...all detected within this window.
pub const BATCH_WINDOW_SECS: i64 = 120;

/// Counts from one dispatch round. `total` is every pending match seen,
/// including those left pending because their tenant has no usable
/// endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
}

/// One outgoing message: a single match or a tenant's batched group.
struct AlertBatch {
    webhook_url: String,
    matches: Vec<MatchRecord>,
    is_batch: bool,
}

/// Sends chat alerts for pending matches.
pub struct Dispatcher {
    store: Arc<Store>,
    client: reqwest::Client,
    notices: Arc<NoticeQueue>,
}

impl Dispatcher {
    pub fn new(store: Arc<Store>, notices: Arc<NoticeQueue>) -> Result<Self> {
        Ok(Self {
            store,
            client: build_webhook_client()?,
            notices,
        })
    }

    /// Find pending matches, batch them per tenant, deliver, and apply
    /// every status transition in one commit at the end.
    pub async fn dispatch_pending(&self) -> Result<DispatchSummary> {
        let pending = self.store.pending_matches()?;
        if pending.is_empty() {
            return Ok(DispatchSummary::default());
        }
        let total = pending.len();

        let batches = self.batch_matches(pending)?;

        let mut sent_ids: Vec<String> = Vec::new();
        let mut failed_ids: Vec<String> = Vec::new();

        for batch in batches {
            let payload = if batch.is_batch {
                batch_payload(&batch.matches)
            } else {
                single_match_payload(&batch.matches[0])
            };

            if send_webhook(&self.client, &batch.webhook_url, &payload).await {
                sent_ids.extend(batch.matches.iter().map(|m| m.id.clone()));
            } else {
                for m in &batch.matches {
                    self.handle_failure(m);
                    failed_ids.push(m.id.clone());
                }
            }
        }

        self.store
            .finalize_alerts(&sent_ids, &failed_ids, Utc::now())?;

        let summary = DispatchSummary {
            sent: sent_ids.len(),
            failed: failed_ids.len(),
            total,
        };
        info!(
            sent = summary.sent,
            failed = summary.failed,
            total = summary.total,
            "dispatch round complete"
        );
        Ok(summary)
    }

    /// Group matches by tenant (dispatch order preserved) and apply the
    /// batching rule: ≥ [`BATCH_THRESHOLD`] matches whose detections all
    /// fall within [`BATCH_WINDOW_SECS`] collapse into one message,
    /// otherwise each match goes out individually. Tenants without a
    /// usable endpoint are skipped and their matches stay pending.
    fn batch_matches(&self, pending: Vec<MatchRecord>) -> Result<Vec<AlertBatch>> {
        let mut tenant_order: Vec<String> = Vec::new();
        let mut by_tenant: std::collections::HashMap<String, Vec<MatchRecord>> =
            std::collections::HashMap::new();
        for m in pending {
            if !by_tenant.contains_key(&m.tenant_id) {
                tenant_order.push(m.tenant_id.clone());
            }
            by_tenant.entry(m.tenant_id.clone()).or_default().push(m);
        }

        let mut batches = Vec::new();

        for tenant_id in tenant_order {
            let Some(matches) = by_tenant.remove(&tenant_id) else {
                continue;
            };

            let Some(webhook_url) = self.store.active_webhook_url(&tenant_id)? else {
                warn!(tenant_id = %tenant_id, "no active webhook for tenant, skipping");
                continue;
            };

            if matches.len() >= BATCH_THRESHOLD {
                let min_ts = matches.iter().map(|m| m.detected_at).min();
                let max_ts = matches.iter().map(|m| m.detected_at).max();
                if let (Some(min_ts), Some(max_ts)) = (min_ts, max_ts) {
                    if max_ts - min_ts <= Duration::seconds(BATCH_WINDOW_SECS) {
                        batches.push(AlertBatch {
                            webhook_url,
                            matches,
                            is_batch: true,
                        });
                        continue;
                    }
                }
            }

            for m in matches {
                batches.push(AlertBatch {
                    webhook_url: webhook_url.clone(),
                    matches: vec![m],
                    is_batch: false,
                });
            }
        }

        Ok(batches)
    }

    /// Retries are exhausted: log, and queue a fallback notice when the
    /// tenant has an email on file.
    fn handle_failure(&self, m: &MatchRecord) {
        error!(
            match_id = %m.id,
            phrase = %m.matched_phrase,
            community = %m.community,
            "alert delivery failed"
        );

        match self.store.tenant_email(&m.tenant_id) {
            Ok(Some(email)) => self.notices.enqueue(FailureNotice {
                email,
                matched_phrase: m.matched_phrase.clone(),
                community: m.community.clone(),
                url: m.url.clone(),
            }),
            Ok(None) => warn!(
                tenant_id = %m.tenant_id,
                "no email on file for tenant, cannot send failure notice"
            ),
            Err(e) => warn!(tenant_id = %m.tenant_id, error = %e, "tenant lookup failed"),
        }
    }
}
