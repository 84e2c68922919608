//! One full poll → match → alert cycle.

use tracing::{error, info};

use redwatch_alerts::Dispatcher;
use redwatch_engine::MatchEngine;
use redwatch_ingest::Poller;
use redwatch_store::ContentItem;

/// Counts from one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub communities_polled: usize,
    pub new_items: usize,
    pub matches_found: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
}

/// Execute the full pipeline: poll all active communities, run new
/// content through the match engine, then dispatch pending alerts.
///
/// Stage failures are logged and the remaining stages still run — in
/// particular, dispatch drains whatever is pending even when matching
/// produced nothing this tick.
pub async fn run_pipeline(
    poller: &Poller,
    engine: &MatchEngine,
    dispatcher: &Dispatcher,
) -> PipelineSummary {
    let mut summary = PipelineSummary::default();

    let poll_results = poller.poll_all_active().await;
    summary.communities_polled = poll_results.len();

    let new_items: Vec<ContentItem> = poll_results.into_values().flatten().collect();
    summary.new_items = new_items.len();
    info!(
        communities = summary.communities_polled,
        new_items = summary.new_items,
        "poll complete"
    );

    if !new_items.is_empty() {
        match engine.process_batch(&new_items) {
            Ok(matches) => {
                summary.matches_found = matches.len();
                info!(matches = summary.matches_found, "matching complete");
            }
            Err(e) => error!(error = %e, "match stage failed"),
        }
    }

    match dispatcher.dispatch_pending().await {
        Ok(result) => {
            summary.alerts_sent = result.sent;
            summary.alerts_failed = result.failed;
            info!(
                sent = result.sent,
                failed = result.failed,
                "alerting complete"
            );
        }
        Err(e) => error!(error = %e, "dispatch stage failed"),
    }

    info!(?summary, "pipeline run finished");
    summary
}
