//! Data retention sweep.
//!
//! Deletes match rows before content rows so the match→content foreign
//! key is never violated mid-sweep.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::Result;
use crate::store::Store;

/// Counts from one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionSummary {
    pub matches_deleted: usize,
    pub content_deleted: usize,
}

/// Delete matches detected and content fetched before
/// `now − retention_days`, in one transaction.
pub fn run_retention(
    store: &Store,
    retention_days: i64,
    now: DateTime<Utc>,
) -> Result<RetentionSummary> {
    let cutoff = (now - Duration::days(retention_days)).to_rfc3339();

    let mut db = store.conn.lock().unwrap();
    let tx = db.transaction()?;

    let matches_deleted = tx.execute("DELETE FROM matches WHERE detected_at < ?1", [&cutoff])?;
    let content_deleted =
        tx.execute("DELETE FROM content_items WHERE fetched_at < ?1", [&cutoff])?;

    tx.commit()?;

    info!(
        matches_deleted,
        content_deleted, retention_days, "retention sweep complete"
    );

    Ok(RetentionSummary {
        matches_deleted,
        content_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentKind, NewContentItem, NewMatch, NewRule};

    #[test]
    fn old_rows_deleted_matches_before_content() {
        let store = Store::open_in_memory().unwrap();
        let tenant = store.create_tenant(None, 60).unwrap();
        let rule = store
            .add_rule(NewRule::new(&tenant.id, &["arbitrage"]))
            .unwrap();

        let created = store
            .insert_content_batch(vec![NewContentItem {
                source_id: "t3_old".into(),
                community: "sportsbook".into(),
                kind: ContentKind::Post,
                title: None,
                body: "body".into(),
                author: "author".into(),
                normalized_text: "old text".into(),
                digest: "digest-old".into(),
                source_created_at: Utc::now(),
            }])
            .unwrap();

        let old = Utc::now() - Duration::days(120);
        store
            .insert_matches(vec![NewMatch {
                tenant_id: tenant.id.clone(),
                rule_id: rule.id.clone(),
                content_id: created[0].id.clone(),
                kind: ContentKind::Post,
                community: "sportsbook".into(),
                matched_phrase: "arbitrage".into(),
                also_matched: Vec::new(),
                snippet: "snippet".into(),
                proximity_score: 1.0,
                url: "https://reddit.com/r/sportsbook/comments/old".into(),
                author: "author".into(),
                is_deleted: false,
                detected_at: old,
            }])
            .unwrap();

        // Backdate the content row; fetched_at is assigned at insert.
        {
            let db = store.conn.lock().unwrap();
            db.execute(
                "UPDATE content_items SET fetched_at = ?1",
                [old.to_rfc3339()],
            )
            .unwrap();
        }

        let summary = run_retention(&store, 90, Utc::now()).unwrap();
        assert_eq!(summary.matches_deleted, 1);
        assert_eq!(summary.content_deleted, 1);
        assert!(!store.source_id_exists("t3_old").unwrap());
    }

    #[test]
    fn fresh_rows_survive() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_content_batch(vec![NewContentItem {
                source_id: "t3_new".into(),
                community: "sportsbook".into(),
                kind: ContentKind::Comment,
                title: None,
                body: "body".into(),
                author: "author".into(),
                normalized_text: "fresh text".into(),
                digest: "digest-new".into(),
                source_created_at: Utc::now(),
            }])
            .unwrap();

        let summary = run_retention(&store, 90, Utc::now()).unwrap();
        assert_eq!(summary, RetentionSummary::default());
        assert!(store.source_id_exists("t3_new").unwrap());
    }
}
