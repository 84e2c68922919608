//! Polls monitored communities and persists new content.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use redwatch_core::config::{RedwatchConfig, INTER_FETCH_DELAY_SECS};
use redwatch_store::{ContentItem, NewContentItem, Store};
use redwatch_text::{content_digest, normalize};

use crate::error::Result;
use crate::feed::{build_client, fetch_comments, fetch_posts, RawItem};

/// Fetches new posts and top-level comments for monitored communities,
/// normalizing, deduplicating, and persisting them.
pub struct Poller {
    store: Arc<Store>,
    client: reqwest::Client,
    base_url: String,
    feed_limit: u32,
}

impl Poller {
    pub fn new(store: Arc<Store>, config: &RedwatchConfig) -> Result<Self> {
        Ok(Self {
            store,
            client: build_client(&config.upstream.user_agent)?,
            base_url: config.upstream.base_url.trim_end_matches('/').to_string(),
            feed_limit: config.poll.feed_limit,
        })
    }

    /// Fetch both feeds for one community (with the inter-request
    /// delay), then persist whatever survives deduplication as a single
    /// batch. A fetch failure skips the whole community: nothing from a
    /// half-fetched tick is persisted.
    pub async fn poll_community(&self, name: &str) -> Result<Vec<ContentItem>> {
        let mut raw = fetch_posts(&self.client, &self.base_url, name, self.feed_limit).await?;

        tokio::time::sleep(Duration::from_secs(INTER_FETCH_DELAY_SECS)).await;

        raw.extend(fetch_comments(&self.client, &self.base_url, name, self.feed_limit).await?);

        let new_items = self.persist_batch(raw)?;
        self.store.mark_community_polled(name, Utc::now())?;
        Ok(new_items)
    }

    /// Poll every community with at least one active monitor. Failures
    /// are logged per community and never propagate; a failed community
    /// maps to an empty list and is retried next tick.
    pub async fn poll_all_active(&self) -> HashMap<String, Vec<ContentItem>> {
        let names = match self.store.distinct_active_communities() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "could not load active communities");
                return HashMap::new();
            }
        };

        let mut results = HashMap::with_capacity(names.len());
        for name in names {
            match self.poll_community(&name).await {
                Ok(items) => {
                    info!(community = %name, new_items = items.len(), "community polled");
                    results.insert(name, items);
                }
                Err(e) => {
                    warn!(community = %name, error = %e, "community poll failed");
                    results.insert(name, Vec::new());
                }
            }
        }
        results
    }

    /// Normalize, deduplicate, and persist raw items in one transaction.
    ///
    /// Skip order per item: empty normalized text, digest already seen
    /// in this batch, digest persisted, source id persisted.
    fn persist_batch(&self, raw_items: Vec<RawItem>) -> Result<Vec<ContentItem>> {
        let mut seen_digests: HashSet<String> = HashSet::new();
        let mut to_insert = Vec::new();

        for item in raw_items {
            let text = compose_text(&item);
            let normalized = normalize(&text);
            if normalized.text.is_empty() {
                continue;
            }

            let digest = content_digest(&normalized.text);
            if !seen_digests.insert(digest.clone()) {
                continue;
            }
            if self.store.digest_exists(&digest)? {
                continue;
            }
            if self.store.source_id_exists(&item.source_id)? {
                continue;
            }

            to_insert.push(NewContentItem {
                source_id: item.source_id,
                community: item.community,
                kind: item.kind,
                title: item.title,
                body: item.body,
                author: item.author,
                normalized_text: normalized.text,
                digest,
                source_created_at: item.source_created_at,
            });
        }

        Ok(self.store.insert_content_batch(to_insert)?)
    }
}

/// Title plus body for posts, body alone for comments.
fn compose_text(item: &RawItem) -> String {
    match &item.title {
        Some(title) if !title.is_empty() => format!("{title} {}", item.body),
        _ => item.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redwatch_store::ContentKind;

    fn poller_with_store() -> (Poller, Arc<Store>) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let poller = Poller::new(store.clone(), &RedwatchConfig::default()).unwrap();
        (poller, store)
    }

    fn raw(source_id: &str, body: &str) -> RawItem {
        RawItem {
            source_id: source_id.to_string(),
            community: "sportsbook".to_string(),
            kind: ContentKind::Comment,
            title: None,
            body: body.to_string(),
            author: "author".to_string(),
            source_created_at: Utc::now(),
        }
    }

    #[test]
    fn identical_normalized_text_is_persisted_once() {
        let (poller, store) = poller_with_store();

        let created = poller
            .persist_batch(vec![
                raw("t1_a", "Same text here"),
                raw("t1_b", "same   TEXT here"),
            ])
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].source_id, "t1_a");
        assert!(store.source_id_exists("t1_a").unwrap());
        assert!(!store.source_id_exists("t1_b").unwrap());
    }

    #[test]
    fn already_persisted_digest_is_skipped() {
        let (poller, _store) = poller_with_store();

        let first = poller.persist_batch(vec![raw("t1_a", "unique text")]).unwrap();
        assert_eq!(first.len(), 1);

        let second = poller.persist_batch(vec![raw("t1_c", "unique text")]).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn already_persisted_source_id_is_skipped() {
        let (poller, _store) = poller_with_store();

        poller.persist_batch(vec![raw("t1_a", "first body")]).unwrap();
        let second = poller
            .persist_batch(vec![raw("t1_a", "completely different body")])
            .unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn empty_normalized_text_is_not_persisted() {
        let (poller, _store) = poller_with_store();
        let created = poller
            .persist_batch(vec![raw("t1_a", "   "), raw("t1_b", "https://only.a/url")])
            .unwrap();
        assert!(created.is_empty());
    }

    #[test]
    fn post_text_includes_title() {
        let item = RawItem {
            title: Some("Big Promo".to_string()),
            ..raw("t3_a", "free bets")
        };
        assert_eq!(compose_text(&item), "Big Promo free bets");
        assert_eq!(compose_text(&raw("t1_b", "just a comment")), "just a comment");
    }
}
