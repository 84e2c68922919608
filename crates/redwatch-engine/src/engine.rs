use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use redwatch_store::{ContentItem, KeywordRule, MatchRecord, NewMatch, Store};
use redwatch_text::{find_matches, MatchHit, NormalizedText};

use crate::error::Result;

/// Runs new content against tenant keyword rules and persists matches.
pub struct MatchEngine {
    store: Arc<Store>,
}

impl MatchEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Run a single content item against every relevant rule.
    ///
    /// One row is stored per (tenant, rule, content): when a rule
    /// matches several times, the first occurrence wins, and the other
    /// matched phrases survive through `also_matched`, which is one
    /// consistent snapshot across all of a tenant's hits on this item.
    /// The item's matches commit as one unit; nothing commits when
    /// there are no matches.
    pub fn process_content(&self, item: &ContentItem) -> Result<Vec<MatchRecord>> {
        let tenant_ids = self
            .store
            .active_tenant_ids_for_community(&item.community)?;
        if tenant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let normalized = NormalizedText::from_stored(&item.normalized_text);
        let now = Utc::now();

        // tenant id -> rules that hit, with every occurrence kept so the
        // also_matched snapshot sees all phrases.
        let mut tenant_hits: HashMap<String, Vec<(KeywordRule, Vec<MatchHit>)>> = HashMap::new();

        for tenant_id in tenant_ids {
            for rule in self.store.active_rules(&tenant_id, now)? {
                let hits = find_matches(&normalized, &rule.to_rule_config());
                if !hits.is_empty() {
                    debug!(
                        tenant_id = %tenant_id,
                        rule_id = %rule.id,
                        hits = hits.len(),
                        source_id = %item.source_id,
                        "rule matched content"
                    );
                    tenant_hits
                        .entry(tenant_id.clone())
                        .or_default()
                        .push((rule, hits));
                }
            }
        }

        let mut new_rows = Vec::new();
        for (tenant_id, rule_hits) in &tenant_hits {
            let all_phrases = distinct_phrases(rule_hits);

            for (rule, hits) in rule_hits {
                let Some(first) = hits.first() else { continue };
                let also_matched: Vec<String> = all_phrases
                    .iter()
                    .filter(|p| **p != first.matched_phrase)
                    .cloned()
                    .collect();

                new_rows.push(NewMatch {
                    tenant_id: tenant_id.clone(),
                    rule_id: rule.id.clone(),
                    content_id: item.id.clone(),
                    kind: item.kind,
                    community: item.community.clone(),
                    matched_phrase: first.matched_phrase.clone(),
                    also_matched,
                    snippet: first.snippet.chars().take(200).collect(),
                    proximity_score: first.proximity_score,
                    url: permalink(&item.community, &item.source_id),
                    author: item.author.clone(),
                    is_deleted: item.is_deleted,
                    detected_at: now,
                });
            }
        }

        if new_rows.is_empty() {
            return Ok(Vec::new());
        }

        let created = self.store.insert_matches(new_rows)?;
        info!(
            count = created.len(),
            source_id = %item.source_id,
            "matches created for content"
        );
        Ok(created)
    }

    /// Process multiple content items, returning all created matches.
    pub fn process_batch(&self, items: &[ContentItem]) -> Result<Vec<MatchRecord>> {
        let mut all_matches = Vec::new();
        for item in items {
            all_matches.extend(self.process_content(item)?);
        }
        Ok(all_matches)
    }
}

/// Distinct matched phrases across all of a tenant's hits, in first-seen
/// order.
fn distinct_phrases(rule_hits: &[(KeywordRule, Vec<MatchHit>)]) -> Vec<String> {
    let mut phrases = Vec::new();
    for (_, hits) in rule_hits {
        for hit in hits {
            if !phrases.contains(&hit.matched_phrase) {
                phrases.push(hit.matched_phrase.clone());
            }
        }
    }
    phrases
}

fn permalink(community: &str, source_id: &str) -> String {
    format!("https://reddit.com/r/{community}/comments/{source_id}")
}
