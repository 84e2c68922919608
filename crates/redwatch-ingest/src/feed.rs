//! Upstream feed client and response mapping.
//!
//! The two endpoints per community are `/r/{name}/new.json` (recent
//! posts) and `/r/{name}/comments.json` (recent comments, filtered here
//! to top-level only — parent prefix `t3_`).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use redwatch_core::config::UPSTREAM_TIMEOUT_SECS;
use redwatch_store::ContentKind;

use crate::error::{IngestError, Result};

/// Shared client for the upstream feeds: recognizable user agent,
/// generous timeout, redirects followed.
pub fn build_client(user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
        .build()
}

/// One fetched item, not yet normalized or persisted.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub source_id: String,
    pub community: String,
    pub kind: ContentKind,
    /// Posts only; comments carry everything in `body`.
    pub title: Option<String>,
    pub body: String,
    pub author: String,
    pub source_created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    kind: String,
    data: ItemData,
}

/// Subset of the upstream item payload the pipeline consumes.
#[derive(Debug, Deserialize)]
struct ItemData {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    parent_id: Option<String>,
}

impl ItemData {
    fn author_or_deleted(&self) -> String {
        match &self.author {
            Some(a) if !a.is_empty() => a.clone(),
            _ => "[deleted]".to_string(),
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_utc as i64, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Fetch recent posts from a community's public feed.
pub async fn fetch_posts(
    client: &reqwest::Client,
    base_url: &str,
    community: &str,
    limit: u32,
) -> Result<Vec<RawItem>> {
    let listing = fetch_listing(client, base_url, community, "new", limit).await?;

    Ok(listing
        .data
        .children
        .into_iter()
        .map(|child| RawItem {
            source_id: child.data.id.clone(),
            community: community.to_string(),
            kind: ContentKind::Post,
            title: Some(child.data.title.clone().unwrap_or_default()),
            body: child.data.selftext.clone().unwrap_or_default(),
            author: child.data.author_or_deleted(),
            source_created_at: child.data.created_at(),
        })
        .collect())
}

/// Fetch recent top-level comments from a community's public feed.
pub async fn fetch_comments(
    client: &reqwest::Client,
    base_url: &str,
    community: &str,
    limit: u32,
) -> Result<Vec<RawItem>> {
    let listing = fetch_listing(client, base_url, community, "comments", limit).await?;

    Ok(listing
        .data
        .children
        .into_iter()
        .filter(|child| {
            child.kind == "t1"
                && child
                    .data
                    .parent_id
                    .as_deref()
                    .is_some_and(|p| p.starts_with("t3_"))
        })
        .map(|child| RawItem {
            source_id: child.data.id.clone(),
            community: community.to_string(),
            kind: ContentKind::Comment,
            title: None,
            body: child.data.body.clone().unwrap_or_default(),
            author: child.data.author_or_deleted(),
            source_created_at: child.data.created_at(),
        })
        .collect())
}

async fn fetch_listing(
    client: &reqwest::Client,
    base_url: &str,
    community: &str,
    endpoint: &str,
    limit: u32,
) -> Result<Listing> {
    let url = format!("{base_url}/r/{community}/{endpoint}.json");
    let resp = client
        .get(&url)
        .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(IngestError::UpstreamStatus {
            community: community.to_string(),
            status: resp.status().as_u16(),
        });
    }

    Ok(resp.json().await?)
}
