use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use redwatch_text::{tokenize_phrases, ExclusionScope, RuleConfig};

/// An isolated owner of rules, communities, endpoints, and matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// UUID v4 string — primary key.
    pub id: String,
    /// Contact address for fallback notices, if on file.
    pub email: Option<String>,
    /// Desired poll cadence. The shared scheduler currently runs one
    /// global cadence; this records the tenant's preference.
    pub poll_interval_minutes: i64,
    pub created_at: DateTime<Utc>,
}

/// Polling eligibility of a monitored community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityStatus {
    Active,
    Inaccessible,
    Private,
}

impl std::fmt::Display for CommunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommunityStatus::Active => "active",
            CommunityStatus::Inaccessible => "inaccessible",
            CommunityStatus::Private => "private",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CommunityStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(CommunityStatus::Active),
            "inaccessible" => Ok(CommunityStatus::Inaccessible),
            "private" => Ok(CommunityStatus::Private),
            other => Err(format!("unknown community status: {other}")),
        }
    }
}

/// A (tenant, community) monitoring record. Only `Active` rows
/// participate in polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredCommunity {
    pub id: String,
    pub tenant_id: String,
    /// Lowercase community name, no `r/` prefix.
    pub name: String,
    pub status: CommunityStatus,
    pub include_media_posts: bool,
    pub dedupe_crossposts: bool,
    pub filter_bots: bool,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A persisted keyword rule. `phrases` holds the storage form —
/// whitespace-joined phrase strings — tokenized on the way into the
/// matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub id: String,
    pub tenant_id: String,
    pub phrases: Vec<String>,
    pub exclusions: Vec<String>,
    pub proximity_window: u32,
    pub require_order: bool,
    pub use_stemming: bool,
    pub exclusion_scope: ExclusionScope,
    pub is_active: bool,
    /// While set and in the future the rule is treated as inactive.
    pub silenced_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl KeywordRule {
    /// Matcher-side view of this rule.
    pub fn to_rule_config(&self) -> RuleConfig {
        RuleConfig {
            phrases: tokenize_phrases(&self.phrases),
            exclusions: self.exclusions.clone(),
            proximity_window: self.proximity_window as usize,
            require_order: self.require_order,
            use_stemming: self.use_stemming,
            exclusion_scope: self.exclusion_scope,
        }
    }
}

/// Fields for creating a rule; id and created_at are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub tenant_id: String,
    pub phrases: Vec<String>,
    pub exclusions: Vec<String>,
    pub proximity_window: u32,
    pub require_order: bool,
    pub use_stemming: bool,
    pub exclusion_scope: ExclusionScope,
}

impl NewRule {
    /// A rule with default matching options for the given phrases.
    pub fn new(tenant_id: &str, phrases: &[&str]) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            exclusions: Vec::new(),
            proximity_window: 15,
            require_order: false,
            use_stemming: false,
            exclusion_scope: ExclusionScope::Anywhere,
        }
    }
}

/// Whether a content item came from the posts or the comments feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Post,
    Comment,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContentKind::Post => "post",
            ContentKind::Comment => "comment",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentKind::Post),
            "comment" => Ok(ContentKind::Comment),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

/// A persisted unit of fetched content. Written once on first sight;
/// only `is_deleted` mutates afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    /// Opaque upstream id, unique across all communities.
    pub source_id: String,
    pub community: String,
    pub kind: ContentKind,
    /// Posts only.
    pub title: Option<String>,
    pub body: String,
    pub author: String,
    pub normalized_text: String,
    /// Hex SHA-256 of `normalized_text`, unique.
    pub digest: String,
    pub source_created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Fields for persisting a content item; id and fetched_at are assigned
/// on insert.
#[derive(Debug, Clone)]
pub struct NewContentItem {
    pub source_id: String,
    pub community: String,
    pub kind: ContentKind,
    pub title: Option<String>,
    pub body: String,
    pub author: String,
    pub normalized_text: String,
    pub digest: String,
    pub source_created_at: DateTime<Utc>,
}

/// Delivery state of a match alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Sent,
    Failed,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Sent => "sent",
            AlertStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AlertStatus::Pending),
            "sent" => Ok(AlertStatus::Sent),
            "failed" => Ok(AlertStatus::Failed),
            other => Err(format!("unknown alert status: {other}")),
        }
    }
}

/// A tenant-scoped keyword finding on one content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub tenant_id: String,
    pub rule_id: String,
    pub content_id: String,
    pub kind: ContentKind,
    pub community: String,
    pub matched_phrase: String,
    /// Other phrases matched on the same item for the same tenant.
    pub also_matched: Vec<String>,
    pub snippet: String,
    pub proximity_score: f64,
    pub url: String,
    pub author: String,
    pub is_deleted: bool,
    pub detected_at: DateTime<Utc>,
    pub alert_sent_at: Option<DateTime<Utc>>,
    pub alert_status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a match; id, created_at, and the initial
/// `pending` status are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub tenant_id: String,
    pub rule_id: String,
    pub content_id: String,
    pub kind: ContentKind,
    pub community: String,
    pub matched_phrase: String,
    pub also_matched: Vec<String>,
    pub snippet: String,
    pub proximity_score: f64,
    pub url: String,
    pub author: String,
    pub is_deleted: bool,
    pub detected_at: DateTime<Utc>,
}

/// A per-tenant outbound webhook target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub id: String,
    pub tenant_id: String,
    pub url: String,
    pub is_primary: bool,
    pub is_active: bool,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
