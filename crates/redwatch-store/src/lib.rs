//! `redwatch-store` — SQLite persistence for the alert pipeline.
//!
//! # Overview
//!
//! One [`Store`] wraps a SQLite connection and exposes typed operations
//! over the six tables the pipeline shares: tenants, monitored
//! communities, keyword rules, webhook endpoints, content items, and
//! matches. Content is written exactly once by the ingestor (guarded by
//! unique `source_id` and `digest`); match rows are created `pending`
//! by the engine and finalized by the dispatcher; the retention sweep
//! deletes matches before content to respect foreign keys.

pub mod db;
pub mod error;
pub mod retention;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use retention::{run_retention, RetentionSummary};
pub use store::Store;
pub use types::{
    AlertStatus, CommunityStatus, ContentItem, ContentKind, KeywordRule, MatchRecord,
    MonitoredCommunity, NewContentItem, NewMatch, NewRule, Tenant, WebhookEndpoint,
};
