//! `redwatch-ingest` — polling ingestor for community feeds.
//!
//! Fetches new posts and top-level comments from the upstream public
//! JSON endpoints (no API credentials required), normalizes content,
//! deduplicates against both the batch and the store, and persists new
//! [`redwatch_store::ContentItem`] rows one community-batch at a time.

pub mod error;
pub mod feed;
pub mod poller;

pub use error::{IngestError, Result};
pub use feed::{build_client, RawItem};
pub use poller::Poller;
