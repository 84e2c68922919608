//! `redwatch-alerts` — webhook alert dispatcher.
//!
//! Pulls pending matches, groups them per tenant (batching ≥3 matches
//! detected within a two-minute window into one message), renders the
//! chat embed, and POSTs it to the tenant's webhook with bounded
//! exponential-backoff retry. Exhausted deliveries mark their matches
//! failed and queue a fallback notice when the tenant has an email on
//! file.

pub mod deliver;
pub mod dispatcher;
pub mod embed;
pub mod error;
pub mod notify;

pub use dispatcher::{DispatchSummary, Dispatcher};
pub use error::{DispatchError, Result};
pub use notify::{FailureNotice, NoticeQueue};
