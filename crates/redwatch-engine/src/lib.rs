//! `redwatch-engine` — runs new content against tenant keyword rules.
//!
//! For each newly persisted content item the engine finds every tenant
//! actively monitoring the item's community, evaluates that tenant's
//! active (non-silenced) rules with the proximity matcher, and persists
//! one pending match row per (tenant, rule, content) with a shared
//! `also_matched` snapshot across the tenant's rules.

pub mod engine;
pub mod error;

pub use engine::MatchEngine;
pub use error::{EngineError, Result};
