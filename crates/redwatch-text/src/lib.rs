//! `redwatch-text` — text normalization and proximity keyword matching.
//!
//! # Overview
//!
//! The three stages every piece of fetched content passes through:
//!
//! | Stage | Function | Output |
//! |-------|----------|--------|
//! | Normalize | [`normalize`] | lowercase markup-free text + tokens + sentences |
//! | Digest | [`content_digest`] | hex SHA-256 of the normalized text, for dedup |
//! | Match | [`find_matches`] | occurrences of a rule's phrases with snippet + score |
//!
//! All offsets produced here are **character** offsets into the
//! normalized text, and the snippet window is measured in characters,
//! so the same input yields the same output on every platform.

pub mod digest;
pub mod matcher;
pub mod normalize;
pub mod stem;

pub use digest::content_digest;
pub use matcher::{find_matches, tokenize_phrases, ExclusionScope, MatchHit, RuleConfig};
pub use normalize::{normalize, NormalizedText};
pub use stem::stem;
