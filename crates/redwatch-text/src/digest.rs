//! Content-addressed dedup digest.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of the normalized text. Two items collide only when
/// their normalized text is byte-identical, which is exactly the
/// duplicate condition the ingestor skips on.
pub fn content_digest(normalized_text: &str) -> String {
    hex::encode(Sha256::digest(normalized_text.as_bytes()))
}
