use thiserror::Error;

/// Errors that can occur while fetching or persisting upstream content.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport-level failure talking to the upstream feed.
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream feed answered with a non-success status.
    #[error("Upstream returned HTTP {status} for r/{community}")]
    UpstreamStatus { community: String, status: u16 },

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] redwatch_store::StoreError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
