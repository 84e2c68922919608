use thiserror::Error;

/// Errors that can occur while dispatching alerts.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Could not build the webhook HTTP client.
    #[error("Webhook client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] redwatch_store::StoreError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
