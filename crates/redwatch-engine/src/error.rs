use thiserror::Error;

/// Errors that can occur while matching content against rules.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] redwatch_store::StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
