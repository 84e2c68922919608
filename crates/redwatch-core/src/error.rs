use thiserror::Error;

/// Errors raised by config loading and boundary validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid community name: {0}")]
    InvalidCommunity(String),

    #[error("Invalid webhook URL: {0}")]
    InvalidWebhookUrl(String),

    #[error("Invalid keyword rule: {0}")]
    InvalidRule(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
