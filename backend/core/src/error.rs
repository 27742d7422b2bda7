use thiserror::Error;

/// Errors raised by the core value types.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
