use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] restaviews_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Restaurant ID cannot be empty")]
    EmptyId,
    #[error("Watch interval must be at least one second")]
    InvalidInterval,
    #[error("{failed} queued change(s) could not be delivered; they stay queued for the next `restaviews sync`")]
    SyncIncomplete { failed: usize },
}
