//! Error types for restaviews-core

use thiserror::Error;

use crate::models::SyncTag;

/// Result type alias using restaviews-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in restaviews-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (DNS, refused connection, reset, timeout)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Remote API answered with a non-2xx status
    #[error("Server error {status} from {url}")]
    Server { status: u16, url: String },

    /// Remote API answered 2xx with a body we could not decode
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Network read failed and the local mirror had nothing either
    #[error("No data available, local or remote: {0}")]
    NotFoundLocally(String),

    /// Durable store write or read did not commit
    #[error("Store transaction failed: {0}")]
    Store(#[from] libsql::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Replay could not be requested from the scheduler
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Replay ran but some outbox entries are still pending
    #[error("Replay of {kind} incomplete: {failed} of {attempted} entries still pending")]
    ReplayIncomplete {
        kind: SyncTag,
        attempted: usize,
        failed: usize,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a read that failed with this error should fall back to the mirror.
    pub const fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable(_) | Self::Server { .. } | Self::InvalidResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_are_classified() {
        assert!(Error::NetworkUnavailable("refused".into()).is_remote_failure());
        assert!(Error::Server {
            status: 503,
            url: "http://localhost:1337/restaurants".into()
        }
        .is_remote_failure());
        assert!(!Error::NotFoundLocally("restaurant 3".into()).is_remote_failure());
        assert!(!Error::InvalidInput("rating".into()).is_remote_failure());
    }

    #[test]
    fn replay_incomplete_message_names_kind() {
        let error = Error::ReplayIncomplete {
            kind: SyncTag::Favorites,
            attempted: 3,
            failed: 1,
        };
        assert_eq!(
            error.to_string(),
            "Replay of syncFavorites incomplete: 1 of 3 entries still pending"
        );
    }
}
