//! Repository error types.

use thiserror::Error;

use crate::catalog::{CatalogError, InvalidNameError, StoreName};

/// Result type for repository and session operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository and session operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// `initialize` was called on a handle that is attaching or attached.
    #[error("repository {name} cannot be initialized twice")]
    AlreadyInitialized { name: StoreName },

    /// CREATE found a store with the same name.
    #[error("can't create store {name}: a store with that name already exists")]
    StoreAlreadyExists { name: StoreName },

    /// OPEN found no store with the name.
    #[error("can't open store {name}: there is none")]
    StoreNotFound { name: StoreName },

    /// Federation configured outside the allowed window or access mode.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The handle has not been initialized yet.
    #[error("repository {name} used before it has been initialized")]
    NotInitialized { name: StoreName },

    /// The handle has been shut down.
    #[error("repository {name} used after it has been closed")]
    Closed { name: StoreName },

    /// The catalog or store call failed.
    #[error("{operation} failed on store {store}: {source}")]
    Catalog {
        operation: &'static str,
        store: StoreName,
        #[source]
        source: CatalogError,
    },

    /// The operation cannot be performed on this store.
    #[error("{operation} is not supported on store {store}: {reason}")]
    Unsupported {
        operation: &'static str,
        store: StoreName,
        reason: String,
    },

    /// A dedicated session was closed while holding uncommitted writes.
    #[error("session {session} has {pending} uncommitted change(s); commit or roll back first")]
    UncommittedWrites { session: String, pending: usize },

    /// The session was already closed.
    #[error("session {session} is closed")]
    SessionClosed { session: String },

    /// Invalid store name.
    #[error("invalid store name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config format error: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

impl RepositoryError {
    /// Wrap a catalog failure with the operation and store it happened on.
    pub fn catalog(operation: &'static str, store: &StoreName, source: CatalogError) -> Self {
        Self::Catalog {
            operation,
            store: store.clone(),
            source,
        }
    }

    pub(crate) fn unsupported(
        operation: &'static str,
        store: &StoreName,
        reason: impl Into<String>,
    ) -> Self {
        Self::Unsupported {
            operation,
            store: store.clone(),
            reason: reason.into(),
        }
    }

    /// Check if the server could not be reached.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RepositoryError::Catalog { source, .. } if source.is_connectivity())
    }

    /// Check if this error is retryable.
    ///
    /// Only transport failures qualify; nothing is retried internally.
    pub fn is_retryable(&self) -> bool {
        self.is_connectivity()
    }
}
