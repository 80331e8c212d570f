//! Catalog client error types
//!
//! Failures reported by the remote catalog/store service. The repository layer
//! wraps these with the operation and store name before surfacing them.

use thiserror::Error;

use crate::catalog::types::InvalidNameError;

/// the main error type for catalog and store calls
#[derive(Debug, Error)]
pub enum CatalogError {
    /// the service is unreachable or returned a transport-level failure
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// a store with this name already exists
    #[error("store already exists: {0}")]
    AlreadyExists(String),

    /// no store with this name exists
    #[error("store not found: {0}")]
    NotFound(String),

    /// the server does not support the requested operation on this store
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// the server rejected the request arguments
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// a name returned by the server could not be validated
    #[error("invalid store name: {0}")]
    InvalidName(#[from] InvalidNameError),
}

impl CatalogError {
    /// check if this error indicates the store doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    /// check if this error is a transport failure
    pub fn is_connectivity(&self) -> bool {
        matches!(self, CatalogError::Connectivity(_))
    }
}

/// result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = CatalogError::NotFound("red".into());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_connectivity());

        let down = CatalogError::Connectivity("connection refused".into());
        assert!(down.is_connectivity());
        assert!(!down.is_not_found());
    }
}
