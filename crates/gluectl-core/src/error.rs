//! Unified error handling for gluectl-core
//!
//! Three kinds of failure reach callers: argument problems detected before
//! any network activity, a selector that cannot be evaluated, and a remote
//! call that failed. Remote failures keep the transport error as their
//! `source`.
//!
//! # Example
//!
//! ```rust
//! use gluectl_core::{CoreError, TransportError};
//!
//! let err = CoreError::Remote {
//!     operation: "GetBlueprint".to_string(),
//!     source: TransportError::Service {
//!         status: 400,
//!         code: "EntityNotFoundException".to_string(),
//!         message: "Blueprint b1 not found".to_string(),
//!     },
//! };
//! assert!(err.is_not_found());
//! assert!(!err.is_argument_error());
//! ```

use thiserror::Error;

use crate::transport::TransportError;

/// Core error type for descriptor binding and invocation
#[derive(Error, Debug)]
pub enum CoreError {
    /// A parameter value could not be bound to its field
    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidArgument { parameter: String, reason: String },

    /// The result selector is malformed or names an unknown parameter
    #[error("Invalid select expression '{expression}': {reason}")]
    InvalidSelect { expression: String, reason: String },

    /// No operation has the requested name
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    /// The remote call failed
    #[error("{operation} failed: {source}")]
    Remote {
        operation: String,
        #[source]
        source: TransportError,
    },

    /// The endpoint host could not be resolved
    #[error(
        "Name resolution failure attempting to reach service endpoint '{endpoint}' for {operation}; \
         check the configured region and endpoint URL"
    )]
    NameResolution {
        operation: String,
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// The caller stopped the invocation between pages
    #[error("{operation} cancelled after {completed_calls} call(s)")]
    Cancelled {
        operation: String,
        completed_calls: usize,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// The transport error behind a remote failure
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            CoreError::Remote { source, .. } | CoreError::NameResolution { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    /// Returns true for errors raised before any remote call was made
    #[must_use]
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidArgument { .. }
                | CoreError::InvalidSelect { .. }
                | CoreError::UnknownOperation(_)
        )
    }

    /// Returns true if the service reported a missing entity
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.transport().is_some_and(TransportError::is_not_found)
    }

    /// Returns true for authentication/authorization failures (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.transport().is_some_and(TransportError::is_unauthorized)
    }

    /// Returns true if the service throttled the request
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.transport().is_some_and(TransportError::is_throttled)
    }

    /// Returns true for local validation failures and service-side input errors
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            CoreError::InvalidArgument { .. } | CoreError::InvalidSelect { .. } => true,
            _ => self.transport().is_some_and(TransportError::is_bad_request),
        }
    }
}
