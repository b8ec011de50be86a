//! Unified error handling for converge-core
//!
//! Every convergence call ends in at most one `ConvergeError`. The variants
//! keep transport failures, unexpected remote answers, and "still not done"
//! apart so callers can tell a hard rejection from a slow backend.
//!
//! # Example
//!
//! ```rust
//! use converge_core::ConvergeError;
//! use std::time::Duration;
//!
//! let err = ConvergeError::Timeout {
//!     timeout: Duration::from_secs(300),
//!     last: Some("409 Conflict".to_string()),
//! };
//! assert!(err.is_timeout());
//! assert!(!err.is_cancelled());
//! ```

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::classify::StatusCodes;
use crate::config::ConfigError;
use crate::snapshot::SnapshotError;

/// Boxed error returned by caller-supplied operations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for convergence operations
#[derive(Error, Debug)]
pub enum ConvergeError {
    /// The operation itself failed (transport, decoding). Never retried.
    #[error("Operation failed: {0}")]
    Operation(#[source] BoxError),

    /// The operation answered with a code outside both configured sets
    #[error("Unexpected status code {code}: expected one of {stop} (done) or {retry} (retry)")]
    UnexpectedStatus {
        code: StatusCode,
        stop: StatusCodes,
        retry: StatusCodes,
    },

    /// The resource did not converge within the time budget
    #[error(
        "Did not converge within {timeout:?} (last observed: {})",
        .last.as_deref().unwrap_or("nothing")
    )]
    Timeout {
        timeout: Duration,
        last: Option<String>,
    },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Reading the resource failed while waiting for a state
    #[error("Failed to read resource '{resource_id}': {source}")]
    Read {
        resource_id: String,
        #[source]
        source: BoxError,
    },

    /// The status field could not be located in a snapshot
    #[error("Malformed snapshot for resource '{resource_id}': {source}")]
    MalformedSnapshot {
        resource_id: String,
        #[source]
        source: SnapshotError,
    },

    /// The resource reported a status that is neither pending nor target
    #[error(
        "Resource '{resource_id}' reported unexpected state '{status}' (pending: {pending:?}, target: {target:?})"
    )]
    UnexpectedState {
        resource_id: String,
        status: String,
        pending: Vec<String>,
        target: Vec<String>,
    },

    /// A create call converged but its response carried no resource id
    #[error("No resource ID in create response")]
    MissingResourceId,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for convergence operations
pub type Result<T> = std::result::Result<T, ConvergeError>;

impl ConvergeError {
    /// Returns true if the operation ran out of time budget
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConvergeError::Timeout { .. })
    }

    /// Returns true if the caller cancelled the operation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConvergeError::Cancelled)
    }

    /// Returns true if the remote answered with an unconfigured status code
    #[must_use]
    pub fn is_unexpected_status(&self) -> bool {
        matches!(self, ConvergeError::UnexpectedStatus { .. })
    }

    /// Returns true if the resource reported an unknown state
    #[must_use]
    pub fn is_unexpected_state(&self) -> bool {
        matches!(self, ConvergeError::UnexpectedState { .. })
    }

    /// Returns true if the error points at a provider/schema defect rather
    /// than at the remote system
    #[must_use]
    pub fn is_provider_defect(&self) -> bool {
        matches!(
            self,
            ConvergeError::MalformedSnapshot { .. } | ConvergeError::MissingResourceId
        )
    }

    /// The offending status code, if this is an unexpected status error
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ConvergeError::UnexpectedStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}
