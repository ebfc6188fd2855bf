//! Error types for operation waits
//!
//! Two things can go wrong: the wait itself fails (a refresh call errors, the
//! state is unexpected, or the deadline passes), or the operation finishes and
//! reports a failure of its own.
//!
//! # Example
//!
//! ```rust
//! use gae_opwait_core::{CoreError, OperationError, Status};
//!
//! let err: CoreError = OperationError(Status {
//!     code: 9,
//!     message: "Application already exists".to_string(),
//!     details: vec![],
//! })
//! .into();
//!
//! assert!(err.is_operation_failure());
//! assert_eq!(err.to_string(), "Application already exists");
//! ```

use thiserror::Error;

use crate::client::ApiError;
use crate::operation::Status;
use crate::wait::WaitError;

/// A finished operation that reported a failure. Displays as the remote message.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", .0.message)]
pub struct OperationError(pub Status);

impl OperationError {
    /// The `google.rpc.Code` of the failure
    pub fn code(&self) -> i32 {
        self.0.code
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }

    pub fn status(&self) -> &Status {
        &self.0
    }
}

impl From<Status> for OperationError {
    fn from(status: Status) -> Self {
        Self(status)
    }
}

/// Core error type for operation waits
#[derive(Error, Debug)]
pub enum CoreError {
    /// Polling stopped before the operation finished
    #[error("Error waiting for {activity}: {source}")]
    Wait {
        activity: String,
        #[source]
        source: WaitError<ApiError>,
    },

    /// The operation finished with an error payload
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// A direct API call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// The API error behind this failure, if any
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            CoreError::Wait { source, .. } => source.refresh_error(),
            CoreError::Api(e) => Some(e),
            CoreError::Operation(_) => None,
        }
    }

    /// Returns true if the wait ran out of time
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Wait { source, .. } => {
                source.is_timeout() || source.refresh_error().is_some_and(ApiError::is_timeout)
            }
            CoreError::Api(e) => e.is_timeout(),
            CoreError::Operation(_) => false,
        }
    }

    /// Returns true if the operation (or its app) does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    /// Returns true if the operation itself reported a failure
    #[must_use]
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, CoreError::Operation(_))
    }

    /// Returns true if waiting again might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Wait { source, .. } if source.is_timeout() => true,
            _ => self.api_error().is_some_and(ApiError::is_retryable),
        }
    }

    /// The failure reported by the operation, if that is what this is
    pub fn operation_error(&self) -> Option<&OperationError> {
        match self {
            CoreError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::time::Duration;

    fn wait_error(source: WaitError<ApiError>) -> CoreError {
        CoreError::Wait {
            activity: "App Engine app to be created".to_string(),
            source,
        }
    }

    #[test]
    fn test_operation_error_displays_message() {
        let err = OperationError(Status {
            code: 7,
            message: "Caller lacks permission".to_string(),
            details: vec![],
        });
        assert_eq!(err.to_string(), "Caller lacks permission");
        assert_eq!(err.code(), 7);

        let core: CoreError = err.into();
        assert!(core.is_operation_failure());
        assert!(!core.is_retryable());
        assert_eq!(core.to_string(), "Caller lacks permission");
        assert_eq!(core.operation_error().map(OperationError::code), Some(7));
    }

    #[test]
    fn test_wait_timeout_message() {
        let err = wait_error(WaitError::Timeout {
            last_state: Some("false".to_string()),
            expected: vec!["true".to_string()],
            timeout: Duration::from_secs(240),
        });

        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Error waiting for App Engine app to be created: timeout while waiting for state \
             to become 'true' (last state: 'false', timeout: 240s)"
        );
    }

    #[test]
    fn test_wait_refresh_error_exposes_api_error() {
        let err = wait_error(WaitError::Refresh(ApiError::NotFound {
            message: "Operation not found".to_string(),
        }));

        assert!(err.is_not_found());
        assert!(!err.is_timeout());
        assert!(err.api_error().is_some());
        assert_eq!(
            err.to_string(),
            "Error waiting for App Engine app to be created: Not found: Operation not found"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_api_error_passthrough() {
        let err: CoreError = ApiError::ServerError {
            status: 503,
            message: "backend unavailable".to_string(),
        }
        .into();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Server error (503): backend unavailable");
    }
}
