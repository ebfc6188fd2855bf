//! Error types for gae-opwait
//!
//! Library errors are folded into [`CliError`] so they can be printed with
//! hints on how to fix them.

use colored::Colorize;
use gae_opwait_core::{ApiError, ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: No application id given and no default_app configured
///
///   tip: pass the application explicitly: --app <APP>
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<String>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    /// Add a tip line.
    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

/// Main error type for the gae-opwait application
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No application given. Use --app or set default_app in the config file.")]
    MissingApp,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("{message}")]
    Timeout { message: String },

    /// The operation finished with an error payload
    #[error("Operation failed (code {code}): {message}")]
    OperationFailed { code: i32, message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for gae-opwait operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::MissingApp => vec![
                "Pass the application explicitly: --app <APP>".to_string(),
                "Or set default_app in the config file (see: gae-opwait config path)".to_string(),
            ],
            CliError::AuthenticationFailed { .. } => vec![
                "Provide an access token: --access-token or GAE_OPWAIT_ACCESS_TOKEN".to_string(),
                "Fetch a fresh token: gcloud auth print-access-token".to_string(),
            ],
            CliError::NotFound { .. } => vec![
                "Check the operation name and the --app value".to_string(),
                "Operations are listed under apps/<APP>/operations".to_string(),
            ],
            CliError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint: gae-opwait config show".to_string(),
            ],
            CliError::Timeout { .. } => vec![
                "Allow more time with --timeout <SECS>".to_string(),
                "The operation may still finish; check it with: gae-opwait get <OPERATION>"
                    .to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthenticationFailed { message } | ApiError::PermissionDenied { message } => {
                CliError::AuthenticationFailed { message }
            }
            ApiError::NotFound { message } => CliError::NotFound { message },
            ApiError::Request(e) => CliError::ConnectionError {
                message: e.to_string(),
            },
            ApiError::InvalidUrl(url) => CliError::Config(format!("Invalid endpoint URL: {}", url)),
            _ => CliError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_timeout() {
            return CliError::Timeout {
                message: err.to_string(),
            };
        }

        match err {
            CoreError::Operation(failure) => CliError::OperationFailed {
                code: failure.code(),
                message: failure.message().to_string(),
            },
            CoreError::Api(api) => CliError::from(api),
            CoreError::Wait { .. } if err.is_not_found() => CliError::NotFound {
                message: err.to_string(),
            },
            CoreError::Wait { .. } if err.api_error().is_some_and(ApiError::is_unauthorized) => {
                CliError::AuthenticationFailed {
                    message: err.to_string(),
                }
            }
            CoreError::Wait { .. } => CliError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingApp => CliError::MissingApp,
            other => CliError::Config(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gae_opwait_core::{OperationError, Status, WaitError};
    use std::time::Duration;

    #[test]
    fn test_operation_failure_keeps_code_and_message() {
        let err = CliError::from(CoreError::from(OperationError(Status {
            code: 6,
            message: "App already exists".to_string(),
            details: vec![],
        })));

        assert!(matches!(err, CliError::OperationFailed { code: 6, .. }));
        assert_eq!(err.to_string(), "Operation failed (code 6): App already exists");
    }

    #[test]
    fn test_timeout_gets_suggestions() {
        let err = CliError::from(CoreError::Wait {
            activity: "operation to complete".to_string(),
            source: WaitError::Timeout {
                last_state: Some("false".to_string()),
                expected: vec!["true".to_string()],
                timeout: Duration::from_secs(240),
            },
        });

        assert!(matches!(err, CliError::Timeout { .. }));
        assert!(err.to_string().starts_with("Error waiting for operation to complete"));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_refresh_not_found_maps_to_not_found() {
        let err = CliError::from(CoreError::Wait {
            activity: "operation to complete".to_string(),
            source: WaitError::Refresh(ApiError::NotFound {
                message: "no such operation".to_string(),
            }),
        });

        assert!(matches!(err, CliError::NotFound { .. }));
    }

    #[test]
    fn test_missing_app_from_config_error() {
        let err = CliError::from(ConfigError::MissingApp);
        assert!(matches!(err, CliError::MissingApp));
        assert_eq!(err.suggestions().len(), 2);
    }
}
