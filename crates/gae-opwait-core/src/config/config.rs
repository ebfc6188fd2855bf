//! Configuration file handling
//!
//! Configuration is stored in TOML format. A missing file is not an error; it
//! yields the defaults. Values may reference environment variables.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use super::wait::WaitSettings;
use crate::client::DEFAULT_ENDPOINT;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// App Engine Admin API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// OAuth2 access token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Application used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_app: Option<String>,
    /// Wait timing
    #[serde(default)]
    pub wait: WaitSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_token: None,
            default_app: None,
            wait: WaitSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// A copy with the access token masked, for display
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.access_token.is_some() {
            shown.access_token = Some("********".to_string());
        }
        shown
    }

    /// Render the configuration as TOML, with the access token masked
    pub fn to_toml_redacted(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }

    /// Pick the application id: explicit value first, then `default_app`
    pub fn resolve_app(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .or(self.default_app.as_deref())
            .filter(|app| !app.is_empty())
            .map(str::to_string)
            .ok_or(ConfigError::MissingApp)
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/gae-opwait/config.toml
    /// On macOS: ~/Library/Application Support/com.gae-opwait.gae-opwait/config.toml
    /// On Windows: %APPDATA%\gae-opwait\gae-opwait\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "gae-opwait", "gae-opwait")
            .ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax. Unset variables without a
    /// default are left as-is.
    ///
    /// Example:
    /// ```toml
    /// access_token = "${GAE_OPWAIT_ACCESS_TOKEN}"
    /// endpoint = "${GAE_OPWAIT_ENDPOINT:-https://appengine.googleapis.com/}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            default_app: Some("my-app".to_string()),
            wait: WaitSettings {
                timeout_secs: 900,
                ..Default::default()
            },
            ..Default::default()
        };

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_resolve_app() {
        let config = Config {
            default_app: Some("fallback".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_app(Some("explicit")).unwrap(), "explicit");
        assert_eq!(config.resolve_app(None).unwrap(), "fallback");

        let config = Config::default();
        assert!(matches!(
            config.resolve_app(None),
            Err(ConfigError::MissingApp)
        ));
        assert!(matches!(
            config.resolve_app(Some("")),
            Err(ConfigError::MissingApp)
        ));
    }

    #[test]
    fn test_redacted_output_hides_token() {
        let config = Config {
            access_token: Some("ya29.secret".to_string()),
            ..Default::default()
        };
        let shown = config.to_toml_redacted().unwrap();
        assert!(!shown.contains("ya29.secret"));
        assert!(shown.contains("********"));
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("TEST_GAE_TOKEN", "token-value");
        }

        let content = r#"
access_token = "${TEST_GAE_TOKEN}"
"#;

        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("token-value"));

        unsafe {
            std::env::remove_var("TEST_GAE_TOKEN");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion_with_defaults() {
        unsafe {
            std::env::remove_var("NONEXISTENT_GAE_ENDPOINT");
        }

        let content = r#"
endpoint = "${NONEXISTENT_GAE_ENDPOINT:-http://localhost:8080/}"
default_app = "${NONEXISTENT_GAE_APP}"
"#;

        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("http://localhost:8080/"));
        assert!(expanded.contains("${NONEXISTENT_GAE_APP}"));
    }
}
