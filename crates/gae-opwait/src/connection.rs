//! Client construction from configuration and command line overrides

use gae_opwait_core::{AppEngineClient, Config};
use tracing::{debug, trace};

use crate::error::Result as CliResult;

/// User agent string for gae-opwait HTTP requests
const GAE_OPWAIT_USER_AGENT: &str = concat!("gae-opwait/", env!("CARGO_PKG_VERSION"));

/// Builds authenticated API clients
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a connection manager, applying flag overrides to the loaded config
    ///
    /// Explicit flags win over the config file.
    pub fn new(
        mut config: Config,
        config_path: Option<std::path::PathBuf>,
        endpoint: Option<&str>,
        access_token: Option<&str>,
    ) -> Self {
        if let Some(endpoint) = endpoint {
            debug!("Endpoint overridden from command line: {}", endpoint);
            config.endpoint = endpoint.to_string();
        }
        if let Some(token) = access_token {
            debug!("Access token supplied on command line or environment");
            config.access_token = Some(token.to_string());
        }

        Self {
            config,
            config_path,
        }
    }

    /// Create an App Engine client from the effective configuration
    pub fn create_client(&self) -> CliResult<AppEngineClient> {
        debug!("Creating App Engine client");
        trace!("Endpoint: {}", self.config.endpoint);

        let mut builder = AppEngineClient::builder()
            .base_url(&self.config.endpoint)
            .user_agent(GAE_OPWAIT_USER_AGENT);

        match self.config.access_token.as_deref() {
            Some(token) if !token.is_empty() => builder = builder.access_token(token),
            _ => debug!("No access token configured, sending unauthenticated requests"),
        }

        Ok(builder.build()?)
    }

    /// Resolve the owning application from a flag or the configured default
    pub fn resolve_app(&self, explicit: Option<&str>) -> CliResult<String> {
        Ok(self.config.resolve_app(explicit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            endpoint: "https://example.invalid/".to_string(),
            access_token: Some("from-file".to_string()),
            ..Default::default()
        };

        let mgr = ConnectionManager::new(
            config,
            None,
            Some("http://localhost:9000/"),
            Some("from-flag"),
        );

        assert_eq!(mgr.config.endpoint, "http://localhost:9000/");
        assert_eq!(mgr.config.access_token.as_deref(), Some("from-flag"));

        let client = mgr.create_client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:9000/");
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let mgr = ConnectionManager::new(Config::default(), None, Some("::not a url::"), None);
        let err = mgr.create_client().unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
