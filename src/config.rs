//! Configuration types for the OpenSRS client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Production reseller endpoint.
pub const PRODUCTION_ENDPOINT: &str = "https://rr-n1-tor.opensrs.net:55443/";

/// Test (Horizon) endpoint.
pub const TEST_ENDPOINT: &str = "https://horizon.opensrs.net:55443/";

/// Environment variable holding the reseller username.
pub const ENV_USERNAME: &str = "OPENSRS_USERNAME";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "OPENSRS_API_KEY";
/// Environment variable overriding the endpoint.
pub const ENV_ENDPOINT: &str = "OPENSRS_ENDPOINT";

/// Main configuration for the client.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Reseller username (sent as `X-Username`)
    pub username: String,
    /// Private API key used to sign requests
    pub api_key: String,
    /// Which registrar environment to talk to
    pub environment: Environment,
    /// Explicit endpoint, overrides `environment`
    pub endpoint: Option<String>,
    /// Request timeout (ms)
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_key: String::new(),
            environment: Environment::default(),
            endpoint: None,
            timeout_ms: 70_000,
        }
    }
}

// The API key never shows up in logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Registrar environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Live reseller system
    #[default]
    Production,
    /// Horizon test system
    Test,
}

impl Environment {
    /// Default endpoint for this environment.
    pub fn endpoint(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_ENDPOINT,
            Environment::Test => TEST_ENDPOINT,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" | "live" => Ok(Environment::Production),
            "test" | "horizon" => Ok(Environment::Test),
            other => Err(ConfigError::Invalid(format!("unknown environment '{}'", other))),
        }
    }
}

impl ClientConfig {
    /// Endpoint requests are posted to.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.environment.endpoint())
    }

    /// Load configuration from a YAML (`.yaml`/`.yml`) or JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parse configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overlay values from the `OPENSRS_*` environment variables.
    pub fn apply_env(mut self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_USERNAME).ok(),
            std::env::var(ENV_API_KEY).ok(),
            std::env::var(ENV_ENDPOINT).ok(),
        );
        self
    }

    /// Apply explicit overrides; empty values are ignored.
    pub fn apply_overrides(
        &mut self,
        username: Option<String>,
        api_key: Option<String>,
        endpoint: Option<String>,
    ) {
        if let Some(username) = username.filter(|v| !v.is_empty()) {
            self.username = username;
        }
        if let Some(api_key) = api_key.filter(|v| !v.is_empty()) {
            self.api_key = api_key;
        }
        if let Some(endpoint) = endpoint.filter(|v| !v.is_empty()) {
            self.endpoint = Some(endpoint);
        }
    }

    /// Check that the configuration can be used to talk to the registrar.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_USERNAME));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_API_KEY));
        }
        let endpoint = self.endpoint();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing credential: set {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.endpoint(), PRODUCTION_ENDPOINT);
        assert_eq!(config.timeout_ms, 70_000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_parsing() {
        let yaml = r#"
username: "reseller"
api_key: "abc123"
environment: test
timeout_ms: 5000
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.username, "reseller");
        assert_eq!(config.endpoint(), TEST_ENDPOINT);
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_override() {
        let json = r#"{"username": "u", "api_key": "k", "endpoint": "http://localhost:55443/"}"#;
        let config = ClientConfig::from_json(json).unwrap();
        assert_eq!(config.endpoint(), "http://localhost:55443/");
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = ClientConfig {
            username: "file-user".to_string(),
            ..Default::default()
        };
        config.apply_overrides(Some(String::new()), Some("key".to_string()), None);
        assert_eq!(config.username, "file-user");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = ClientConfig {
            username: "u".to_string(),
            api_key: "k".to_string(),
            endpoint: Some("ftp://example".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig {
            api_key: "super-secret".to_string(),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("horizon".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!("PRODUCTION".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
    }
}
