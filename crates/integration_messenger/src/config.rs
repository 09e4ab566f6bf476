//! Messenger client configuration

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Graph API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "6.0";

/// Graph API host used when none is configured
pub const DEFAULT_GRAPH_HOST: &str = "https://graph.facebook.com";

/// Credentials and endpoint settings for [`crate::MessengerClient`]
#[derive(Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    /// Page access token (sensitive - uses SecretString)
    #[serde(default, skip_serializing)]
    pub access_token: Option<SecretString>,

    /// App secret used for `appsecret_proof` and webhook signatures
    /// (sensitive - uses SecretString)
    #[serde(default, skip_serializing)]
    pub app_secret: Option<SecretString>,

    /// Graph API version without the leading `v` (default: 6.0)
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Scheme and host of the Graph API
    #[serde(default = "default_graph_host")]
    pub graph_host: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_graph_host() -> String {
    DEFAULT_GRAPH_HOST.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl std::fmt::Debug for MessengerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessengerConfig")
            .field(
                "access_token",
                &if self.access_token.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field(
                "app_secret",
                &if self.app_secret.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("api_version", &self.api_version)
            .field("graph_host", &self.graph_host)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            app_secret: None,
            api_version: default_api_version(),
            graph_host: default_graph_host(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MessengerConfig {
    /// Create a configuration with the given access token and defaults otherwise
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(SecretString::from(access_token.into())),
            ..Default::default()
        }
    }

    /// Set the app secret
    #[must_use]
    pub fn with_app_secret(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(SecretString::from(app_secret.into()));
        self
    }

    /// Set the Graph API version (e.g. `"6.0"`)
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Point the client at another Graph API host
    #[must_use]
    pub fn with_graph_host(mut self, graph_host: impl Into<String>) -> Self {
        self.graph_host = graph_host.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Get the access token as a string reference (for API calls)
    #[must_use]
    pub fn access_token_str(&self) -> Option<&str> {
        self.access_token.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Get the app secret as a string reference (for signing)
    #[must_use]
    pub fn app_secret_str(&self) -> Option<&str> {
        self.app_secret.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Versioned Graph API root, e.g. `https://graph.facebook.com/v6.0`
    #[must_use]
    pub fn graph_url(&self) -> String {
        format!("{}/v{}", self.graph_host, self.api_version)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_token_str().is_none_or(str::is_empty) {
            return Err("access_token is required".to_string());
        }

        if self.graph_host.is_empty() {
            return Err("graph_host must not be empty".to_string());
        }

        match self.api_version.parse::<f64>() {
            Ok(version) if version.is_finite() && version > 0.0 => {},
            _ => {
                return Err(format!(
                    "api_version must be a positive number, got {:?}",
                    self.api_version
                ));
            },
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MessengerConfig::default();
        assert!(config.access_token.is_none());
        assert!(config.app_secret.is_none());
        assert_eq!(config.api_version, "6.0");
        assert_eq!(config.graph_host, "https://graph.facebook.com");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_graph_url_uses_version() {
        let config = MessengerConfig::new("token");
        assert_eq!(config.graph_url(), "https://graph.facebook.com/v6.0");

        let config = config.with_api_version("18.0");
        assert_eq!(config.graph_url(), "https://graph.facebook.com/v18.0");
    }

    #[test]
    fn test_builder_methods() {
        let config = MessengerConfig::new("token")
            .with_app_secret("secret")
            .with_graph_host("http://127.0.0.1:8080")
            .with_timeout_secs(5);

        assert_eq!(config.access_token_str(), Some("token"));
        assert_eq!(config.app_secret_str(), Some("secret"));
        assert_eq!(config.graph_url(), "http://127.0.0.1:8080/v6.0");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_validation_success() {
        assert!(MessengerConfig::new("token").validate().is_ok());
    }

    #[test]
    fn test_validation_missing_token() {
        assert!(MessengerConfig::default().validate().is_err());
        assert!(MessengerConfig::new("").validate().is_err());
    }

    #[test]
    fn test_validation_non_numeric_version() {
        let config = MessengerConfig::new("token").with_api_version("v6.0");
        assert!(config.validate().is_err());

        let config = MessengerConfig::new("token").with_api_version("-1");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_host() {
        let config = MessengerConfig::new("token").with_graph_host("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = MessengerConfig::new("token").with_timeout_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = MessengerConfig::new("very-secret-token").with_app_secret("app-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret-token"));
        assert!(!debug.contains("app-secret"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"access_token": "abc", "app_secret": "xyz"}"#;
        let config: MessengerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.access_token_str(), Some("abc"));
        assert_eq!(config.app_secret_str(), Some("xyz"));
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_serialize_skips_secrets() {
        let config = MessengerConfig::new("abc").with_app_secret("xyz");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("abc"));
        assert!(!json.contains("xyz"));
        assert!(json.contains("api_version"));
    }
}
