use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Default transport scheme used by the public pychat deployment.
pub const DEFAULT_SCHEME: &str = "http";

/// Environment variable consulted when the application key is not supplied
/// explicitly, matching the upstream client convention.
pub const APP_KEY_ENV: &str = "PYCHAT_APP_KEY";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub server_addr: String,
    pub port: u16,
    pub scheme: String,
    pub app_id: String,
    pub app_key: Secret<String>,
    pub timeout_seconds: u64,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ChatConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ChatConfig", 6)?;
        state.serialize_field("server_addr", &self.server_addr)?;
        state.serialize_field("port", &self.port)?;
        state.serialize_field("scheme", &self.scheme)?;
        state.serialize_field("app_id", &self.app_id)?;
        state.serialize_field("app_key", "[REDACTED]")?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.end()
    }
}

// Custom Deserialize implementation
impl<'de> Deserialize<'de> for ChatConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ChatConfigHelper {
            server_addr: String,
            port: u16,
            #[serde(default)]
            scheme: Option<String>,
            app_id: String,
            app_key: String,
            #[serde(default)]
            timeout_seconds: Option<u64>,
        }

        let helper = ChatConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            server_addr: helper.server_addr,
            port: helper.port,
            scheme: helper.scheme.unwrap_or_else(|| DEFAULT_SCHEME.to_string()),
            app_id: helper.app_id,
            app_key: Secret::new(helper.app_key),
            timeout_seconds: helper.timeout_seconds.unwrap_or(30),
        })
    }
}

impl ChatConfig {
    /// Create a new configuration with explicit credentials.
    #[must_use]
    pub fn new(
        server_addr: impl Into<String>,
        port: u16,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            server_addr: server_addr.into(),
            port,
            scheme: DEFAULT_SCHEME.to_string(),
            app_id: app_id.into(),
            app_key: Secret::new(app_key.into()),
            timeout_seconds: 30,
        }
    }

    /// Create a configuration whose application key is read from
    /// `PYCHAT_APP_KEY`, the fallback the upstream client uses when no key
    /// is passed at construction.
    pub fn with_env_key(
        server_addr: impl Into<String>,
        port: u16,
        app_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let app_key = env::var(APP_KEY_ENV)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(APP_KEY_ENV.to_string()))?;
        Ok(Self::new(server_addr, port, app_id, app_key))
    }

    /// Create configuration entirely from environment variables
    ///
    /// Expected environment variables:
    /// - `PYCHAT_SERVER_ADDR`
    /// - `PYCHAT_PORT`
    /// - `PYCHAT_APP_ID`
    /// - `PYCHAT_APP_KEY`
    /// - `PYCHAT_SCHEME` (optional, defaults to "http")
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = env::var("PYCHAT_SERVER_ADDR").map_err(|_| {
            ConfigError::MissingEnvironmentVariable("PYCHAT_SERVER_ADDR".to_string())
        })?;

        let port = env::var("PYCHAT_PORT")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("PYCHAT_PORT".to_string()))?
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidConfiguration(format!("PYCHAT_PORT: {}", e)))?;

        let app_id = env::var("PYCHAT_APP_ID")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("PYCHAT_APP_ID".to_string()))?;

        let app_key = env::var(APP_KEY_ENV)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(APP_KEY_ENV.to_string()))?;

        let scheme = env::var("PYCHAT_SCHEME").unwrap_or_else(|_| DEFAULT_SCHEME.to_string());

        Ok(Self {
            server_addr,
            port,
            scheme,
            app_id,
            app_key: Secret::new(app_key),
            timeout_seconds: 30,
        })
    }

    /// Create configuration from a .env file and environment variables
    ///
    /// Loads environment variables from `.env` (if it exists), then reads
    /// the configuration using the standard variable names.
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file() -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(".env")
    }

    /// Create configuration from a specific .env file path
    ///
    /// Useful for different environments (e.g., .env.development,
    /// .env.production).
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // .env file doesn't exist, continue with system env vars
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env()
    }

    /// Check if this configuration carries the credentials required to sign
    /// requests.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.app_id.is_empty() && !self.app_key.expose_secret().is_empty()
    }

    /// Override the transport scheme ("http" or "https").
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Base URL for the service, without the API prefix.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.server_addr, self.port)
    }

    /// Get the application key (use carefully - exposes the secret)
    pub fn app_key(&self) -> &str {
        self.app_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_joins_scheme_host_and_port() {
        let config = ChatConfig::new("127.0.0.1", 5000, "app", "key");
        assert_eq!(config.base_url(), "http://127.0.0.1:5000");

        let config = config.scheme("https");
        assert_eq!(config.base_url(), "https://127.0.0.1:5000");
    }

    #[test]
    fn credentials_check_requires_both_id_and_key() {
        assert!(ChatConfig::new("h", 80, "id", "key").has_credentials());
        assert!(!ChatConfig::new("h", 80, "", "key").has_credentials());
        assert!(!ChatConfig::new("h", 80, "id", "").has_credentials());
    }

    #[test]
    fn serialization_redacts_app_key() {
        let config = ChatConfig::new("h", 80, "id", "topsecret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("topsecret"));
        assert!(json.contains("[REDACTED]"));
    }
}
