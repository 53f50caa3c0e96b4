//! Configuration structures for Replenish
//!
//! Configurations are loaded from an optional YAML file and can be overridden
//! by `REPLENISH__<SECTION>__<KEY>` environment variables.

use crate::error::{ReplenishError, Result};
use crate::messages::Locale;
use crate::secret::SecretString;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "REPLENISH_CONFIG";

/// Config file used when `REPLENISH_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "configs/replenish.yaml";

/// Credential used when nothing is configured in development.
/// Never accepted in production.
pub const DEMO_API_KEY: &str = "replenish-demo-key-not-for-production";

/// Top-level configuration for Replenish components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: DeploymentEnvironment,

    /// Server binding address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Locale of user-facing messages
    #[serde(default)]
    pub locale: Locale,

    /// Prediction proxy configuration
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Client configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentEnvironment {
    /// Local development; the demo credential is allowed
    #[default]
    Development,

    /// Production; a real credential is mandatory
    Production,
}

impl fmt::Display for DeploymentEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentEnvironment::Development => f.write_str("development"),
            DeploymentEnvironment::Production => f.write_str("production"),
        }
    }
}

/// Prediction proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Upstream forecasting endpoint
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Upstream credential set directly in config (takes precedence over the env var)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Environment variable holding the upstream credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upstream request timeout in milliseconds
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_ms: u64,

    /// Also send the credential as `x-api-key`.
    ///
    /// Compatibility shim: the upstream auth scheme is unconfirmed, so the
    /// credential goes out both as a bearer token and as an API key header.
    /// Turn off once upstream confirms it only reads `Authorization`.
    #[serde(default = "default_send_api_key_header")]
    pub send_api_key_header: bool,

    /// Maximum inbound request body size
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            upstream_timeout_ms: default_upstream_timeout(),
            send_api_key_header: default_send_api_key_header(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Proxy prediction endpoint
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_client_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            request_timeout_ms: default_client_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_metrics")]
    pub enable_metrics: bool,

    /// Emit JSON log lines
    #[serde(default = "default_structured_logging")]
    pub structured_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            enable_metrics: default_metrics(),
            structured_logging: default_structured_logging(),
        }
    }
}

/// Where the upstream credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `proxy.api_key` in the config file or environment overrides
    Config,

    /// The environment variable named by `proxy.api_key_env`
    Env(String),

    /// Built-in demo key (development only)
    DemoFallback,
}

impl CredentialSource {
    /// Whether this source must not be used outside development
    pub fn is_insecure(&self) -> bool {
        matches!(self, CredentialSource::DemoFallback)
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => f.write_str("configuration"),
            CredentialSource::Env(name) => write!(f, "environment variable '{}'", name),
            CredentialSource::DemoFallback => f.write_str("insecure demo default"),
        }
    }
}

/// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:8000/predict".to_string()
}

fn default_api_key_env() -> String {
    "PREDICT_API_KEY".to_string()
}

fn default_upstream_timeout() -> u64 {
    30_000
}

fn default_send_api_key_header() -> bool {
    true
}

fn default_body_limit() -> usize {
    64 * 1024
}

fn default_proxy_url() -> String {
    "http://127.0.0.1:3000/api/predict".to_string()
}

fn default_client_timeout() -> u64 {
    60_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics() -> bool {
    true
}

fn default_structured_logging() -> bool {
    false
}

impl Default for ReplenishConfig {
    fn default() -> Self {
        Self {
            environment: DeploymentEnvironment::default(),
            bind_address: default_bind_address(),
            port: default_port(),
            locale: Locale::default(),
            proxy: ProxyConfig::default(),
            client: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ReplenishConfig {
    /// Load configuration from the YAML file (if present) and the environment.
    ///
    /// The file path is `path`, else `$REPLENISH_CONFIG`, else
    /// `configs/replenish.yaml`. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };

        let config: ReplenishConfig = Config::builder()
            .add_source(File::from(path.as_path()).required(false))
            .add_source(
                Environment::with_prefix("REPLENISH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                ReplenishError::Config(format!("Failed to load config {}: {}", path.display(), e))
            })?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: ReplenishConfig = serde_yaml::from_str(content)
            .map_err(|e| ReplenishError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_http_url("proxy.upstream_url", &self.proxy.upstream_url)?;

        if self.proxy.upstream_timeout_ms == 0 {
            return Err(ReplenishError::config("proxy.upstream_timeout_ms must be greater than zero"));
        }
        if self.proxy.body_limit_bytes == 0 {
            return Err(ReplenishError::config("proxy.body_limit_bytes must be greater than zero"));
        }
        if self.proxy.api_key_env.trim().is_empty() {
            return Err(ReplenishError::config("proxy.api_key_env must not be empty"));
        }

        if let Some(client) = &self.client {
            validate_http_url("client.proxy_url", &client.proxy_url)?;
            if client.request_timeout_ms == 0 {
                return Err(ReplenishError::config("client.request_timeout_ms must be greater than zero"));
            }
        }

        match self.observability.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ReplenishError::config(format!("Invalid log level: {}", other))),
        }
    }

    /// Socket address the proxy listens on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.bind_address, self.port).parse()?)
    }

    /// Get upstream timeout as Duration
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.proxy.upstream_timeout_ms)
    }

    /// Client settings, falling back to defaults
    pub fn client_or_default(&self) -> ClientConfig {
        self.client.clone().unwrap_or_default()
    }

    /// Resolve the upstream credential from config and the process environment
    pub fn resolve_credential(&self) -> Result<(SecretString, CredentialSource)> {
        self.resolve_credential_with(|name| std::env::var(name).ok())
    }

    /// Resolve the upstream credential using `lookup` for environment access.
    ///
    /// Order: `proxy.api_key`, then the `proxy.api_key_env` variable, then the
    /// demo key in development. Production without a credential is an error.
    pub fn resolve_credential_with<F>(&self, lookup: F) -> Result<(SecretString, CredentialSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = self.proxy.api_key.as_ref().filter(|key| !key.is_empty()) {
            return Ok((key.clone(), CredentialSource::Config));
        }

        let env_name = &self.proxy.api_key_env;
        if let Some(value) = lookup(env_name).filter(|value| !value.trim().is_empty()) {
            return Ok((SecretString::new(value), CredentialSource::Env(env_name.clone())));
        }

        match self.environment {
            DeploymentEnvironment::Development => {
                Ok((SecretString::new(DEMO_API_KEY), CredentialSource::DemoFallback))
            }
            DeploymentEnvironment::Production => Err(ReplenishError::config(format!(
                "Upstream credential missing: set {} or proxy.api_key (required in production)",
                env_name
            ))),
        }
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| ReplenishError::config(format!("{} is not a valid URL ({}): {}", field, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ReplenishError::config(format!(
            "{} must use http or https, got {}",
            field, scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = ReplenishConfig::from_yaml_str("{}").unwrap();

        assert_eq!(config.environment, DeploymentEnvironment::Development);
        assert_eq!(config.port, 3000);
        assert_eq!(config.locale, Locale::Ar);
        assert_eq!(config.proxy.api_key_env, "PREDICT_API_KEY");
        assert!(config.proxy.send_api_key_header);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
environment: production
port: 8080
locale: en
proxy:
  upstream_url: "https://forecast.example.com/predict"
  upstream_timeout_ms: 5000
  send_api_key_header: false
client:
  proxy_url: "http://localhost:8080/api/predict"
observability:
  log_level: debug
"#;

        let config = ReplenishConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.environment, DeploymentEnvironment::Production);
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.proxy.upstream_url, "https://forecast.example.com/predict");
        assert!(!config.proxy.send_api_key_header);
        assert_eq!(config.upstream_timeout(), Duration::from_millis(5000));
        assert_eq!(config.client_or_default().request_timeout_ms, 60_000);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let mut config = ReplenishConfig::default();
        assert!(config.validate().is_ok());

        config.proxy.upstream_url = "ftp://forecast.example.com".to_string();
        assert!(config.validate().is_err());

        config.proxy.upstream_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = ReplenishConfig::default();
        config.proxy.upstream_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ReplenishConfig::default();
        config.observability.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credential_prefers_config_then_env() {
        let mut config = ReplenishConfig::default();

        let (key, source) = config
            .resolve_credential_with(|_| Some("from-env".to_string()))
            .unwrap();
        assert_eq!(key.expose_secret(), "from-env");
        assert_eq!(source, CredentialSource::Env("PREDICT_API_KEY".to_string()));

        config.proxy.api_key = Some(SecretString::new("from-config"));
        let (key, source) = config
            .resolve_credential_with(|_| Some("from-env".to_string()))
            .unwrap();
        assert_eq!(key.expose_secret(), "from-config");
        assert_eq!(source, CredentialSource::Config);
    }

    #[test]
    fn test_demo_credential_only_in_development() {
        let mut config = ReplenishConfig::default();

        let (key, source) = config.resolve_credential_with(|_| None).unwrap();
        assert_eq!(key.expose_secret(), DEMO_API_KEY);
        assert!(source.is_insecure());

        config.environment = DeploymentEnvironment::Production;
        let err = config.resolve_credential_with(|_| None).unwrap_err();
        assert!(matches!(err, ReplenishError::Config(_)));

        // Blank values count as missing
        assert!(config
            .resolve_credential_with(|_| Some("   ".to_string()))
            .is_err());
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = ReplenishConfig::default();
        config.proxy.api_key = Some(SecretString::new("top-secret"));

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("top-secret"));
        assert!(!format!("{:?}", config).contains("top-secret"));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ReplenishConfig::load(Some(Path::new("/nonexistent/replenish.yaml"))).unwrap();
        assert_eq!(config.proxy.body_limit_bytes, 64 * 1024);
    }
}
