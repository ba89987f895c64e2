use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use domain::models::UserId;

/// Longest history window the dashboard serves, in hours.
pub const MAX_HISTORY_HOURS: u32 = 168;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Adds `Strict-Transport-Security` to responses. Enable only behind TLS.
    #[serde(default)]
    pub hsts_enabled: bool,
}

/// The tracking server the collections are fetched from.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,

    /// Bearer token sent with every fetch. Empty means signed out.
    #[serde(default)]
    pub token: String,

    /// Identity of the signed-in user, sent as a secondary hint.
    #[serde(default)]
    pub user_id: Option<UserId>,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Runs one sync before the server starts accepting requests.
    #[serde(default = "default_sync_on_startup")]
    pub sync_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Aggregation passes kept for history and trends.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_history_hours")]
    pub default_history_hours: u32,

    /// Quiet period after a collection change before re-aggregating.
    #[serde(default = "default_aggregation_debounce_ms")]
    pub aggregation_debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            sync_on_startup: default_sync_on_startup(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            default_history_hours: default_history_hours(),
            aggregation_debounce_ms: default_aggregation_debounce_ms(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_fetch_timeout_ms() -> u64 {
    10_000
}
fn default_refresh_interval() -> u64 {
    60
}
fn default_sync_on_startup() -> bool {
    true
}
fn default_history_capacity() -> usize {
    1440 // one day of passes at the default refresh interval
}
fn default_history_hours() -> u32 {
    24
}
fn default_aggregation_debounce_ms() -> u64 {
    200
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FLEET__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("FLEET").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for tests from embedded defaults plus overrides.
    ///
    /// Does not read config files and skips validation so partial configs load.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            hsts_enabled = false

            [upstream]
            base_url = ""
            token = ""
            fetch_timeout_ms = 10000

            [sync]
            refresh_interval_secs = 60
            sync_on_startup = false

            [dashboard]
            history_capacity = 1440
            default_history_hours = 24
            aggregation_debounce_ms = 200
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FLEET__UPSTREAM__BASE_URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.upstream.fetch_timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "upstream.fetch_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.sync.refresh_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "sync.refresh_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.dashboard.history_capacity == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "dashboard.history_capacity must be greater than 0".to_string(),
            ));
        }

        if self.dashboard.default_history_hours > MAX_HISTORY_HOURS {
            return Err(ConfigValidationError::InvalidValue(format!(
                "dashboard.default_history_hours cannot exceed {}",
                MAX_HISTORY_HOURS
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.fetch_timeout_ms)
    }

    /// The configured bearer token, if any.
    pub fn upstream_token(&self) -> Option<&str> {
        let token = self.upstream.token.trim();
        (!token.is_empty()).then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPSTREAM: (&str, &str) = ("upstream.base_url", "http://tracker.local:8082");

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&[UPSTREAM]).expect("Failed to load config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.upstream.fetch_timeout_ms, 10_000);
        assert_eq!(config.sync.refresh_interval_secs, 60);
        assert_eq!(config.dashboard.default_history_hours, 24);
        assert!(config.upstream.user_id.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_env_override() {
        let config = Config::load_for_test(&[
            UPSTREAM,
            ("server.port", "9000"),
            ("logging.level", "debug"),
            ("upstream.user_id", "42"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.upstream.user_id, Some(42));
    }

    #[test]
    fn test_config_validation_missing_base_url() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("FLEET__UPSTREAM__BASE_URL"));
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let config = Config::load_for_test(&[UPSTREAM, ("sync.refresh_interval_secs", "0")])
            .expect("Failed to load config");
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("refresh_interval_secs"));
    }

    #[test]
    fn test_config_validation_zero_capacity() {
        let config = Config::load_for_test(&[UPSTREAM, ("dashboard.history_capacity", "0")])
            .expect("Failed to load config");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_for_test(&[
            UPSTREAM,
            ("server.host", "127.0.0.1"),
            ("server.port", "3000"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_upstream_token_blank_is_none() {
        let config = Config::load_for_test(&[UPSTREAM, ("upstream.token", "  ")]).unwrap();
        assert!(config.upstream_token().is_none());

        let config = Config::load_for_test(&[UPSTREAM, ("upstream.token", "abc")]).unwrap();
        assert_eq!(config.upstream_token(), Some("abc"));
    }
}
