use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Database URL. Without it rooms and pins live in process memory.
    pub db_url: Option<String>,

    /// Seconds between server pings on a websocket
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Seconds of silence after which a websocket is considered gone
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_secs: u64,

    #[serde(default = "default_room_cache_ttl")]
    pub room_cache_ttl_secs: u64,

    #[serde(default = "default_room_cache_capacity")]
    pub room_cache_capacity: u64,

    /// Seconds an empty room stays in memory after its last use; 0 keeps rooms forever
    #[serde(default = "default_room_idle")]
    pub room_idle_secs: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                config.validate()?;
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "HEARTBEAT_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.heartbeat_timeout_secs <= self.heartbeat_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "HEARTBEAT_TIMEOUT_SECS ({}) must exceed HEARTBEAT_INTERVAL_SECS ({})",
                self.heartbeat_timeout_secs, self.heartbeat_interval_secs
            )));
        }
        Ok(())
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn room_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.room_cache_ttl_secs)
    }

    /// Idle period after which an empty room is evicted, if eviction is on
    pub fn room_idle_timeout(&self) -> Option<Duration> {
        match self.room_idle_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Parsed CORS origins; `None` means any origin is allowed.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let raw = self.cors_origins.as_deref()?.trim();
        if raw.is_empty() || raw == "*" {
            return None;
        }
        Some(
            raw.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            service_name: default_service_name(),
            db_url: None,
            heartbeat_interval_secs: default_heartbeat_interval(),
            heartbeat_timeout_secs: default_heartbeat_timeout(),
            room_cache_ttl_secs: default_room_cache_ttl(),
            room_cache_capacity: default_room_cache_capacity(),
            room_idle_secs: default_room_idle(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "pinroom".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_heartbeat_interval() -> u64 {
    15
}

fn default_heartbeat_timeout() -> u64 {
    45
}

fn default_room_cache_ttl() -> u64 {
    300
}

fn default_room_cache_capacity() -> u64 {
    10_000
}

fn default_room_idle() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:8001");
        assert!(config.is_development());
        assert!(config.validate().is_ok());
        assert_eq!(config.room_idle_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn zero_idle_period_disables_eviction() {
        let config = Config {
            room_idle_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.room_idle_timeout(), None);
    }

    #[test]
    fn timeout_must_exceed_interval() {
        let config = Config {
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 30,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let mut config = Config::default();
        assert_eq!(config.allowed_origins(), None);

        config.cors_origins = Some("*".to_string());
        assert_eq!(config.allowed_origins(), None);

        config.cors_origins = Some("http://a.test, http://b.test,".to_string());
        assert_eq!(
            config.allowed_origins(),
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }
}
