//! Configuration management for the server

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use triage_core::TrackerSettings;
use triage_tracker::JiraConfig;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub triage: TrackerSettings,
    pub logging: LoggingConfig,
}

/// HTTP intake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

/// Issue tracker connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                request_timeout_secs: 60,
                max_body_bytes: 1024 * 1024, // 1MB
            },
            tracker: TrackerConfig {
                base_url: "http://localhost:8080".to_string(),
                username: String::new(),
                password: String::new(),
                timeout_secs: 30,
            },
            triage: TrackerSettings::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));
        Self::build(builder)
    }

    /// Load configuration from a single file, still honouring the environment
    pub fn load_from_file(path: &str) -> Result<Self> {
        let builder = config::Config::builder().add_source(config::File::with_name(path));
        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix("EXCEPTION_TRIAGE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.request_timeout_secs", 60)?
            .set_default("server.max_body_bytes", 1048576)?
            .set_default("tracker.base_url", "http://localhost:8080")?
            .set_default("tracker.username", "")?
            .set_default("tracker.password", "")?
            .set_default("tracker.timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be caught by deserialization
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.tracker.base_url).map_err(|e| {
            Error::Configuration(format!("invalid tracker.base_url {:?}: {}", self.tracker.base_url, e))
        })?;
        if self.server.request_timeout_secs == 0 || self.tracker.timeout_secs == 0 {
            return Err(Error::Configuration("timeouts must be at least one second".to_string()));
        }
        self.triage.validate()?;
        self.server_addr()?;
        Ok(())
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| Error::Configuration(format!("invalid server address: {}", e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Connection settings for the Jira client
    pub fn jira_config(&self) -> JiraConfig {
        JiraConfig {
            base_url: self.tracker.base_url.clone(),
            username: self.tracker.username.clone(),
            password: self.tracker.password.clone(),
            timeout: Duration::from_secs(self.tracker.timeout_secs),
        }
    }

    /// Default tracing filter for the configured level
    pub fn log_filter(&self) -> String {
        let level = &self.logging.level;
        format!(
            "triage_server={level},triage_tracker={level},triage_core={level},tower_http=debug"
        )
    }
}
