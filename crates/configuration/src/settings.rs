use crate::error::ConfigError;
use core_types::LedgerSettings;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so the application runs without a `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ledger: LedgerDefaults,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Rejects values that would only fail later, at first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "database.acquire_timeout_secs must be positive".to_string(),
            ));
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "client.timeout_secs must be positive".to_string(),
            ));
        }
        if !self.ledger.starting_balance.is_finite() || !self.ledger.exchange_rate.is_finite() {
            return Err(ConfigError::ValidationError(
                "ledger.starting_balance and ledger.exchange_rate must be finite numbers".to_string(),
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.body_limit_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contains parameters for the HTTP API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body (imports are sent as a single body).
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("server.host '{}' is not an IP address", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Contains parameters for the entry and settings store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string. `DATABASE_URL` in the environment takes precedence.
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pnl_ledger.db?mode=rwc".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Values used to seed the settings row of a fresh database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerDefaults {
    pub starting_balance: f64,
    pub exchange_rate: f64,
}

impl Default for LedgerDefaults {
    fn default() -> Self {
        let settings = LedgerSettings::default();
        Self {
            starting_balance: settings.starting_balance,
            exchange_rate: settings.exchange_rate,
        }
    }
}

impl From<&LedgerDefaults> for LedgerSettings {
    fn from(defaults: &LedgerDefaults) -> Self {
        Self {
            starting_balance: defaults.starting_balance,
            exchange_rate: defaults.exchange_rate,
        }
    }
}

/// Contains parameters for the remote metrics client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Additional attempts after the first one for transient failures.
    pub max_retries: u32,
    /// Backoff before the first retry; doubled for every further attempt.
    pub base_backoff_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            base_backoff_ms: 200,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Contains parameters for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs go to a daily-rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,sqlx=warn,tower_http=info".to_string(),
            format: LogFormat::default(),
            directory: None,
            file_prefix: "pnl-ledger.log".to_string(),
        }
    }
}
