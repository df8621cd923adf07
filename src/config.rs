//! Configuration loading and validation.
//!
//! Configuration comes from an optional TOML file with CLI overrides applied
//! on top (see [`crate::cli::run`]). Defaults match a stock PHP-FPM install.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, Result};
use crate::fetch::FetchStrategy;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub pools: PoolsConfig,
    pub fetcher: FetcherConfig,
    pub process: ProcessConfig,
    pub logging: LoggingConfig,
}

/// Exposition endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the metrics listener binds to.
    pub listen_address: String,
    /// Path under which metrics are exposed.
    pub telemetry_path: String,
}

/// Pool discovery and polling cadence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolsConfig {
    /// Directory holding PHP-FPM pool definition files.
    pub config_dir: PathBuf,
    /// Seconds between status polls, per pool.
    pub poll_interval_secs: u64,
}

/// Status fetch strategy and its knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetcherConfig {
    /// `native` (in-process FastCGI client) or `helper` (external cgi-fcgi).
    pub strategy: FetchStrategy,
    /// Connect timeout for the native client, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Path to the cgi-fcgi executable (helper strategy).
    pub helper_path: PathBuf,
    /// Overall deadline for one helper invocation, in seconds.
    pub helper_timeout_secs: u64,
    /// LD_LIBRARY_PATH override for the helper process.
    pub helper_ld_library_path: Option<String>,
}

/// Master-process metrics via pid file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessConfig {
    /// Path to the FPM master pid file; absent disables process metrics.
    pub pid_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9101".into(),
            telemetry_path: "/metrics".into(),
        }
    }
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            config_dir: "/etc/php/fpm/pool.d".into(),
            poll_interval_secs: 10,
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            strategy: FetchStrategy::Native,
            connect_timeout_ms: 2000,
            helper_path: "/usr/bin/cgi-fcgi".into(),
            helper_timeout_secs: 2,
            helper_ld_library_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.listen_address.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "listen_address",
            }
            .into());
        }
        if !self.server.telemetry_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "telemetry_path",
                reason: format!("must start with '/', got {:?}", self.server.telemetry_path),
            }
            .into());
        }
        if self.pools.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs",
                reason: "must be at least 1 second".into(),
            }
            .into());
        }
        if self.fetcher.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_ms",
                reason: "must be nonzero".into(),
            }
            .into());
        }
        if self.fetcher.helper_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "helper_timeout_secs",
                reason: "must be nonzero".into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        self.logging.init();
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.pools.poll_interval_secs)
    }
}
