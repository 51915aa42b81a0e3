//! Application configuration management.
//!
//! Configuration is layered:
//! 1. Built-in defaults
//! 2. An optional TOML file (`/etc/hourmeter/config.toml` on Linux)
//! 3. Environment overrides, e.g. `HOURMETER__ENGINE__MACHINE_PERIOD_MINUTES=480`
//!
//! `HOURMETER_CONFIG` names an alternate file for step 2.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::PeriodSettings;
use crate::error::{HourmeterError, Result};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "HOURMETER";

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "HOURMETER_CONFIG";

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourmeterConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Where counters are persisted.
    pub storage: StorageConfig,
    /// Tick clock and initial period inputs.
    pub engine: EngineConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind_address: String,
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file the counters are written to.
    pub state_file: PathBuf,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Milliseconds between ticks. Each tick counts as one second.
    pub tick_interval_ms: u64,
    /// Initial machine maintenance period in minutes.
    pub machine_period_minutes: u32,
    /// Initial spindle maintenance period in minutes.
    pub spindle_period_minutes: u32,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSON file logging plus compact stdout instead of pretty stdout.
    pub production: bool,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `hourmeter_core=debug,info`.
    pub level: String,
    /// Directory for JSON log files in production mode.
    pub directory: PathBuf,
    /// How often production log files roll over.
    pub rotation: LogRotation,
}

/// Log file rollover schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// One file per hour.
    Hourly,
    /// One file per day.
    #[default]
    Daily,
    /// A single file.
    Never,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            production: false,
            level: "info".to_string(),
            directory: default_log_dir(),
            rotation: LogRotation::Daily,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            machine_period_minutes: 0,
            spindle_period_minutes: 0,
        }
    }
}

impl EngineConfig {
    /// Initial period inputs for the engine.
    #[must_use]
    pub const fn periods(&self) -> PeriodSettings {
        PeriodSettings {
            machine_minutes: self.machine_period_minutes,
            spindle_minutes: self.spindle_period_minutes,
        }
    }
}

impl HourmeterConfig {
    /// Load configuration from [`config_path`] and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load configuration from `path` (optional) and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(path, None)
    }

    /// Layer `path` under environment overrides. `env` replaces the process
    /// environment when given.
    fn build(path: &Path, env: Option<::config::Map<String, String>>) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns every problem found, joined into one validation error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.engine.tick_interval_ms == 0 {
            problems.push("engine.tick_interval_ms: must be greater than 0".to_string());
        }
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            problems.push(format!(
                "server.bind_address: '{}' is not a socket address",
                self.server.bind_address
            ));
        }
        if self.storage.state_file.as_os_str().is_empty() {
            problems.push("storage.state_file: must not be empty".to_string());
        }
        if self.logging.level.trim().is_empty() {
            problems.push("logging.level: must not be empty".to_string());
        }
        if self.logging.production && self.logging.directory.as_os_str().is_empty() {
            problems.push("logging.directory: required in production mode".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(HourmeterError::ConfigValidationError(problems.join("; ")))
        }
    }

    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address does not parse.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        self.server.bind_address.parse().map_err(|_| {
            HourmeterError::ConfigValidationError(format!(
                "server.bind_address: '{}' is not a socket address",
                self.server.bind_address
            ))
        })
    }
}

/// Config file to read: `HOURMETER_CONFIG` if set, else the default.
#[must_use]
pub fn config_path() -> PathBuf {
    resolve_config_path(std::env::var_os(CONFIG_PATH_ENV))
}

fn resolve_config_path(var: Option<OsString>) -> PathBuf {
    var.filter(|path| !path.is_empty())
        .map_or_else(default_config_path, PathBuf::from)
}

/// Default configuration file location.
///
/// On Linux: `/etc/hourmeter/config.toml`
/// Elsewhere: the platform config directory.
#[must_use]
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/etc/hourmeter/config.toml")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "hourmeter").map_or_else(
            || PathBuf::from("config.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }
}

/// Default state file location.
///
/// On Linux: `/var/lib/hourmeter/state.json`
/// Elsewhere: the platform data directory.
#[must_use]
pub fn default_state_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/var/lib/hourmeter/state.json")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "hourmeter").map_or_else(
            || PathBuf::from("state.json"),
            |dirs| dirs.data_dir().join("state.json"),
        )
    }
}

/// Default log directory.
///
/// On Linux: `/var/log/hourmeter`
/// Elsewhere: `logs` under the platform data directory.
#[must_use]
pub fn default_log_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/var/log/hourmeter")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "hourmeter").map_or_else(
            || PathBuf::from("logs"),
            |dirs| dirs.data_dir().join("logs"),
        )
    }
}
