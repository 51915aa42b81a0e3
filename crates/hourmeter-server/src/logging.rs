//! Tracing subscriber setup driven by the `[logging]` config section.
//!
//! Development mode prints pretty, span-aware lines to stdout. Production
//! mode writes JSON to rolling files under `logging.directory` and mirrors
//! a compact, colourless copy to stdout for the journal.

use anyhow::Context;
use hourmeter_core::{LogRotation, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix of production log files.
const LOG_FILE_PREFIX: &str = "hourmeter";

/// Background log writers.
///
/// Dropping this flushes whatever the writers still buffer, so hold it
/// until the last line (the shutdown flush report) has been logged.
#[must_use = "dropping the guards stops the log writers"]
#[derive(Debug, Default)]
pub struct LogGuards {
    _writers: Vec<WorkerGuard>,
}

/// Install the global subscriber.
///
/// The filter is `RUST_LOG` when set, otherwise `logging.level`.
///
/// # Errors
///
/// Returns an error if the filter does not parse, the log directory or
/// file cannot be created, or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<LogGuards> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(rust_log.as_deref(), &config.level);
    let env_filter = EnvFilter::try_new(directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;

    if config.production {
        init_production(config, env_filter)
    } else {
        init_development(env_filter)?;
        Ok(LogGuards::default())
    }
}

fn filter_directive<'a>(rust_log: Option<&'a str>, level: &'a str) -> &'a str {
    rust_log
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .unwrap_or(level)
}

const fn rotation(schedule: LogRotation) -> Rotation {
    match schedule {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

fn init_production(config: &LoggingConfig, env_filter: EnvFilter) -> anyhow::Result<LogGuards> {
    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!("failed to create log directory {}", config.directory.display())
    })?;

    let file_appender = RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&config.directory)
        .with_context(|| format!("failed to open log file in {}", config.directory.display()))?;
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LogGuards {
        _writers: vec![file_guard, stdout_guard],
    })
}

fn init_development(env_filter: EnvFilter) -> anyhow::Result<()> {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .context("failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins_over_config_level() {
        assert_eq!(filter_directive(Some("debug"), "info"), "debug");
        assert_eq!(filter_directive(None, "warn"), "warn");
        assert_eq!(filter_directive(Some("  "), "warn"), "warn");
    }

    #[test]
    fn test_rotation_schedule() {
        assert_eq!(rotation(LogRotation::Hourly), Rotation::HOURLY);
        assert_eq!(rotation(LogRotation::Daily), Rotation::DAILY);
        assert_eq!(rotation(LogRotation::Never), Rotation::NEVER);
    }

    #[test]
    fn test_configured_level_parses() {
        let config = LoggingConfig {
            level: "hourmeter_core=debug,tower_http=warn,info".to_string(),
            ..LoggingConfig::default()
        };
        assert!(EnvFilter::try_new(&config.level).is_ok());
    }
}
