//! Logging setup for the runner
//!
//! Console output goes to stderr so that command output on stdout stays
//! machine readable. File logging writes a rolling `apvd-runner.log` under
//! the log directory (`~/apvd/logs` by default).

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

pub const LOG_DIR_ENV: &str = "APVD_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "APVD_LOG_LEVEL";
pub const LOG_FILE_ENV: &str = "APVD_LOG_FILE";

const LOG_FILE_NAME: &str = "apvd-runner.log";

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(format!("{}/apvd/logs", home))
}

/// Log rotation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl std::str::FromStr for LogRotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(LogRotation::Daily),
            "hourly" => Ok(LogRotation::Hourly),
            "never" => Ok(LogRotation::Never),
            other => Err(format!("unknown log rotation: {}", other)),
        }
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Logging settings read from the environment, unset when absent
#[derive(Debug, Clone, Default)]
pub struct LoggingEnv {
    pub log_dir: Option<String>,
    pub level: Option<String>,
    pub file_logging: Option<bool>,
}

impl LoggingEnv {
    pub fn from_env() -> Self {
        Self {
            log_dir: std::env::var(LOG_DIR_ENV).ok(),
            level: std::env::var(LOG_LEVEL_ENV).ok(),
            file_logging: std::env::var(LOG_FILE_ENV)
                .ok()
                .map(|v| v.to_lowercase() == "true" || v == "1"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub console_output: bool,
    pub console_level: Level,
    pub file_logging: bool,
    pub file_level: Level,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_output: true,
            console_level: Level::INFO,
            file_logging: false,
            file_level: Level::INFO,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    pub fn from_config(
        log_dir: Option<String>,
        console_output: bool,
        file_logging: bool,
        level: String,
        rotation: Option<String>,
    ) -> Self {
        let log_dir = log_dir.map(PathBuf::from).unwrap_or_else(default_log_dir);
        let level = level.parse().unwrap_or(Level::INFO);
        let rotation = rotation.and_then(|r| r.parse().ok()).unwrap_or_default();

        Self {
            log_dir,
            console_output,
            console_level: level,
            file_logging,
            file_level: level,
            rotation,
        }
    }
}

/// Keeps the non-blocking file writer alive; dropping it flushes buffered output
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the configured levels.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, Box<dyn std::error::Error>> {
    if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;
    }

    let mut guards: Vec<WorkerGuard> = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.console_level.to_string()));
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .with_filter(filter);
        layers.push(Box::new(console_layer));
    }

    if config.file_logging {
        let appender = RollingFileAppender::new(config.rotation.into(), &config.log_dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.file_level.to_string()));
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_filter(filter);
        layers.push(Box::new(file_layer));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    if config.file_logging {
        tracing::info!(log_dir = %config.log_dir.display(), "File logging initialized");
    }

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}
