//! Logging configuration and subscriber setup

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::domain::errors::DomainError;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// JSON lines for structured logging
    Json,
}

impl FromStr for LogFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(DomainError::Configuration(format!(
                "Invalid log format: {}. Valid formats: pretty, compact, json",
                s
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level or full filter directive, e.g. `info` or `matchreel=debug`
    pub level: String,
    pub format: LogFormat,
    /// Include target module information
    pub target: bool,
    /// Include thread information
    pub thread: bool,
    /// Use colored output (if supported)
    pub colored: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            target: false,
            thread: false,
            colored: true,
        }
    }
}

impl LoggingSettings {
    /// Filter from `RUST_LOG` when set, otherwise from the configured level
    pub fn env_filter(&self) -> Result<EnvFilter, DomainError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| {
            DomainError::Configuration(format!("Invalid log level '{}': {}", self.level, e))
        })
    }
}

/// Install the global subscriber; logs go to stderr so stdout stays usable
/// for `plan` and `score` output.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), DomainError> {
    let filter = settings.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(settings.target)
        .with_thread_ids(settings.thread)
        .with_ansi(settings.colored);

    let result = match settings.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| DomainError::Configuration(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        level = %settings.level,
        format = %settings.format,
        "Logging initialized"
    );
    Ok(())
}

/// Log version and platform once at startup
pub fn log_system_info() {
    tracing::info!("matchreel {}", env!("CARGO_PKG_VERSION"));

    #[cfg(target_os = "macos")]
    tracing::debug!("Platform: macOS");
    #[cfg(target_os = "linux")]
    tracing::debug!("Platform: Linux");
    #[cfg(target_os = "windows")]
    tracing::debug!("Platform: Windows");
}
