use crate::errors::ConfigError;
use std::fmt;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Console verbosity. A message is shown when its ordinal does not exceed the
/// configured one, so `None` silences everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    None = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
}

impl LogLevel {
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(LogLevel::None),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::None => "NONE",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::None => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
        }
    }
}

/// Filters for (dependencies, this crate): our own messages follow `level`,
/// dependencies never go beyond `warn`.
fn filter_levels(level: LogLevel) -> (LevelFilter, LevelFilter) {
    (
        LevelFilter::from(level.min(LogLevel::Warn)),
        LevelFilter::from(level),
    )
}

fn env_filter(level: LogLevel) -> EnvFilter {
    let (dependencies, own) = filter_levels(level);
    EnvFilter::builder()
        .with_default_directive(dependencies.into())
        .parse_lossy(format!("inverter_poller={own}"))
}

/// Installs the process-wide subscriber. Call once, before anything logs.
pub fn init(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .init();

    info!("Log level set to: {} ({})", level, level.ordinal());
}
