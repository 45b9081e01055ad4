use crate::errors::ConfigError;
use crate::logging::LogLevel;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const REQUIRED_VARS: &[&str] = &[
    "WEB_USERNAME",
    "WEB_SERVER",
    "MYSQL_USERNAME",
    "MYSQL_SERVER",
    "MYSQL_DATABASE",
    "MYSQL_TABLE",
];

pub const OPTIONAL_VARS: &[(&str, &str)] = &[
    ("LOG", "info"),
    ("INTERVAL", "600"),
    ("HTTP_TIMEOUT", "30"),
    ("METRICS_ADDR", ""),
    ("MYSQL_PASSWORD", ""),
    ("WEB_PASSWORD", ""),
];

/// Resolves every required name and every optional name (falling back to its
/// default) through `lookup`.
///
/// All missing required names are reported together, in the order given. A
/// variable that is set to an empty string counts as present.
pub fn resolve_vars<F>(
    required: &[&str],
    optional: &[(&str, &str)],
    lookup: F,
) -> Result<HashMap<String, String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut vars = HashMap::with_capacity(required.len() + optional.len());
    let mut missing = Vec::new();

    for name in required {
        match lookup(name) {
            Some(value) => {
                vars.insert(name.to_string(), value);
            }
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(ConfigError::Missing(missing));
    }

    for (name, default) in optional {
        let value = lookup(name).unwrap_or_else(|| default.to_string());
        vars.insert(name.to_string(), value);
    }

    Ok(vars)
}

/// All recognised variable names, sorted.
pub fn variable_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REQUIRED_VARS
        .iter()
        .copied()
        .chain(OPTIONAL_VARS.iter().map(|(name, _)| *name))
        .collect();
    names.sort_unstable();
    names
}

/// Inverter web interface access.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub username: String,
    pub password: String,
    pub server: String,
}

impl WebConfig {
    pub fn status_url(&self) -> String {
        format!("http://{}/status.html", self.server)
    }

    pub fn referer(&self) -> String {
        format!("http://{}/index_cn.html", self.server)
    }
}

#[derive(Debug, Clone)]
pub struct MysqlConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    pub database: String,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub mysql: MysqlConfig,
    pub log_level: LogLevel,
    pub interval: Duration,
    pub http_timeout: Duration,
    pub metrics_addr: Option<String>,
}

impl Config {
    /// Loads `.env` (if any) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut vars = resolve_vars(REQUIRED_VARS, OPTIONAL_VARS, lookup)?;
        let mut take = |name: &str| vars.remove(name).unwrap_or_default();

        let log_level: LogLevel = take("LOG").parse()?;
        let interval = parse_seconds("INTERVAL", take("INTERVAL"))?;
        let http_timeout = parse_timeout("HTTP_TIMEOUT", take("HTTP_TIMEOUT"))?;
        let metrics_addr = Some(take("METRICS_ADDR")).filter(|addr| !addr.trim().is_empty());

        Ok(Config {
            web: WebConfig {
                username: take("WEB_USERNAME"),
                password: take("WEB_PASSWORD"),
                server: take("WEB_SERVER"),
            },
            mysql: MysqlConfig {
                username: take("MYSQL_USERNAME"),
                password: take("MYSQL_PASSWORD"),
                server: take("MYSQL_SERVER"),
                database: take("MYSQL_DATABASE"),
                table: take("MYSQL_TABLE"),
            },
            log_level,
            interval,
            http_timeout,
            metrics_addr,
        })
    }
}

/// Decimal seconds, e.g. `600` or `0.5`.
fn parse_seconds(name: &'static str, value: String) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or(ConfigError::Invalid { name, value })
}

/// Like [`parse_seconds`], but zero is rejected: a zero timeout fails every
/// request before it is sent.
fn parse_timeout(name: &'static str, value: String) -> Result<Duration, ConfigError> {
    match parse_seconds(name, value.clone())? {
        timeout if timeout.is_zero() => Err(ConfigError::Invalid { name, value }),
        timeout => Ok(timeout),
    }
}
