// Configuration from environment variables, read once at startup and passed
// into the watcher task and the status server by value/reference — the core
// logic never reads ambient process state.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const DEFAULT_ROSTER_URL: &str = "https://ntotenkai.com.br/online";
const DEFAULT_STATE_FILE: &str = "last_levels.json";
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
const DEFAULT_STATUS_PORT: u16 = 8080;

/// Threshold of 1 means no filtering: every observed level qualifies.
const DEFAULT_MIN_LEVEL: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Outbound proxy settings for the page fetcher.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the "online players" listing page.
    pub roster_url: String,
    /// Discord webhook target. `None` disables notifications entirely.
    pub webhook_url: Option<String>,
    /// Player names to report on, in configured order. Case-sensitive.
    pub watch_list: Vec<String>,
    /// Sleep between poll cycles.
    pub poll_interval: Duration,
    /// Minimum level for a change to be announced. 1 = announce everything.
    pub min_level: u32,
    /// Path of the persisted last-known-level file.
    pub state_path: PathBuf,
    /// Listening port for the liveness/status endpoint.
    pub status_port: u16,
    /// Optional outbound proxy for the fetcher.
    pub proxy: Option<ProxyConfig>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Separated from
    /// [`Config::from_env`] so tests don't have to mutate process-global
    /// environment variables.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let roster_url = get("ROSTER_URL").unwrap_or_else(|| DEFAULT_ROSTER_URL.to_string());

        let webhook_url = get("DISCORD_WEBHOOK_URL").filter(|url| !url.trim().is_empty());

        let watch_list = parse_watch_list(&get("WATCHED_PLAYERS").unwrap_or_default());

        let interval_secs = parse_var(&get, "CHECK_INTERVAL", DEFAULT_CHECK_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CHECK_INTERVAL".into(),
                message: "must be greater than 0".into(),
            });
        }

        let min_level = parse_var(&get, "MIN_LEVEL", DEFAULT_MIN_LEVEL)?;

        let state_path =
            PathBuf::from(get("STATE_FILE").unwrap_or_else(|| DEFAULT_STATE_FILE.to_string()));

        let status_port = parse_var(&get, "PORT", DEFAULT_STATUS_PORT)?;

        let proxy = get("PROXY_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| ProxyConfig {
                url,
                username: get("PROXY_USER"),
                password: get("PROXY_PASS"),
            });

        Ok(Config {
            roster_url,
            webhook_url,
            watch_list,
            poll_interval: Duration::from_secs(interval_secs),
            min_level,
            state_path,
            status_port,
            proxy,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split a `WATCHED_PLAYERS` value on commas and semicolons, trim each name,
/// and drop empties. Order is preserved; no deduplication (matches are exact
/// and case-sensitive downstream).
pub fn parse_watch_list(raw: &str) -> Vec<String> {
    raw.replace(';', ",")
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<F, T>(get: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var: var.to_string(),
                message: format!("{e} (got {raw:?})"),
            }),
        None => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
