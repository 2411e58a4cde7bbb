//! Load config from file and environment.

use std::path::{Path, PathBuf};

use beacon_core::ServerEndpoint;
use serde::Deserialize;
use tracing::warn;

/// Daemon configuration. File: ~/.config/beacon/config.toml or /etc/beacon/config.toml.
/// Env overrides: BEACON_HOST, BEACON_SEND_PORT, BEACON_RECEIVE_PORT.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Send/multicast host and ports.
    #[serde(default)]
    pub server: ServerEndpoint,
    /// Time between `advance` calls in ms (default 16).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Time between status log lines in ms (default 5000).
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    /// Time between `/hello` announcements in ms (default 3000).
    #[serde(default = "default_hello_interval_ms")]
    pub hello_interval_ms: u64,
    /// Cap on inbound messages routed per tick; absent means unbounded.
    #[serde(default)]
    pub max_messages_per_tick: Option<usize>,
    /// Forget clients silent for this long; absent means never.
    #[serde(default)]
    pub client_idle_timeout_ms: Option<u64>,
    /// Trim the recent-subjects log down to capacity instead of one entry per tick.
    #[serde(default)]
    pub strict_recent_log: bool,
}

fn default_tick_interval_ms() -> u64 {
    16
}
fn default_status_interval_ms() -> u64 {
    5_000
}
fn default_hello_interval_ms() -> u64 {
    beacon_core::announcer::DEFAULT_HELLO_INTERVAL_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerEndpoint::default(),
            tick_interval_ms: default_tick_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
            hello_interval_ms: default_hello_interval_ms(),
            max_messages_per_tick: None,
            client_idle_timeout_ms: None,
            strict_recent_log: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Load config: defaults, then the explicit file or the first existing search path, then env vars.
/// An explicit path must load; search-path files that fail to parse are skipped with a warning.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut c = match explicit {
        Some(path) => load_file(path)?,
        None => search_file().unwrap_or_default(),
    };
    apply_env(&mut c, |key| std::env::var(key).ok());
    c.validate()?;
    Ok(c)
}

impl Config {
    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_messages_per_tick == Some(0) {
            return Err(ConfigError::Invalid(
                "max_messages_per_tick must be at least 1 (omit it for no limit)",
            ));
        }
        Ok(())
    }
}

fn apply_env(c: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(h) = var("BEACON_HOST") {
        if !h.trim().is_empty() {
            c.server.host = h.trim().to_owned();
        }
    }
    if let Some(p) = var("BEACON_SEND_PORT").and_then(|s| s.parse::<u16>().ok()) {
        c.server.send_port = p;
    }
    if let Some(p) = var("BEACON_RECEIVE_PORT").and_then(|s| s.parse::<u16>().ok()) {
        c.server.receive_port = p;
    }
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/beacon/config.toml"));
    }
    out.push(PathBuf::from("/etc/beacon/config.toml"));
    out
}

fn search_file() -> Option<Config> {
    let path = config_paths().into_iter().find(|p| p.exists())?;
    match load_file(&path) {
        Ok(c) => Some(c),
        Err(e) => {
            warn!(error = %e, "ignoring config file");
            None
        }
    }
}

fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    let c: Config = toml::from_str(&s).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })?;
    c.validate()?;
    Ok(c)
}
