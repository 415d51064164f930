//! Server configuration: TOML file, then environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{McpError, McpResult};

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "dr-gateway.toml";

/// Listen port environment variable (set by most PaaS hosts).
pub const ENV_PORT: &str = "PORT";
/// Listen host environment variable.
pub const ENV_HOST: &str = "MCP_BIND_HOST";
/// Shared secret environment variable.
pub const ENV_AUTH_TOKEN: &str = "MCP_AUTH_TOKEN";
/// Database path environment variable.
pub const ENV_DATABASE_PATH: &str = "DR_DATABASE_PATH";
/// Idle timeout (seconds) environment variable.
pub const ENV_SESSION_IDLE_SECS: &str = "MCP_SESSION_IDLE_SECS";

/// Runtime configuration for the gateway.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// SQLite database file.
    pub database_path: String,
    /// Shared bearer secret. Unset means every call is rejected.
    pub auth_token: Option<String>,
    /// Close sessions idle this long. Unset disables sweeping.
    pub session_idle_timeout_secs: Option<u64>,
    /// How often the idle sweeper runs.
    pub sweep_interval_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "data/dr-records.db".to_string(),
            auth_token: None,
            session_idle_timeout_secs: None,
            sweep_interval_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("session_idle_timeout_secs", &self.session_idle_timeout_secs)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ServerConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> McpResult<Self> {
        toml::from_str(text).map_err(|e| McpError::Config(format!("invalid config: {e}")))
    }

    /// `host:port` to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Idle timeout, if sweeping is enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.session_idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Sweeper period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> McpResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> McpResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| McpError::Config(format!("{ENV_PORT} is not a port: {port}")))?;
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN) {
            self.auth_token = Some(token);
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = path;
        }
        if let Some(secs) = lookup(ENV_SESSION_IDLE_SECS) {
            let secs = secs.trim().parse().map_err(|_| {
                McpError::Config(format!("{ENV_SESSION_IDLE_SECS} is not a number: {secs}"))
            })?;
            self.session_idle_timeout_secs = Some(secs);
        }
        Ok(())
    }
}

/// Load configuration from `path` (or [`DEFAULT_CONFIG_FILE`] if present),
/// then apply environment overrides.
pub fn load_config(path: Option<&str>) -> McpResult<ServerConfig> {
    let mut config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| McpError::Config(format!("cannot read {p}: {e}")))?;
            ServerConfig::from_toml(&text)?
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            let text = std::fs::read_to_string(DEFAULT_CONFIG_FILE)?;
            ServerConfig::from_toml(&text)?
        }
        None => ServerConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}
