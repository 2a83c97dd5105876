//! Configuration loading for huginnd.
//!
//! Configuration is loaded from a TOML file with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `./huginn.toml` (working directory)
//! 3. `~/.huginn/config.toml` (user)
//! 4. `/etc/huginn/config.toml` (system)
//!
//! The upstream token may be given in the file (`token = "..."`) or through
//! the `HUGINN_TOKEN` environment variable; the file wins.

use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use http::StatusCode;

use crate::limiter::{DEFAULT_MAX_REQUESTS, DEFAULT_MESSAGE, RateLimitConfig};
use crate::upstream::{DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL};
use crate::{HuginnError, Result};

/// Environment variable consulted when the config file has no token.
pub const TOKEN_ENV_VAR: &str = "HUGINN_TOKEN";

/// Server configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Address to bind to (default: 0.0.0.0).
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upstream credential.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("upstream", &self.upstream)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSection {
    /// Base URL of the upstream API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Authorization scheme preceding the token (default: "Bot").
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,
    /// Upper bound on a single upstream fetch, in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_scheme: default_auth_scheme(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_auth_scheme() -> String {
    DEFAULT_AUTH_SCHEME.to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Rate limiter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSection {
    /// Requests admitted per client per window (default: 11).
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds (default: 1).
    #[serde(default = "default_window")]
    pub window_secs: u64,
    /// HTTP status returned on rejection (default: 429).
    #[serde(default = "default_status")]
    pub status: u16,
    /// Plain-text body returned on rejection.
    #[serde(default = "default_message")]
    pub message: String,
    /// Headers consulted, in order, to identify the client.
    #[serde(default = "default_identity_headers")]
    pub identity_headers: Vec<String>,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window(),
            status: default_status(),
            message: default_message(),
            identity_headers: default_identity_headers(),
        }
    }
}

fn default_max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

fn default_window() -> u64 {
    1
}

fn default_status() -> u16 {
    429
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

fn default_identity_headers() -> Vec<String> {
    RateLimitConfig::default().identity_headers
}

impl RateLimitSection {
    /// Convert to a [`RateLimitConfig`], validating the status code.
    pub fn to_config(&self) -> Result<RateLimitConfig> {
        let status = StatusCode::from_u16(self.status).map_err(|e| {
            HuginnError::Configuration(format!("invalid rate_limit.status {}: {e}", self.status))
        })?;
        if self.window_secs == 0 {
            return Err(HuginnError::Configuration(
                "rate_limit.window_secs must be at least 1".to_string(),
            ));
        }
        Ok(RateLimitConfig::new()
            .max_requests(self.max_requests)
            .window(Duration::from_secs(self.window_secs))
            .status(status)
            .message(self.message.clone())
            .identity_headers(self.identity_headers.iter().cloned()))
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `./huginn.toml`
    /// 3. `~/.huginn/config.toml`
    /// 4. `/etc/huginn/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        Self::load_from_file(&path)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        let local_config = PathBuf::from("huginn.toml");
        if local_config.exists() {
            return Ok(local_config);
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(HuginnError::Configuration(
            "No config file found. Create ./huginn.toml, ~/.huginn/config.toml or /etc/huginn/config.toml"
                .to_string(),
        ))
    }

    /// Upstream token from the config file, falling back to `HUGINN_TOKEN`.
    pub fn token(&self) -> Result<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()))
            .ok_or_else(|| {
                HuginnError::Configuration(format!(
                    "no upstream token: set `token` in the config file or {TOKEN_ENV_VAR}"
                ))
            })
    }

    /// Socket address to listen on.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| HuginnError::Configuration(format!("Invalid listen address: {e}")))
    }

    /// Upper bound on a single upstream fetch.
    pub fn fetch_timeout(&self) -> Result<Duration> {
        if self.upstream.timeout_secs == 0 {
            return Err(HuginnError::Configuration(
                "upstream.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(Duration::from_secs(self.upstream.timeout_secs))
    }
}
