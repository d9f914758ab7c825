//! Layered configuration for the sync server.
//!
//! Values are resolved file → environment → CLI, later layers winning. The
//! file lives at `.flowsync/flowsync.toml` unless `--config` points
//! elsewhere, and every section is optional.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:8080"
//! request_timeout_secs = 15
//!
//! [database]
//! path = ".flowsync/flowsync.db"
//!
//! [webhook]
//! secret = "change-me"
//! max_body_bytes = 1048576
//! ```
//!
//! Environment overrides: `GITHUB_WEBHOOK_SECRET`, `HTTP_ADDR`,
//! `FLOWSYNC_DB_PATH`, `FLOWSYNC_MAX_BODY_BYTES`,
//! `FLOWSYNC_REQUEST_TIMEOUT_SECS`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = ".flowsync/flowsync.toml";

/// GitHub caps payloads at 25 MB, but push and pull_request bodies stay far
/// below 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1 << 20;

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".flowsync/flowsync.db")
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookSection {
    /// Shared HMAC secret configured on the GitHub webhook.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for WebhookSection {
    fn default() -> Self {
        Self {
            secret: String::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl std::fmt::Debug for WebhookSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSection")
            .field("secret", &if self.secret.is_empty() { "<unset>" } else { "<redacted>" })
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub webhook: WebhookSection,
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub addr: Option<String>,
    pub db_path: Option<PathBuf>,
}

impl SyncConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    /// Read a config file. A missing file at the default location is not an
    /// error; an explicitly requested one is.
    pub fn from_file(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Resolve all three layers.
    pub fn load(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path, true)?,
            None => Self::from_file(Path::new(DEFAULT_CONFIG_PATH), false)?,
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_cli(cli);
        Ok(config)
    }

    /// Overlay environment values. `lookup` is injected so tests do not
    /// touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(secret) = get("GITHUB_WEBHOOK_SECRET") {
            self.webhook.secret = secret;
        }
        if let Some(addr) = get("HTTP_ADDR") {
            self.server.addr = addr;
        }
        if let Some(path) = get("FLOWSYNC_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = get("FLOWSYNC_MAX_BODY_BYTES") {
            self.webhook.max_body_bytes = max
                .trim()
                .parse()
                .with_context(|| format!("Invalid FLOWSYNC_MAX_BODY_BYTES '{}'", max))?;
        }
        if let Some(secs) = get("FLOWSYNC_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid FLOWSYNC_REQUEST_TIMEOUT_SECS '{}'", secs))?;
        }
        Ok(())
    }

    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(addr) = &cli.addr {
            self.server.addr = addr.clone();
        }
        if let Some(path) = &cli.db_path {
            self.database.path = path.clone();
        }
    }

    /// Accept `:8080` as shorthand for all interfaces.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = self.server.addr.trim();
        let addr = if addr.starts_with(':') {
            format!("0.0.0.0{}", addr)
        } else {
            addr.to_string()
        };
        addr.parse()
            .with_context(|| format!("Invalid listen address '{}'", self.server.addr))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Hard errors stop startup; the returned strings are warnings.
    pub fn validate(&self) -> Result<Vec<String>> {
        self.socket_addr()?;
        if self.webhook.max_body_bytes == 0 {
            anyhow::bail!("webhook.max_body_bytes must be greater than zero");
        }
        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be greater than zero");
        }

        let mut warnings = Vec::new();
        if self.webhook.secret.is_empty() {
            warnings.push(
                "No webhook secret configured; every delivery will be rejected with 401"
                    .to_string(),
            );
        }
        if self.webhook.max_body_bytes > 25 * 1024 * 1024 {
            warnings.push(format!(
                "webhook.max_body_bytes = {} exceeds GitHub's 25 MB payload cap",
                self.webhook.max_body_bytes
            ));
        }
        Ok(warnings)
    }
}
