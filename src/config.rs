//! TOML configuration.
//!
//! ```toml
//! [upstream]
//! base_url = "https://diogrande.campogrande.ms.gov.br"
//! accept_invalid_certs = true   # upstream serves an incomplete chain
//! timeout_secs = 30
//!
//! [tools]
//! read_limit_chars = 15000
//! context_lines = 10
//! max_snippets = 5
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```
//!
//! Every section is optional; omitted keys take the defaults above (with
//! `accept_invalid_certs = false`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://diogrande.campogrande.ms.gov.br";

/// Desktop-browser identity the upstream expects from its own AJAX client.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Skip TLS certificate validation. Security trade-off; off unless set.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Per-request timeout. `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            accept_invalid_certs: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    #[serde(default = "default_read_limit")]
    pub read_limit_chars: usize,
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            read_limit_chars: default_read_limit(),
            context_lines: default_context_lines(),
            max_snippets: default_max_snippets(),
        }
    }
}

fn default_read_limit() -> usize {
    15_000
}
fn default_context_lines() -> usize {
    10
}
fn default_max_snippets() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let base = config.upstream.base_url.trim();
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        anyhow::bail!(
            "upstream.base_url must be an http(s) URL, got '{}'",
            config.upstream.base_url
        );
    }
    if config.upstream.user_agent.trim().is_empty() {
        anyhow::bail!("upstream.user_agent must not be empty");
    }

    if config.tools.read_limit_chars == 0 {
        anyhow::bail!("tools.read_limit_chars must be > 0");
    }
    if config.tools.max_snippets == 0 {
        anyhow::bail!("tools.max_snippets must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(())
}
