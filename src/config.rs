use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::Result;

/// Environment variable carrying the backend base URL.
pub const BACKEND_URL_ENV: &str = "FRONTEND_BACKEND_BASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server_config: ServerConfig,
    #[serde(default)]
    pub backend_config: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,
    #[serde(default = "default_history_timeout")]
    pub history_timeout_secs: u64,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_session_idle_secs() -> u64 {
    3600
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_discovery_timeout() -> u64 {
    20
}

fn default_listing_timeout() -> u64 {
    20
}

fn default_history_timeout() -> u64 {
    30
}

fn default_query_timeout() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            discovery_timeout_secs: default_discovery_timeout(),
            listing_timeout_secs: default_listing_timeout(),
            history_timeout_secs: default_history_timeout(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

/// Per-call timeouts handed to the backend client.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub discovery: Duration,
    pub listing: Duration,
    pub history: Duration,
    pub query: Duration,
}

impl BackendConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            discovery: Duration::from_secs(self.discovery_timeout_secs),
            listing: Duration::from_secs(self.listing_timeout_secs),
            history: Duration::from_secs(self.history_timeout_secs),
            query: Duration::from_secs(self.query_timeout_secs),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        // Determine file type by extension
        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".json") {
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        }
    }

    /// Load from the first existing candidate file, or fall back to defaults,
    /// then apply environment overrides.
    pub fn resolve() -> Result<(Self, Option<String>)> {
        let candidates: Vec<String> = vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("console.yaml".to_string()),
            Some("console.yml".to_string()),
            Some("console.json".to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut loaded = None;
        for path in candidates {
            if !Path::new(&path).exists() {
                tracing::debug!("Config file {} not present", path);
                continue;
            }
            loaded = Some((Config::load(&path)?, path));
            break;
        }

        let (mut config, source) = match loaded {
            Some((config, path)) => (config, Some(path)),
            None => (Config::default(), None),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok((config, source))
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.backend_config.base_url = url.to_string();
            }
        }
    }
}
