//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/folio/config.toml)
//! 3. Environment variables (FOLIO_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "FOLIO";

/// Model used when none is configured
pub const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for local state (persisted session, logs)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the hosted store, e.g. `https://abc.example.co`
    #[serde(default)]
    pub store_url: Option<String>,

    /// Public (anonymous) API key of the hosted store
    #[serde(default)]
    pub store_key: Option<String>,

    /// Whether to open realtime change subscriptions
    #[serde(default = "default_true")]
    pub realtime_enabled: bool,

    /// Generative text service credential
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Generative text model name
    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    /// Upper bound for any single network call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log file path (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_url: None,
            store_key: None,
            realtime_enabled: true,
            ai_api_key: None,
            ai_model: default_ai_model(),
            request_timeout_secs: default_request_timeout_secs(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (FOLIO_STORE_URL, FOLIO_AI_API_KEY, ...)
    /// 2. Config file (~/.config/folio/config.toml or FOLIO_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_STORE_URL", ENV_PREFIX)) {
            self.store_url = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_STORE_KEY", ENV_PREFIX)) {
            self.store_key = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_REALTIME_ENABLED", ENV_PREFIX)) {
            self.realtime_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_AI_API_KEY", ENV_PREFIX)) {
            self.ai_api_key = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_AI_MODEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.ai_model = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_REQUEST_TIMEOUT_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse::<u64>() {
                self.request_timeout_secs = secs.max(1);
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with FOLIO_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
            .join("config.toml")
    }

    /// Path of the persisted auth session
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Whether enough is configured to talk to the hosted store
    pub fn is_store_configured(&self) -> bool {
        self.store_url.is_some() && self.store_key.is_some()
    }

    /// WebSocket endpoint for change notifications, derived from `store_url`
    pub fn realtime_url(&self) -> Option<String> {
        let base = self.store_url.as_deref()?.trim_end_matches('/');
        let key = self.store_key.as_deref()?;
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        Some(format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, key
        ))
    }

    /// Per-call network timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
}

fn default_true() -> bool {
    true
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}
