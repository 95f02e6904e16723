use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::marketplace::MARKETPLACE_API_URL;

/// Selector of the "action container" on marketplace package detail pages.
pub const DEFAULT_ANCHOR_SELECTOR: &str = ".ux-item-action";

/// Transport limits (optional `[http]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Overall per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional User-Agent header.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 300,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/ocvsix/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcvsixConfig {
    /// Catalog query endpoint.
    pub endpoint: String,
    /// Selector the button is inserted after.
    pub anchor_selector: String,
    /// How long to wait for the anchor element, in milliseconds.
    pub watch_timeout_ms: u64,
    /// If true, a missing anchor leaves the page untouched instead of reporting an error.
    #[serde(default)]
    pub silent_watch: bool,
    /// How long an error toast stays visible, in milliseconds.
    pub toast_duration_ms: u64,
    /// Where packages are saved (None = current directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Optional transport limits; if missing, built-in defaults are used.
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

impl Default for OcvsixConfig {
    fn default() -> Self {
        Self {
            endpoint: MARKETPLACE_API_URL.to_string(),
            anchor_selector: DEFAULT_ANCHOR_SELECTOR.to_string(),
            watch_timeout_ms: 10_000,
            silent_watch: false,
            toast_duration_ms: 3_000,
            download_dir: None,
            http: None,
        }
    }
}

impl OcvsixConfig {
    pub fn watch_timeout(&self) -> Duration {
        Duration::from_millis(self.watch_timeout_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn http_or_default(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ocvsix")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<OcvsixConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = OcvsixConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: OcvsixConfig = toml::from_str(&data)?;
    Ok(cfg)
}
