use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// XDG prefix shared by config, state and data directories.
pub const XDG_PREFIX: &str = "gsh";

/// HTTP parameters used when importing scripts from http(s) sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout in seconds.
    pub timeout_secs: u64,
    /// Upper bound on a downloaded script body, in bytes.
    pub max_body_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 60,
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Global configuration loaded from `~/.config/gsh/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GshConfig {
    /// Directory holding `scripts.db` and imported script sources.
    /// Defaults to `~/.local/share/gsh`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Directory for compiled code and sandbox caches. Defaults to `~/.cache/gsh`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Root directory backing `content://` and `resource://` URIs.
    /// Defaults to `<data_dir>/content`.
    #[serde(default)]
    pub content_root: Option<PathBuf>,
    /// Tracing filter directive; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub http: HttpConfig,
}

impl GshConfig {
    /// Resolved data directory (config override or XDG data home).
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(xdg::BaseDirectories::with_prefix(XDG_PREFIX)?.get_data_home()),
        }
    }

    /// Resolved cache directory (config override or XDG cache home).
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(xdg::BaseDirectories::with_prefix(XDG_PREFIX)?.get_cache_home()),
        }
    }

    /// Resolved root for the directory-backed content resolver.
    pub fn content_root(&self) -> Result<PathBuf> {
        match &self.content_root {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.data_dir()?.join("content")),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX)?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GshConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GshConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GshConfig = toml::from_str(&data)?;
    Ok(cfg)
}
