use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default CMS provider-data metastore listing.
pub const DEFAULT_CATALOG_URL: &str =
    "https://data.cms.gov/provider-data/api/1/metastore/schemas/dataset/items";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per body request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// When the metadata store is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistCadence {
    /// Once, after every fetch of the run has finished.
    #[default]
    EndOfRun,
    /// After every successfully recorded resource.
    EachSuccess,
}

/// Global configuration loaded from `~/.config/catfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Catalog listing endpoint (JSON array of dataset items).
    pub catalog_url: String,
    /// Case-insensitive substring a dataset's theme (or title) must contain.
    pub theme: String,
    /// Root of the data tree; files land in `<data_dir>/<dataset_id>/<filename>`.
    pub data_dir: PathBuf,
    /// Metadata store file (JSON mapping keyed by resource identity).
    pub store_path: PathBuf,
    /// Hard ceiling on simultaneous body transfers.
    pub max_concurrent_downloads: usize,
    /// Maximum revalidation probes in flight.
    pub max_concurrent_probes: usize,
    /// Timeout for a single HEAD probe.
    pub probe_timeout_secs: u64,
    /// Timeout for a single body request.
    pub fetch_timeout_secs: u64,
    /// TCP/TLS connect timeout for every request.
    pub connect_timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Store persistence cadence: "end_of_run" (default) or "each_success".
    #[serde(default)]
    pub persist: PersistCadence,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            theme: "hospital".to_string(),
            data_dir: PathBuf::from("data"),
            store_path: PathBuf::from("metadata.json"),
            max_concurrent_downloads: 8,
            max_concurrent_probes: 8,
            probe_timeout_secs: 10,
            fetch_timeout_secs: 120,
            connect_timeout_secs: 15,
            user_agent: concat!("catfetch/", env!("CARGO_PKG_VERSION")).to_string(),
            persist: PersistCadence::EndOfRun,
            retry: None,
        }
    }
}

impl FetchConfig {
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("catfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<FetchConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: FetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
