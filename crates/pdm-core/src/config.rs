//! Engine configuration (`~/.config/pdm/config.toml`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::segmenter::DEFAULT_MIN_PART_SIZE;

/// Retry policy parameters (optional `[retry]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per transfer unit (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff; 0 retries immediately.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: secs_f64(self.base_delay_secs),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Negative and NaN values read from the file count as zero.
fn secs_f64(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Download engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads; `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Ranges at most this long are fetched by one request.
    pub min_part_size: u64,
    /// Transfer buffer size in bytes (largest chunk per write).
    pub buffer_size: usize,
    /// How often `wait_all` re-checks the downloads.
    pub wait_poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: Option<String>,
    /// Optional retry policy; built-in defaults when missing.
    pub retry: Option<RetryConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: None,
            min_part_size: DEFAULT_MIN_PART_SIZE,
            buffer_size: 4096,
            wait_poll_interval_ms: 100,
            connect_timeout_secs: 30,
            user_agent: None,
            retry: None,
        }
    }
}

impl EngineConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    /// Configured thread count, or the machine's available parallelism.
    pub fn threads_or_default(&self) -> usize {
        self.threads
            .filter(|&n| n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, |n| n.get()))
    }

    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EngineConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EngineConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
