//! Configuration loader: defaults, an optional `config.toml`, then environment
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

const APP_DIR: &str = "shopstats";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// Request cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default time-to-live for cached GET responses.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Per-request timeout for the HTTP transport.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Chart geometry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Maximum number of plotted points before downsampling kicks in.
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_padding")]
    pub padding: u32,

    /// Multiplier on the data maximum reserving space above the tallest point.
    #[serde(default = "default_headroom")]
    pub headroom: f64,

    /// How many categories to show when none has a positive total.
    #[serde(default = "default_fallback_series")]
    pub fallback_series: usize,
}

/// Marketing pixel ids per vendor. Empty lists disable the vendor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub meta: Vec<String>,
    #[serde(default)]
    pub google: Vec<String>,
    #[serde(default)]
    pub tiktok: Vec<String>,
}

fn default_ttl_secs() -> u64 {
    300
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
fn default_max_points() -> usize {
    90
}
fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    300
}
fn default_padding() -> u32 {
    40
}
fn default_headroom() -> f64 {
    1.15
}
fn default_fallback_series() -> usize {
    5
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            request_timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
            headroom: default_headroom(),
            fallback_series: default_fallback_series(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// `<config dir>/shopstats/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Parse a TOML document. Missing tables and keys take their defaults.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load from an explicit path, or the default location when `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error. Environment overrides are applied and the result validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        tracing::debug!(path = %shown, "loaded config file");
        Self::from_toml_str(&contents, &shown)
    }

    /// Apply `SHOPSTATS_*` overrides using the given variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SHOPSTATS_CACHE_TTL_SECS") {
            self.cache.default_ttl_secs = raw.trim().parse().map_err(|_| ConfigError::Env {
                name: "SHOPSTATS_CACHE_TTL_SECS",
                expected: "an integer >= 0",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup("SHOPSTATS_MAX_POINTS") {
            self.chart.max_points = raw.trim().parse().map_err(|_| ConfigError::Env {
                name: "SHOPSTATS_MAX_POINTS",
                expected: "an integer > 0",
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues: Vec<String> = Vec::new();
        let chart = &self.chart;

        if chart.max_points == 0 {
            issues.push("chart.max_points must be > 0".into());
        }
        if chart.width == 0 || chart.height == 0 {
            issues.push("chart.width and chart.height must be > 0".into());
        }
        if chart.padding.saturating_mul(2) >= chart.width.min(chart.height) {
            issues.push("chart.padding must leave room for the plot area".into());
        }
        if !chart.headroom.is_finite() || chart.headroom <= 1.0 {
            issues.push("chart.headroom must be a finite number > 1".into());
        }
        if self.cache.request_timeout_secs == 0 {
            issues.push("cache.request_timeout_secs must be > 0".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues.join("; ")))
        }
    }
}
