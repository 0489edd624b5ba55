//! # Shop Statistics Pipeline
//!
//! `shopstats` is the data layer behind an e-commerce operations dashboard.
//! It fetches analytics JSON through a deduplicating response cache and turns
//! the daily series into smoothed, hoverable SVG line charts.
//!
//! ## Features
//!
//! - Time-bounded response cache with lazy eviction
//! - Coalescing of concurrent identical requests
//! - Background preloading of likely-needed endpoints
//! - Downsampling and active-series selection for long series
//! - Smoothed quadratic paths, y-axis ticks and hover hit-testing
//! - SVG rendering with a small LRU memo of rendered charts
//! - Marketing pixel trackers behind a single trait
//!
//! ## Example
//!
//! ```no_run
//! use shopstats::{ChartView, Config, DedupFetcher, FetchOptions};
//! use shopstats::plotting::{render_svg, ChartStyle, ChartTheme};
//! use shopstats::types::AnalyticsPayload;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let fetcher = DedupFetcher::from_config(&config.cache)?;
//!
//! let json = fetcher
//!     .fetch("https://shop.example.com/api/analytics", FetchOptions::default())
//!     .await?;
//! let view = ChartView::new(AnalyticsPayload::from_value(&json), &config.chart);
//! let svg = render_svg(&view, &ChartTheme::default(), &ChartStyle::default())
//!     .map_err(|e| anyhow::anyhow!(e))?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod fetch;
pub mod plotting;
pub mod tracking;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use app::ChartView;
pub use config::Config;
pub use error::{ConfigError, FetchError, TrackerError};
pub use fetch::{DedupFetcher, FetchOptions, Method};
pub use types::{AnalyticsPayload, CacheStats, DayRecord, Tooltip};
