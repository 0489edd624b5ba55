//! Shop Statistics command line
//!
//! Renders dashboard charts from an analytics endpoint or a saved payload,
//! and warms endpoints through the request cache.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use shopstats::plotting::{render_svg, ChartStyle, ChartTheme};
use shopstats::tracking::TrackerSet;
use shopstats::{AnalyticsPayload, ChartView, Config, DedupFetcher, FetchOptions};

#[derive(Parser)]
#[command(name = "shopstats")]
#[command(about = "Analytics fetch cache and chart renderer", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an analytics payload to an SVG chart
    Chart {
        /// Analytics endpoint to fetch
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,

        /// Saved analytics JSON
        #[arg(long)]
        file: Option<PathBuf>,

        /// Comma-separated categories to show
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// Output SVG file
        #[arg(long, default_value = "chart.svg")]
        out: PathBuf,

        /// Sampled index to hover and print the tooltip for
        #[arg(long)]
        hover: Option<usize>,

        /// Override the configured sample limit
        #[arg(long)]
        max_points: Option<usize>,
    },

    /// Fetch endpoints into the cache and report what landed
    Preload {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

fn init_tracing() {
    let default_filter = if cfg!(feature = "dev") {
        "shopstats=debug"
    } else {
        "shopstats=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("load configuration")?;
    let fetcher = DedupFetcher::from_config(&config.cache).context("build http client")?;

    #[cfg(feature = "dev")]
    shopstats::fetch::debug::expose(&fetcher);

    let trackers = TrackerSet::from_config(&config.tracking).context("initialize trackers")?;
    if !trackers.is_empty() {
        info!(vendors = ?trackers.vendors(), "trackers ready");
    }

    match cli.cmd {
        Command::Chart {
            url,
            file,
            categories,
            out,
            hover,
            max_points,
        } => {
            if let Some(max_points) = max_points {
                if max_points == 0 {
                    bail!("--max-points must be at least 1");
                }
                config.chart.max_points = max_points;
            }

            let json = match (url, file) {
                (Some(url), _) => fetcher
                    .fetch(&url, FetchOptions::default())
                    .await
                    .with_context(|| format!("fetch {}", url))?,
                (None, Some(path)) => {
                    let raw = fs::read_to_string(&path)
                        .with_context(|| format!("read {}", path.display()))?;
                    serde_json::from_str(&raw)
                        .with_context(|| format!("parse {}", path.display()))?
                }
                (None, None) => bail!("either --url or --file is required"),
            };

            let mut view = ChartView::new(AnalyticsPayload::from_value(&json), &config.chart);
            if categories.is_some() {
                view.select_categories(categories);
            }
            info!(
                days = view.payload().days.len(),
                sampled = view.sampled().len(),
                series = ?view.active_series(),
                "chart prepared"
            );

            if let Some(index) = hover {
                view.set_hover(Some(index));
                match view.hit_test(index) {
                    Some(tip) => {
                        println!("{}", tip.day);
                        for (category, value) in &tip.breakdown {
                            println!("  {:<12} {}", category, value);
                        }
                        println!("  {:<12} {}", "total", tip.total);
                    }
                    None => println!("no point at index {}", index),
                }
            }

            let svg = render_svg(&view, &ChartTheme::default(), &ChartStyle::default())
                .map_err(|e| anyhow!("render chart: {}", e))?;
            fs::write(&out, svg).with_context(|| format!("write {}", out.display()))?;
            println!("Chart written to {}", out.display());
        }
        Command::Preload { urls } => {
            let count = urls.len();
            if let Some(task) = fetcher.preload(urls) {
                task.await.context("preload task")?;
            }
            let stats = fetcher.cache_stats();
            println!("Preloaded {} of {} endpoints", stats.cache_size, count);
            for key in &stats.keys {
                println!("  {}", key);
            }
        }
    }

    info!(stats = ?fetcher.cache_stats(), "done");

    #[cfg(feature = "dev")]
    shopstats::fetch::debug::withdraw();

    Ok(())
}
