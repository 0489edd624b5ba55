pub mod aggregation;
pub mod animation;

pub use aggregation::{category_totals, downsample, select_active_series};
pub use animation::{ease_out_cubic, interpolate, CounterAnimation};
