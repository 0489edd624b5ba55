//! Chart geometry and SVG rendering.

pub mod chart;
pub mod geometry;
pub mod styles;


pub use chart::{render_svg, PlotCache, PlotError};
pub use geometry::{build_smooth_path, scale_to_pixels, ChartScale, PathCommand, Point, SmoothPath, Tick};
pub use styles::{ChartStyle, ChartTheme};
