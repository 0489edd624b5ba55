use lru::LruCache;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::geometry::Point;
use super::styles::{ChartStyle, ChartTheme};
use crate::app::ChartView;
use crate::fetch::{Clock, SystemClock};

pub type PlotError = Box<dyn Error + Send + Sync>;

/// Rendered charts are reused for 5 minutes
const PLOT_TTL: Duration = Duration::from_secs(300);

fn to_px(p: &Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

/// Render the chart to an SVG document.
pub fn render_svg(view: &ChartView, theme: &ChartTheme, style: &ChartStyle) -> Result<String, PlotError> {
    let config = view.config();
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (config.width, config.height)).into_drawing_area();
        draw_chart(view, theme, style, &root)?;
        root.present()?;
    }
    Ok(svg)
}

fn draw_chart(
    view: &ChartView,
    theme: &ChartTheme,
    style: &ChartStyle,
    root: &DrawingArea<SVGBackend<'_>, Shift>,
) -> Result<(), PlotError> {
    root.fill(&theme.background_color)?;

    let scale = view.scale();
    let left = scale.padding.round() as i32;
    let right = (scale.width - scale.padding).round() as i32;
    let bottom = (scale.height - scale.padding).round() as i32;
    let label_font = ("sans-serif", style.font_size).into_font();

    // Horizontal grid at each tick, labels right-aligned in the left margin
    for tick in view.ticks() {
        let y = tick.y.round() as i32;
        root.draw(&PathElement::new(
            vec![(left, y), (right, y)],
            theme.grid_color.stroke_width(1),
        ))?;
        root.draw(&Text::new(
            tick.label,
            (left - 6, y),
            label_font
                .clone()
                .color(&theme.text_color)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        ))?;
    }

    // Baseline axis
    root.draw(&PathElement::new(
        vec![(left, bottom), (right, bottom)],
        theme.axis_color.stroke_width(1),
    ))?;

    for (x, label) in view.x_labels() {
        root.draw(&Text::new(
            label,
            (x.round() as i32, bottom + 6),
            label_font
                .clone()
                .color(&theme.text_color)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }

    for (i, (category, path)) in view.paths().iter().enumerate() {
        let color = theme.series_color(i);
        let points: Vec<(i32, i32)> = path.flatten(style.curve_steps).iter().map(to_px).collect();

        match points.as_slice() {
            [] => {}
            [only] => {
                root.draw(&Circle::new(*only, style.marker_radius, color.filled()))?;
            }
            _ => {
                root.draw(&PathElement::new(points, color.stroke_width(style.line_width)))?;
            }
        }

        // Legend along the top edge
        let legend_x = left + i as i32 * 90;
        let legend_y = (scale.padding / 2.0).round() as i32;
        root.draw(&Rectangle::new(
            [(legend_x, legend_y - 4), (legend_x + 10, legend_y + 4)],
            color.filled(),
        ))?;
        root.draw(&Text::new(
            category.clone(),
            (legend_x + 14, legend_y),
            label_font
                .clone()
                .color(&theme.text_color)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }

    if let Some(index) = view.hover() {
        let n = view.sampled().len();
        let x = scale.x(index, n).round() as i32;
        root.draw(&PathElement::new(
            vec![(x, scale.padding.round() as i32), (x, bottom)],
            theme.hover_color.stroke_width(1),
        ))?;
        for (i, category) in view.active_series().iter().enumerate() {
            let value = view.sampled().get(index).map(|d| d.value(category)).unwrap_or(0.0);
            let marker = (x, scale.y(value).round() as i32);
            root.draw(&Circle::new(
                marker,
                style.marker_radius,
                theme.series_color(i).filled(),
            ))?;
        }
    }

    Ok(())
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct PlotCacheKey {
    data_hash: u64,
    theme_hash: u64,
}

impl PlotCacheKey {
    fn new(view: &ChartView, theme: &ChartTheme, style: &ChartStyle) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        format!("{:?}{:?}", theme, style).hash(&mut hasher);

        Self {
            data_hash: view.render_hash(),
            theme_hash: hasher.finish(),
        }
    }
}

/// Least-recently-used memo of rendered charts.
///
/// Moving the pointer back and forth re-renders the same handful of hover
/// states; those come out of here instead.
pub struct PlotCache {
    entries: LruCache<PlotCacheKey, (String, Instant)>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    renders: u64,
}

impl PlotCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_ttl(capacity, PLOT_TTL)
    }

    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
            clock,
            renders: 0,
        }
    }

    /// Rendered SVG for the view, from the cache when still fresh.
    pub fn render(
        &mut self,
        view: &ChartView,
        theme: &ChartTheme,
        style: &ChartStyle,
    ) -> Result<String, PlotError> {
        let key = PlotCacheKey::new(view, theme, style);
        let now = self.clock.now();

        if let Some((svg, rendered_at)) = self.entries.get(&key) {
            if now.duration_since(*rendered_at) < self.ttl {
                return Ok(svg.clone());
            }
        }

        let svg = render_svg(view, theme, style)?;
        self.renders += 1;
        self.entries.put(key, (svg.clone(), now));
        Ok(svg)
    }

    /// Number of renders that missed the cache.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlotCache {
    fn default() -> Self {
        // Cache up to 10 plots
        Self::new(10)
    }
}
