use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::ChartConfig;
use crate::plotting::geometry::{build_smooth_path, scale_to_pixels, ChartScale, Point, SmoothPath, Tick};
use crate::types::{AnalyticsPayload, DayRecord, Tooltip};
use crate::utils::{category_totals, downsample, select_active_series};

/// State behind one time-series chart.
///
/// Holds the source payload and the user's category selection; the sampled
/// series, active categories and scale are derived from those and rebuilt
/// whenever either changes. Hover is a separate, cheap piece of state.
#[derive(Debug, Clone)]
pub struct ChartView {
    payload: AnalyticsPayload,
    selection: Option<Vec<String>>,
    config: ChartConfig,
    hover: Option<usize>,

    sampled: Vec<DayRecord>,
    active: Vec<String>,
    scale: ChartScale,
}

impl ChartView {
    pub fn new(payload: AnalyticsPayload, config: &ChartConfig) -> Self {
        let mut view = Self {
            payload,
            selection: None,
            config: config.clone(),
            hover: None,
            sampled: Vec::new(),
            active: Vec::new(),
            scale: ChartScale::new(
                0.0,
                config.width as f64,
                config.height as f64,
                config.padding as f64,
                config.headroom,
            ),
        };
        view.recompute();
        view
    }

    /// Replace the source data. Hover is cleared.
    pub fn set_payload(&mut self, payload: AnalyticsPayload) {
        self.payload = payload;
        self.hover = None;
        self.recompute();
    }

    /// Restrict the chart to the given categories (`None` shows all).
    pub fn select_categories(&mut self, selection: Option<Vec<String>>) {
        self.selection = selection;
        self.hover = None;
        self.recompute();
    }

    fn candidates(&self) -> Vec<String> {
        match &self.selection {
            Some(selected) => selected.clone(),
            None => self.payload.categories(),
        }
    }

    fn recompute(&mut self) {
        let candidates = self.candidates();
        self.sampled = downsample(&self.payload.days, self.config.max_points);

        let totals = category_totals(&self.sampled, &candidates);
        self.active = select_active_series(&candidates, &totals, self.config.fallback_series);

        let data_max = self
            .sampled
            .iter()
            .flat_map(|day| self.active.iter().map(move |c| day.value(c)))
            .fold(0.0_f64, f64::max);

        self.scale = ChartScale::new(
            data_max,
            self.config.width as f64,
            self.config.height as f64,
            self.config.padding as f64,
            self.config.headroom,
        );

        tracing::debug!(
            days = self.payload.days.len(),
            sampled = self.sampled.len(),
            active = ?self.active,
            "chart recomputed"
        );
    }

    pub fn payload(&self) -> &AnalyticsPayload {
        &self.payload
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn sampled(&self) -> &[DayRecord] {
        &self.sampled
    }

    pub fn active_series(&self) -> &[String] {
        &self.active
    }

    pub fn scale(&self) -> &ChartScale {
        &self.scale
    }

    pub fn ticks(&self) -> Vec<Tick> {
        self.scale.ticks()
    }

    /// Pixel points of one category across the sampled series.
    pub fn points(&self, category: &str) -> Vec<Point> {
        let values: Vec<f64> = self.sampled.iter().map(|d| d.value(category)).collect();
        scale_to_pixels(&values, &self.scale)
    }

    /// Smoothed path per active category, in legend order.
    pub fn paths(&self) -> Vec<(String, SmoothPath)> {
        self.active
            .iter()
            .map(|c| (c.clone(), build_smooth_path(&self.points(c))))
            .collect()
    }

    /// Labels for the first and last sampled day with their x positions.
    pub fn x_labels(&self) -> Vec<(f64, String)> {
        let n = self.sampled.len();
        match (self.sampled.first(), self.sampled.last()) {
            (Some(first), Some(last)) if n > 1 => vec![
                (self.scale.x(0, n), first.label()),
                (self.scale.x(n - 1, n), last.label()),
            ],
            (Some(only), _) => vec![(self.scale.x(0, n), only.label())],
            _ => Vec::new(),
        }
    }

    /// Tooltip for the sampled point at `index`.
    ///
    /// Only nonzero values of active categories are listed.
    pub fn hit_test(&self, index: usize) -> Option<Tooltip> {
        let day = self.sampled.get(index)?;
        let breakdown: Vec<(String, f64)> = self
            .active
            .iter()
            .map(|c| (c.clone(), day.value(c)))
            .filter(|(_, v)| *v != 0.0)
            .collect();
        let total = breakdown.iter().map(|(_, v)| v).sum();

        Some(Tooltip {
            index,
            day: day.day.clone(),
            breakdown,
            total,
        })
    }

    /// Sampled index under a pointer at horizontal pixel `x`.
    pub fn index_at(&self, x: f64) -> Option<usize> {
        self.scale.index_at(x, self.sampled.len())
    }

    pub fn hover(&self) -> Option<usize> {
        self.hover
    }

    /// Set the hovered index; out-of-range indices clear the hover.
    pub fn set_hover(&mut self, index: Option<usize>) {
        self.hover = index.filter(|i| *i < self.sampled.len());
    }

    /// Move the hover to the point nearest `x` and return its tooltip.
    pub fn hover_at_x(&mut self, x: f64) -> Option<Tooltip> {
        self.set_hover(self.index_at(x));
        self.hover.and_then(|i| self.hit_test(i))
    }

    /// Hash of everything that affects the rendered chart.
    pub fn render_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for day in &self.sampled {
            day.day.hash(&mut hasher);
            for category in &self.active {
                day.value(category).to_bits().hash(&mut hasher);
            }
        }
        self.active.hash(&mut hasher);
        self.hover.hash(&mut hasher);
        self.config.width.hash(&mut hasher);
        self.config.height.hash(&mut hasher);
        self.config.padding.hash(&mut hasher);
        self.scale.max.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> ChartConfig {
        ChartConfig {
            max_points: 90,
            width: 400,
            height: 200,
            padding: 20,
            headroom: 1.15,
            fallback_series: 2,
        }
    }

    fn payload() -> AnalyticsPayload {
        AnalyticsPayload::from_value(&json!({
            "totals": { "US": 9, "DE": 3, "FR": 0 },
            "days": [
                { "day": "2024-05-01", "US": 2, "DE": 1 },
                { "day": "2024-05-02", "US": 3, "DE": 0 },
                { "day": "2024-05-03", "US": 4, "DE": 2, "FR": 0 }
            ]
        }))
    }

    fn long_payload(days: usize) -> AnalyticsPayload {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        AnalyticsPayload {
            totals: Default::default(),
            days: (0..days)
                .map(|i| {
                    let day = start + chrono::Duration::days(i as i64);
                    DayRecord::new(day.format("%Y-%m-%d").to_string(), [("US", i as f64)])
                })
                .collect(),
        }
    }

    #[test]
    fn test_active_series_excludes_zero_categories() {
        let view = ChartView::new(payload(), &config());
        assert_eq!(view.active_series(), ["DE".to_string(), "US".to_string()]);
        // max 4 with 1.15 headroom
        assert!((view.scale().max - 4.6).abs() < 1e-9);
    }

    #[test]
    fn test_selection_recomputes() {
        let mut view = ChartView::new(payload(), &config());
        view.select_categories(Some(vec!["US".to_string()]));
        assert_eq!(view.active_series(), ["US".to_string()]);

        view.select_categories(Some(vec!["FR".to_string(), "XX".to_string(), "YY".to_string()]));
        // nothing positive: fall back to the first two candidates
        assert_eq!(view.active_series(), ["FR".to_string(), "XX".to_string()]);
        assert!((view.scale().max - 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_long_series_is_downsampled() {
        let view = ChartView::new(long_payload(200), &config());
        assert_eq!(view.sampled().len(), 68);
        assert_eq!(view.sampled()[0].day, "2024-01-01");
        assert_eq!(view.sampled()[67].day, "2024-07-18");
        assert_eq!(view.points("US").len(), 68);
    }

    #[test]
    fn test_hit_test_breakdown() {
        let view = ChartView::new(payload(), &config());

        let tip = view.hit_test(1).unwrap();
        assert_eq!(tip.day, "2024-05-02");
        assert_eq!(tip.breakdown, vec![("US".to_string(), 3.0)]);
        assert_eq!(tip.total, 3.0);

        let tip = view.hit_test(2).unwrap();
        assert_eq!(
            tip.breakdown,
            vec![("DE".to_string(), 2.0), ("US".to_string(), 4.0)]
        );
        assert_eq!(tip.total, 6.0);

        assert!(view.hit_test(3).is_none());
    }

    #[test]
    fn test_hover_from_pointer() {
        let mut view = ChartView::new(payload(), &config());
        // three points at x = 20, 200, 380
        let tip = view.hover_at_x(370.0).unwrap();
        assert_eq!(tip.index, 2);
        assert_eq!(view.hover(), Some(2));

        view.set_hover(Some(10));
        assert_eq!(view.hover(), None);

        view.set_hover(Some(0));
        view.set_payload(payload());
        assert_eq!(view.hover(), None);
    }

    #[test]
    fn test_paths_and_labels() {
        let view = ChartView::new(payload(), &config());
        let paths = view.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].0, "DE");
        assert_eq!(paths[0].1.commands().len(), 5);

        let labels = view.x_labels();
        assert_eq!(labels, vec![(20.0, "May 01".to_string()), (380.0, "May 03".to_string())]);
    }

    #[test]
    fn test_empty_payload_degrades() {
        let view = ChartView::new(AnalyticsPayload::default(), &config());
        assert!(view.sampled().is_empty());
        assert!(view.active_series().is_empty());
        assert!(view.x_labels().is_empty());
        assert!(view.hit_test(0).is_none());
        assert_eq!(view.ticks().len(), 5);
    }

    #[test]
    fn test_render_hash_tracks_hover() {
        let mut view = ChartView::new(payload(), &config());
        let before = view.render_hash();
        assert_eq!(before, view.clone().render_hash());
        view.set_hover(Some(1));
        assert_ne!(before, view.render_hash());
    }
}
