use std::collections::HashMap;

use crate::types::DayRecord;

/// Reduce a chronological series to roughly `max_points` points.
///
/// Series that already fit are returned unchanged. Longer ones keep every
/// `ceil(len / max_points)`-th element starting at the first, and the final
/// element is always appended, so the result holds at most `max_points + 1`
/// items. A `max_points` of 0 is treated as 1.
pub fn downsample<T: Clone>(series: &[T], max_points: usize) -> Vec<T> {
    let max_points = max_points.max(1);
    if series.len() <= max_points {
        return series.to_vec();
    }

    let stride = series.len().div_ceil(max_points);
    let mut sampled: Vec<T> = series.iter().step_by(stride).cloned().collect();

    let last = series.len() - 1;
    if last % stride != 0 {
        sampled.push(series[last].clone());
    }

    sampled
}

/// Sum each category over the series.
pub fn category_totals(series: &[DayRecord], categories: &[String]) -> HashMap<String, f64> {
    categories
        .iter()
        .map(|category| {
            let total = series.iter().map(|day| day.value(category)).sum();
            (category.clone(), total)
        })
        .collect()
}

/// Categories worth plotting: those with a strictly positive total, in the
/// order given. When none qualifies, the first `fallback` categories are
/// returned so the chart never ends up empty.
pub fn select_active_series(
    categories: &[String],
    totals: &HashMap<String, f64>,
    fallback: usize,
) -> Vec<String> {
    let active: Vec<String> = categories
        .iter()
        .filter(|c| totals.get(*c).copied().unwrap_or(0.0) > 0.0)
        .cloned()
        .collect();

    if active.is_empty() {
        categories.iter().take(fallback).cloned().collect()
    } else {
        active
    }
}
