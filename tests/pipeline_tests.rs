use std::fs;

use chrono::{Duration, NaiveDate};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use shopstats::plotting::{render_svg, ChartStyle, ChartTheme, PathCommand, PlotCache};
use shopstats::utils::CounterAnimation;
use shopstats::{AnalyticsPayload, ChartView, Config};

/// `days` consecutive records starting 2024-01-01 with US rising and DE flat.
fn payload_json(days: usize) -> Value {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let records: Vec<Value> = (0..days)
        .map(|i| {
            let mut record = Map::new();
            let day = start + Duration::days(i as i64);
            record.insert("day".into(), json!(day.format("%Y-%m-%d").to_string()));
            record.insert("US".into(), json!(i));
            record.insert("DE".into(), json!(10));
            record.insert("JP".into(), json!(0));
            Value::Object(record)
        })
        .collect();
    json!({ "totals": {}, "days": records })
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_config_drives_chart() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[chart]
max_points = 30
width = 600
height = 240
padding = 30
"#,
    );
    let config = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(config.chart.max_points, 30);
    assert_eq!(config.chart.headroom, 1.15);

    let view = ChartView::new(AnalyticsPayload::from_value(&payload_json(200)), &config.chart);
    // stride ceil(200 / 30) = 7 gives 29 samples, plus the forced last day
    assert_eq!(view.sampled().len(), 30);
    assert_eq!(view.sampled().last().unwrap().day, "2024-07-18");
    assert_eq!(view.active_series(), ["DE".to_string(), "US".to_string()]);

    let points = view.points("US");
    assert_eq!(points.first().unwrap().x, 30.0);
    assert_eq!(points.last().unwrap().x, 570.0);
    assert!(points.iter().all(|p| p.y >= 30.0 && p.y <= 210.0));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[chart]\nheadroom = 0.9\n");
    assert!(Config::load(Some(path.as_path())).is_err());

    let missing = dir.path().join("missing.toml");
    assert!(Config::load(Some(missing.as_path())).is_err());
}

#[test]
fn test_paths_are_smoothed() {
    let view = ChartView::new(
        AnalyticsPayload::from_value(&payload_json(10)),
        &Config::default().chart,
    );

    for (_, path) in view.paths() {
        let commands = path.commands();
        assert!(matches!(commands[0], PathCommand::MoveTo(_)));
        // two quadratic segments per gap
        assert_eq!(commands.len(), 1 + 2 * 9);
        assert!(path.to_svg_d().starts_with('M'));
    }
}

#[test]
fn test_hover_sweep_reuses_renders() {
    let mut view = ChartView::new(
        AnalyticsPayload::from_value(&payload_json(20)),
        &Config::default().chart,
    );
    let theme = ChartTheme::default();
    let style = ChartStyle::default();
    let mut cache = PlotCache::default();

    let mut renders = Vec::new();
    for x in [100.0, 400.0, 100.0, 400.0] {
        let tip = view.hover_at_x(x).unwrap();
        assert!(tip.total > 0.0);
        renders.push(cache.render(&view, &theme, &style).unwrap());
    }

    assert_eq!(cache.len(), 2);
    assert_eq!(renders[0], renders[2]);
    assert_ne!(renders[0], renders[1]);
    assert_eq!(
        renders[1],
        render_svg(&view, &theme, &style).unwrap()
    );
}

#[test]
fn test_total_counter_animation() {
    let counter = CounterAnimation::new(0.0, 1250.0, std::time::Duration::from_millis(800));
    assert_eq!(counter.display_at(std::time::Duration::ZERO), 0);
    assert!(!counter.is_finished(std::time::Duration::from_millis(400)));
    assert_eq!(counter.display_at(std::time::Duration::from_millis(800)), 1250);
}
