use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use shopstats::config::CacheConfig;
use shopstats::fetch::{FetchRequest, HttpTransport, ReqwestTransport};
use shopstats::plotting::{render_svg, ChartStyle, ChartTheme};
use shopstats::{AnalyticsPayload, ChartView, Config, DedupFetcher, FetchError, FetchOptions, Method};

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

impl Hits {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn analytics_body() -> Value {
    json!({
        "totals": { "US": 12, "DE": 4, "FR": 0 },
        "days": [
            { "day": "2024-05-01", "US": 5, "DE": 1, "FR": 0 },
            { "day": "2024-05-02", "US": 3, "DE": 0, "FR": 0 },
            { "day": "2024-05-03", "US": 4, "DE": 3, "FR": 0 }
        ]
    })
}

async fn analytics(State(hits): State<Hits>) -> Json<Value> {
    hits.0.fetch_add(1, Ordering::SeqCst);
    // Slow enough that concurrent callers overlap
    tokio::time::sleep(Duration::from_millis(50)).await;
    Json(analytics_body())
}

async fn broken(State(hits): State<Hits>) -> (StatusCode, &'static str) {
    hits.0.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn garbage() -> &'static str {
    "{not json"
}

async fn spawn_server() -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/analytics", get(analytics))
        .route("/broken", get(broken))
        .route("/garbage", get(garbage))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

fn fetcher() -> DedupFetcher {
    DedupFetcher::from_config(&CacheConfig::default()).unwrap()
}

#[tokio::test]
async fn test_transport_round_trip() {
    let (base, hits) = spawn_server().await;
    let transport = ReqwestTransport::new(&CacheConfig::default()).unwrap();

    let value = transport
        .send(FetchRequest {
            method: Method::Get,
            url: format!("{}/analytics", base),
            body: None,
        })
        .await
        .unwrap();

    assert_eq!(value, analytics_body());
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_request() {
    let (base, hits) = spawn_server().await;
    let fetcher = fetcher();
    let url = format!("{}/analytics", base);

    let results = futures::future::join_all(
        (0..5).map(|_| fetcher.fetch(&url, FetchOptions::default())),
    )
    .await;

    assert_eq!(hits.count(), 1);
    for result in results {
        assert_eq!(result.unwrap(), analytics_body());
    }

    // Settled: served from the cache
    fetcher.fetch(&url, FetchOptions::default()).await.unwrap();
    assert_eq!(hits.count(), 1);
    assert_eq!(fetcher.cache_stats().cache_size, 1);
    assert_eq!(fetcher.cache_stats().pending_requests, 0);
}

#[tokio::test]
async fn test_error_status_is_not_cached() {
    let (base, hits) = spawn_server().await;
    let fetcher = fetcher();
    let url = format!("{}/broken", base);

    let err = fetcher.fetch(&url, FetchOptions::default()).await.unwrap_err();
    assert_eq!(err, FetchError::Status { status: 500, url: url.clone() });

    fetcher.fetch(&url, FetchOptions::default()).await.unwrap_err();
    assert_eq!(hits.count(), 2);
    assert_eq!(fetcher.cache_stats().cache_size, 0);
}

#[tokio::test]
async fn test_malformed_json() {
    let (base, _hits) = spawn_server().await;
    let fetcher = fetcher();

    let err = fetcher
        .fetch(&format!("{}/garbage", base), FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Json { .. }));
}

#[tokio::test]
async fn test_unreachable_host() {
    let fetcher = fetcher();
    // Port 9 on loopback is discard; nothing listens there in CI
    let err = fetcher
        .fetch("http://127.0.0.1:9/analytics", FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network { .. } | FetchError::Timeout { .. }));
}

#[tokio::test]
async fn test_preload_then_chart() {
    let (base, hits) = spawn_server().await;
    let fetcher = fetcher();
    let url = format!("{}/analytics", base);

    fetcher.preload([url.clone()]).unwrap().await.unwrap();
    assert_eq!(hits.count(), 1);

    let json = fetcher.fetch(&url, FetchOptions::default()).await.unwrap();
    assert_eq!(hits.count(), 1);

    let config = Config::default();
    let mut view = ChartView::new(AnalyticsPayload::from_value(&json), &config.chart);
    assert_eq!(view.active_series(), ["DE".to_string(), "US".to_string()]);

    view.set_hover(Some(2));
    let tip = view.hit_test(2).unwrap();
    assert_eq!(tip.total, 7.0);

    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("chart.svg");
    let svg = render_svg(&view, &ChartTheme::default(), &ChartStyle::default()).unwrap();
    std::fs::write(&out, &svg).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("<svg"));
    assert!(written.contains("May 03"));
}
