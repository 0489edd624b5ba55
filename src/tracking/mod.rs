//! Marketing pixel trackers.
//!
//! Each vendor sits behind [`Tracker`]; [`TrackerSet`] holds the ones named
//! in the `[tracking]` configuration table and fans page views out to them.

mod vendors;

pub use vendors::{GoogleTag, MetaPixel, TikTokPixel};

use serde::Serialize;

use crate::config::TrackingConfig;
use crate::error::TrackerError;

/// One event a tracker would emit for a page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PixelEvent {
    pub vendor: &'static str,
    pub id: String,
    pub event: String,
    pub path: String,
}

pub trait Tracker: Send + Sync {
    fn vendor(&self) -> &'static str;

    /// Validate and store the vendor ids. Until this succeeds the tracker
    /// emits nothing.
    fn init(&mut self, ids: &[String]) -> Result<(), TrackerError>;

    fn track_page_view(&self, path: &str) -> Vec<PixelEvent>;

    /// Markup that loads the vendor script for the configured ids.
    fn bootstrap_snippet(&self) -> String;
}

#[derive(Default)]
pub struct TrackerSet {
    trackers: Vec<Box<dyn Tracker>>,
}

impl TrackerSet {
    /// Build and initialize a tracker for every vendor with ids configured.
    pub fn from_config(config: &TrackingConfig) -> Result<Self, TrackerError> {
        let mut set = Self::default();
        let vendors: [(Box<dyn Tracker>, &[String]); 3] = [
            (Box::new(MetaPixel::default()), &config.meta),
            (Box::new(GoogleTag::default()), &config.google),
            (Box::new(TikTokPixel::default()), &config.tiktok),
        ];

        for (tracker, ids) in vendors {
            if !ids.is_empty() {
                set.register(tracker, ids)?;
            }
        }
        Ok(set)
    }

    pub fn register(&mut self, mut tracker: Box<dyn Tracker>, ids: &[String]) -> Result<(), TrackerError> {
        tracker.init(ids)?;
        tracing::debug!(vendor = tracker.vendor(), ids = ids.len(), "tracker initialized");
        self.trackers.push(tracker);
        Ok(())
    }

    pub fn vendors(&self) -> Vec<&'static str> {
        self.trackers.iter().map(|t| t.vendor()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn track_page_view(&self, path: &str) -> Vec<PixelEvent> {
        self.trackers
            .iter()
            .flat_map(|t| t.track_page_view(path))
            .collect()
    }

    pub fn bootstrap_snippet(&self) -> String {
        self.trackers.iter().map(|t| t.bootstrap_snippet()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_events_before_init() {
        let pixel = MetaPixel::default();
        assert!(pixel.track_page_view("/orders").is_empty());
        assert!(pixel.bootstrap_snippet().contains("fbevents.js"));
        assert!(!pixel.bootstrap_snippet().contains("fbq('init'"));
    }

    #[test]
    fn test_init_rejects_bad_ids() {
        let mut pixel = MetaPixel::default();
        assert_eq!(pixel.init(&[]), Err(TrackerError::NoIds { vendor: "meta" }));
        assert_eq!(
            pixel.init(&ids(&["  "])),
            Err(TrackerError::InvalidId {
                vendor: "meta",
                id: String::new()
            })
        );

        let mut tag = GoogleTag::default();
        assert!(tag.init(&ids(&["G-"])).is_err());
        assert!(tag.init(&ids(&["XYZ123"])).is_err());
        assert!(tag.init(&ids(&[" G-ABC123 "])).is_ok());

        let mut tiktok = TikTokPixel::default();
        assert!(tiktok.init(&ids(&["C4AB-12"])).is_err());
    }

    #[test]
    fn test_page_view_per_id() {
        let mut tag = GoogleTag::default();
        tag.init(&ids(&["G-ONE", "AW-TWO"])).unwrap();

        let events = tag.track_page_view("/dashboard");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "G-ONE");
        assert_eq!(events[1].event, "page_view");
        assert!(events.iter().all(|e| e.path == "/dashboard"));
        assert!(tag.bootstrap_snippet().contains("gtag/js?id=G-ONE"));
    }

    #[test]
    fn test_set_from_config() {
        let config = TrackingConfig {
            meta: ids(&["1234567890"]),
            google: Vec::new(),
            tiktok: ids(&["CABC123"]),
        };
        let set = TrackerSet::from_config(&config).unwrap();
        assert_eq!(set.vendors(), vec!["meta", "tiktok"]);

        let events = set.track_page_view("/");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "PageView");
        assert_eq!(events[1].vendor, "tiktok");

        let snippet = set.bootstrap_snippet();
        assert!(snippet.contains("fbq('init', '1234567890')"));
        assert!(snippet.contains("sdkid=CABC123"));
    }

    #[test]
    fn test_set_from_config_fails_on_bad_id() {
        let config = TrackingConfig {
            meta: ids(&["not-a-number"]),
            ..Default::default()
        };
        assert!(matches!(
            TrackerSet::from_config(&config),
            Err(TrackerError::InvalidId { vendor: "meta", .. })
        ));
        assert!(TrackerSet::from_config(&TrackingConfig::default()).unwrap().is_empty());
    }
}
