use super::{PixelEvent, Tracker};
use crate::error::TrackerError;

/// Trimmed ids, rejecting an empty list and any id failing `valid`.
fn clean_ids(
    vendor: &'static str,
    ids: &[String],
    valid: impl Fn(&str) -> bool,
) -> Result<Vec<String>, TrackerError> {
    if ids.is_empty() {
        return Err(TrackerError::NoIds { vendor });
    }
    ids.iter()
        .map(|id| {
            let id = id.trim();
            if id.is_empty() || !valid(id) {
                Err(TrackerError::InvalidId {
                    vendor,
                    id: id.to_string(),
                })
            } else {
                Ok(id.to_string())
            }
        })
        .collect()
}

fn page_views(vendor: &'static str, ids: &[String], event: &str, path: &str) -> Vec<PixelEvent> {
    ids.iter()
        .map(|id| PixelEvent {
            vendor,
            id: id.clone(),
            event: event.to_string(),
            path: path.to_string(),
        })
        .collect()
}

/// Meta (Facebook) pixel. Ids are numeric.
#[derive(Debug, Default, Clone)]
pub struct MetaPixel {
    ids: Vec<String>,
}

impl Tracker for MetaPixel {
    fn vendor(&self) -> &'static str {
        "meta"
    }

    fn init(&mut self, ids: &[String]) -> Result<(), TrackerError> {
        self.ids = clean_ids(self.vendor(), ids, |id| id.chars().all(|c| c.is_ascii_digit()))?;
        Ok(())
    }

    fn track_page_view(&self, path: &str) -> Vec<PixelEvent> {
        page_views(self.vendor(), &self.ids, "PageView", path)
    }

    fn bootstrap_snippet(&self) -> String {
        let mut snippet = String::from(
            "<script async src=\"https://connect.facebook.net/en_US/fbevents.js\"></script>\n",
        );
        for id in &self.ids {
            snippet.push_str(&format!("<script>fbq('init', '{id}');</script>\n"));
        }
        snippet
    }
}

/// Google tag (gtag.js). Accepts measurement, ads and container ids.
#[derive(Debug, Default, Clone)]
pub struct GoogleTag {
    ids: Vec<String>,
}

const GOOGLE_PREFIXES: [&str; 4] = ["G-", "AW-", "GT-", "UA-"];

impl Tracker for GoogleTag {
    fn vendor(&self) -> &'static str {
        "google"
    }

    fn init(&mut self, ids: &[String]) -> Result<(), TrackerError> {
        self.ids = clean_ids(self.vendor(), ids, |id| {
            GOOGLE_PREFIXES.iter().any(|p| id.len() > p.len() && id.starts_with(p))
        })?;
        Ok(())
    }

    fn track_page_view(&self, path: &str) -> Vec<PixelEvent> {
        page_views(self.vendor(), &self.ids, "page_view", path)
    }

    fn bootstrap_snippet(&self) -> String {
        let Some(first) = self.ids.first() else {
            return String::new();
        };
        let mut snippet = format!(
            "<script async src=\"https://www.googletagmanager.com/gtag/js?id={first}\"></script>\n"
        );
        for id in &self.ids {
            snippet.push_str(&format!("<script>gtag('config', '{id}');</script>\n"));
        }
        snippet
    }
}

#[derive(Debug, Default, Clone)]
pub struct TikTokPixel {
    ids: Vec<String>,
}

impl Tracker for TikTokPixel {
    fn vendor(&self) -> &'static str {
        "tiktok"
    }

    fn init(&mut self, ids: &[String]) -> Result<(), TrackerError> {
        self.ids = clean_ids(self.vendor(), ids, |id| id.chars().all(|c| c.is_ascii_alphanumeric()))?;
        Ok(())
    }

    fn track_page_view(&self, path: &str) -> Vec<PixelEvent> {
        page_views(self.vendor(), &self.ids, "Pageview", path)
    }

    fn bootstrap_snippet(&self) -> String {
        self.ids
            .iter()
            .map(|id| {
                format!(
                    "<script src=\"https://analytics.tiktok.com/i18n/pixel/events.js?sdkid={id}\"></script>\n"
                )
            })
            .collect()
    }
}
