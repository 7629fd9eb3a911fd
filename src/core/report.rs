use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::FindingGroup;

/// Snapshot of one scan. Immutable once handed to a [`crate::task::Task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    /// Same encoding rules as [`CookieFinding::expires`](crate::core::CookieFinding::expires).
    #[serde(with = "crate::core::timestamp")]
    pub scan_time: OffsetDateTime,
    #[serde(rename = "ScanURL", default)]
    pub scan_url: String,
    /// Set once when the report is finalized; renderers never recompute it.
    #[serde(default)]
    pub cookie_count: u64,
    /// Base64 encoded PNG.
    #[serde(rename = "ScreenShotImage", default)]
    pub screenshot_image: Option<String>,
    /// The scan engine writes an empty list as `null`.
    #[serde(default, deserialize_with = "crate::core::group::null_as_empty")]
    pub records: Vec<FindingGroup>,
}

impl Report {
    pub fn new(scan_time: OffsetDateTime, scan_url: impl Into<String>, records: Vec<FindingGroup>) -> Self {
        let cookie_count = records.iter().map(|g| g.cookies.len() as u64).sum();
        Self {
            scan_time,
            scan_url: scan_url.into(),
            cookie_count,
            screenshot_image: None,
            records,
        }
    }

    pub fn with_screenshot(mut self, png_base64: impl Into<String>) -> Self {
        self.screenshot_image = Some(png_base64.into());
        self
    }

    pub fn group(&self, category: &str) -> Option<&FindingGroup> {
        self.records.iter().find(|g| g.category == category)
    }

    pub fn has_screenshot(&self) -> bool {
        self.screenshot_image
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CookieFinding;
    use time::macros::datetime;

    #[test]
    fn new_counts_cookies_across_groups() {
        let report = Report::new(
            datetime!(2024-05-01 12:00 UTC),
            "https://example.com",
            vec![
                FindingGroup::new("necessary", "")
                    .with_cookie(CookieFinding::new("sid", "example.com"))
                    .with_cookie(CookieFinding::new("csrf", "example.com")),
                FindingGroup::new("analytics", "").with_cookie(CookieFinding::new("_ga", "example.com")),
            ],
        );
        assert_eq!(report.cookie_count, 3);
        assert_eq!(report.group("analytics").map(|g| g.cookies.len()), Some(1));
        assert!(report.group("marketing").is_none());
    }

    #[test]
    fn blank_screenshot_is_not_embedded() {
        let report = Report::new(datetime!(2024-05-01 12:00 UTC), "https://example.com", vec![]);
        assert!(!report.has_screenshot());
        assert!(!report.clone().with_screenshot("  ").has_screenshot());
        assert!(report.with_screenshot("iVBORw0KGgo=").has_screenshot());
    }
}
