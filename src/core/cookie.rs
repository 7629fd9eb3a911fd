use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::core::ExpiryView;

pub const UNKNOWN_CATEGORY: &str = "unknown";

/// One detected cookie, its compliance category and where it was observed.
///
/// Keys follow the scan engine's report format so saved reports decode
/// without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CookieFinding {
    pub name: String,
    pub path: String,
    pub domain: String,
    /// Offsets with a seconds component encode as UTC; years outside
    /// 0..=9999 cannot be encoded.
    #[serde(with = "crate::core::timestamp::option")]
    pub expires: Option<OffsetDateTime>,
    pub max_age: i64,
    pub expiry: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: String,
    pub used_requests: u64,
    #[serde(deserialize_with = "category_or_unknown")]
    pub category: String,
    pub description: String,

    #[serde(rename = "URL")]
    pub url: String,
    pub remote_addr: String,
    pub status: u16,
    pub mime_type: String,
    pub initiator: String,
    pub source: String,
    pub line_no: u32,
}

impl Default for CookieFinding {
    fn default() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            domain: String::new(),
            expires: None,
            max_age: 0,
            expiry: String::new(),
            secure: false,
            http_only: false,
            same_site: String::new(),
            used_requests: 0,
            category: UNKNOWN_CATEGORY.to_string(),
            description: String::new(),
            url: String::new(),
            remote_addr: String::new(),
            status: 0,
            mime_type: String::new(),
            initiator: String::new(),
            source: String::new(),
            line_no: 0,
        }
    }
}

impl CookieFinding {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            path: "/".to_string(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = if category.trim().is_empty() {
            UNKNOWN_CATEGORY.to_string()
        } else {
            category
        };
        self
    }

    /// Picks the authoritative expiry representation.
    ///
    /// Precedence: a real `expires` timestamp, then a non-zero `max_age`,
    /// then the free-text `expiry`. A record with none of them is a session
    /// cookie. Timestamps in year 1 are the scan engine's "unset" marker.
    pub fn expiry_view(&self) -> ExpiryView<'_> {
        if let Some(at) = self.expires {
            if at.year() > 1 {
                return ExpiryView::At(at);
            }
        }
        if self.max_age != 0 {
            return ExpiryView::MaxAge(self.max_age);
        }
        let text = self.expiry.trim();
        if !text.is_empty() {
            return ExpiryView::Text(text);
        }
        ExpiryView::Session
    }

    /// `source:line` when the cookie was set from script text, else the bare source.
    pub fn origin(&self) -> String {
        if self.line_no > 0 && !self.source.is_empty() {
            format!("{}:{}", self.source, self.line_no)
        } else {
            self.source.clone()
        }
    }
}

fn category_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let category = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    if category.trim().is_empty() {
        Ok(UNKNOWN_CATEGORY.to_string())
    } else {
        Ok(category)
    }
}
