use serde::{Deserialize, Deserializer, Serialize};

use crate::core::CookieFinding;

/// All findings for one compliance category, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FindingGroup {
    pub category: String,
    pub description: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub cookies: Vec<CookieFinding>,
}

impl FindingGroup {
    pub fn new(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: CookieFinding) -> Self {
        self.cookies.push(cookie);
        self
    }
}

/// Accepts `null` where a list is expected, as Go's encoder writes nil slices.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
