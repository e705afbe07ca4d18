use crate::query::{Record, TextAndMarkup};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Value of one `get` field: plain text, or text with markup under `include_html`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    TextAndMarkup(TextAndMarkup),
}

impl FieldValue {
    /// The text part of the value
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::TextAndMarkup(value) => &value.text,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<TextAndMarkup> for FieldValue {
    fn from(value: TextAndMarkup) -> Self {
        Self::TextAndMarkup(value)
    }
}

impl PartialEq<str> for FieldValue {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::Text(text) if text == other)
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Result of one `collect` entry.
///
/// Variant order matters when reading JSON back: `{text, html}` entries are
/// tried before generic records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Collected {
    /// One value per matched element
    Values(Vec<String>),
    /// One text and markup pair per matched element, under `include_html`
    TextAndMarkup(Vec<TextAndMarkup>),
    /// One record per anchor element
    Records(Vec<Record>),
}

impl Collected {
    pub fn len(&self) -> usize {
        match self {
            Self::Values(values) => values.len(),
            Self::TextAndMarkup(values) => values.len(),
            Self::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extracted field values, keyed by request field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedData {
    pub get: IndexMap<String, FieldValue>,
    pub collect: IndexMap<String, Collected>,
}

/// Everything an extraction pass produced for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub data: ExtractedData,
    /// Field-level failures, keyed `get.<name>`, `collect.<name>` or `collect.<name>.<field>`
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub errors: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_html: Option<String>,
}

/// Response to a scrape request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractedData>,

    /// Seconds from session start to the end of extraction
    pub load_time: f64,

    /// RFC 3339 completion time
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub errors: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    /// Server of the proxy the page was loaded through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_used: Option<String>,
}

impl ScrapeResponse {
    /// A successful response; field-level failures travel in `errors`
    pub fn completed(url: impl Into<String>, extraction: Extraction, elapsed: Duration) -> Self {
        Self {
            success: true,
            url: url.into(),
            data: Some(extraction.data),
            load_time: elapsed.as_secs_f64(),
            timestamp: now(),
            error: None,
            errors: extraction.errors,
            debug_html: extraction.debug_html,
            links: extraction.links,
            images: extraction.images,
            proxy_used: None,
        }
    }

    /// A session failure: no field data at all
    pub fn failed(url: impl Into<String>, error: impl ToString, elapsed: Duration) -> Self {
        Self {
            success: false,
            url: url.into(),
            data: None,
            load_time: elapsed.as_secs_f64(),
            timestamp: now(),
            error: Some(error.to_string()),
            errors: IndexMap::new(),
            debug_html: None,
            links: None,
            images: None,
            proxy_used: None,
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
