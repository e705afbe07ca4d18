//! Request grammar
//!
//! ```json
//! {
//!   "url": "https://books.toscrape.com",
//!   "get": {
//!     "title": "h1",
//!     "first_link": "a.test<.product_pod(href)",
//!     "banner": { "selector": "img.banner", "attr": "src" }
//!   },
//!   "collect": {
//!     "prices": { "selector": "p.price_color" },
//!     "books": {
//!       "selector": "article.product_pod",
//!       "fields": { "title": "h3 a(title)", "shelf": ">> >> h1" }
//!     }
//!   }
//! }
//! ```

use crate::error::Result;
use crate::query::{CollectOptions, FieldQuery, FieldRecipe, Navigation, ReadMode, SelectorSpec};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A document-level field: a notation string or an object form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum GetField {
    /// `selector`, `selector(attr)` or a navigation chain
    Notation(String),

    /// Explicit selector with optional attribute or markup read
    Selector {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attr: Option<String>,
        /// Return the element's outer HTML instead of its text
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        html: bool,
    },
}

impl GetField {
    /// Compile into an executable query
    pub fn compile(&self) -> Result<FieldQuery> {
        match self {
            Self::Notation(raw) => FieldQuery::parse(raw),
            Self::Selector { selector, attr, html } => {
                let mut spec = SelectorSpec::parse(selector)?;
                if let Some(attr) = attr.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
                    spec.attribute = Some(attr.to_string());
                }
                let query = FieldQuery::from_spec(spec)?;
                Ok(if *html { query.with_read(ReadMode::Markup) } else { query })
            }
        }
    }
}

impl From<&str> for GetField {
    fn from(raw: &str) -> Self {
        Self::Notation(raw.to_string())
    }
}

/// A record field recipe: a notation string or `{selector, attr}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RecipeSource {
    Notation(String),
    Selector {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attr: Option<String>,
    },
}

impl RecipeSource {
    pub fn compile(&self) -> Result<FieldRecipe> {
        match self {
            Self::Notation(raw) => FieldRecipe::parse(raw),
            Self::Selector { selector, attr } => FieldRecipe::from_parts(selector, attr.as_deref()),
        }
    }
}

impl From<&str> for RecipeSource {
    fn from(raw: &str) -> Self {
        Self::Notation(raw.to_string())
    }
}

/// A collection: every element matched by `selector`, as values or records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CollectField {
    /// Anchor selector; may carry `(attr)` and navigation when `fields` is absent
    pub selector: String,

    /// Per-record field recipes; without them each match yields one value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IndexMap<String, RecipeSource>>,

    /// Field whose last non-empty value fills later empty ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky: Option<String>,

    /// Drop all-empty records; defaults to the service configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_empty: Option<bool>,
}

impl CollectField {
    pub fn new(selector: impl Into<String>) -> Self {
        Self { selector: selector.into(), fields: None, sticky: None, drop_empty: None }
    }

    /// Builder method: add a record field
    pub fn with_field(mut self, name: impl Into<String>, recipe: impl Into<RecipeSource>) -> Self {
        self.fields.get_or_insert_with(IndexMap::new).insert(name.into(), recipe.into());
        self
    }

    /// Builder method: set the sticky marker field
    pub fn with_sticky(mut self, field: impl Into<String>) -> Self {
        self.sticky = Some(field.into());
        self
    }

    /// Options for this collection, falling back to `drop_empty_default`
    pub fn options(&self, drop_empty_default: bool) -> CollectOptions {
        CollectOptions {
            sticky_field: self.sticky.clone(),
            drop_empty_records: self.drop_empty.unwrap_or(drop_empty_default),
        }
    }

    /// Navigation to the anchor elements of a record collection
    pub fn anchors(&self) -> Result<Navigation> {
        let spec = SelectorSpec::parse(&self.selector)?;
        Ok(FieldQuery::from_spec(spec)?.navigation)
    }
}

/// What to extract from a loaded document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionRequest {
    /// Single values: field name to notation
    #[serde(default)]
    pub get: IndexMap<String, GetField>,

    /// Collections: field name to collection spec
    #[serde(default)]
    pub collect: IndexMap<String, CollectField>,

    /// Return `{text, html}` for text `get` fields and value collections
    #[serde(default)]
    pub include_html: bool,

    /// Include every `a[href]` value in the response
    #[serde(default)]
    pub extract_links: bool,

    /// Include every `img[src]` value in the response
    #[serde(default)]
    pub extract_images: bool,

    /// Include the document markup in the response
    #[serde(default)]
    pub debug: bool,
}

impl ExtractionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a single-value field
    pub fn get(mut self, name: impl Into<String>, field: impl Into<GetField>) -> Self {
        self.get.insert(name.into(), field.into());
        self
    }

    /// Builder method: add a collection
    pub fn collect(mut self, name: impl Into<String>, field: CollectField) -> Self {
        self.collect.insert(name.into(), field);
        self
    }

    /// Whether nothing at all was requested
    pub fn is_empty(&self) -> bool {
        self.get.is_empty() && self.collect.is_empty() && !self.extract_links && !self.extract_images && !self.debug
    }
}

/// A full scrape: page loading options plus the extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScrapeRequest {
    /// Page to load
    pub url: String,

    /// Route through the configured proxy pool (default: true)
    #[serde(default = "default_true")]
    pub use_proxy: bool,

    /// Pin a proxy (`scheme://host:port[:user:pass]`) instead of using the pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    /// Seconds to wait after navigation (default: 3)
    #[serde(default = "default_wait_time")]
    pub wait_time: u64,

    /// Selector to wait for before extracting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<String>,

    /// Seconds to wait for `wait_for`; the session default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_timeout: Option<u64>,

    #[serde(flatten)]
    pub extraction: ExtractionRequest,
}

fn default_true() -> bool {
    true
}

fn default_wait_time() -> u64 {
    3
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            use_proxy: true,
            proxy_url: None,
            wait_time: default_wait_time(),
            wait_for: None,
            element_timeout: None,
            extraction: ExtractionRequest::default(),
        }
    }

    /// Builder method: set the extraction
    pub fn with_extraction(mut self, extraction: ExtractionRequest) -> Self {
        self.extraction = extraction;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: ScrapeRequest = serde_json::from_value(json!({ "url": "https://example.com" })).unwrap();
        assert!(request.use_proxy);
        assert_eq!(request.wait_time, 3);
        assert_eq!(request.element_timeout, None);
        assert!(request.extraction.is_empty());
        assert!(!request.extraction.include_html);
    }

    #[test]
    fn test_output_flags() {
        let request: ScrapeRequest = serde_json::from_value(json!({
            "url": "https://example.com",
            "include_html": true,
            "extract_images": true
        }))
        .unwrap();
        assert!(request.extraction.include_html);
        assert!(request.extraction.extract_images);
        assert!(!request.extraction.is_empty());
    }

    #[test]
    fn test_request_grammar() {
        let request: ScrapeRequest = serde_json::from_value(json!({
            "url": "https://example.com",
            "wait_for": ".loaded",
            "get": {
                "title": "h1",
                "banner": { "selector": "img.banner", "attr": "src" },
                "body": { "selector": "main", "html": true }
            },
            "collect": {
                "prices": { "selector": "p.price" },
                "rows": {
                    "selector": "tr",
                    "fields": { "cat": "td.cat", "link": { "selector": "a", "attr": "href" } },
                    "sticky": "cat",
                    "drop_empty": true
                }
            }
        }))
        .unwrap();

        assert_eq!(request.wait_for.as_deref(), Some(".loaded"));
        let get = &request.extraction.get;
        assert_eq!(get["title"], GetField::from("h1"));
        assert_eq!(get["banner"].compile().unwrap().read, ReadMode::Attribute("src".into()));
        assert_eq!(get["body"].compile().unwrap().read, ReadMode::Markup);

        let rows = &request.extraction.collect["rows"];
        let fields = rows.fields.as_ref().unwrap();
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["cat", "link"]);
        assert_eq!(fields["link"].compile().unwrap().attribute(), Some("href"));
        assert_eq!(rows.options(false), CollectOptions::new().sticky_field("cat").drop_empty_records(true));
        assert!(!request.extraction.collect["prices"].options(false).drop_empty_records);
        assert!(request.extraction.collect["prices"].options(true).drop_empty_records);
    }

    #[test]
    fn test_compile_errors_are_notation_errors() {
        assert!(GetField::from("a()").compile().is_err());
        assert!(GetField::from("a<").compile().is_err());
        assert!(RecipeSource::from("*").compile().is_err());
        assert!(CollectField::new("(href)").anchors().is_err());
    }

    #[test]
    fn test_builders() {
        let extraction = ExtractionRequest::new()
            .get("title", "h1")
            .collect("rows", CollectField::new("tr").with_field("name", "td.name").with_sticky("cat"));
        let request = ScrapeRequest::new("https://example.com").with_extraction(extraction);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["get"]["title"], "h1");
        assert_eq!(value["collect"]["rows"]["fields"]["name"], "td.name");
        assert_eq!(value["collect"]["rows"]["sticky"], "cat");
    }
}
