//! # browser-scrape
//!
//! Structured data extraction from web pages, driven by a compact selector
//! notation and executed either on static HTML or on a live Chrome tab via
//! the Chrome DevTools Protocol (CDP).
//!
//! ## Selector notation
//!
//! - `h1`: normalized text of the first match
//! - `a.more(href)`: an attribute of the first match
//! - `span.price<div<h3`: from `span.price` go up one parent per middle
//!   tag and read the first `h3` inside the element reached
//! - `td.name < tr > td.price`, `h3 < li + a(href)`: full chains with parent (`<`),
//!   descendant (`>`) and next-sibling (`+`) steps
//!
//! Record fields are read relative to an anchor element: `td.name`,
//! `(data-id)`, `>> h2`, `* .badge`, `parent a(href)` and chains.
//!
//! ## Static HTML
//!
//! ```rust
//! use browser_scrape::dom::HtmlDocument;
//! use browser_scrape::scrape::{CollectField, ExtractionRequest, Extractor};
//!
//! let doc = HtmlDocument::parse("<h1>Menu</h1><ul><li><b>Tea</b> 2.50</li><li><b>Coffee</b> 3.00</li></ul>");
//! let accessor = doc.accessor();
//!
//! let request = ExtractionRequest::new()
//!     .get("title", "h1")
//!     .collect("items", CollectField::new("li").with_field("name", "b"));
//! let extraction = Extractor::new(&accessor).run(&request);
//!
//! assert_eq!(extraction.data.get["title"], "Menu");
//! assert_eq!(extraction.data.collect["items"].len(), 2);
//! ```
//!
//! ## Live pages
//!
//! ```rust,no_run
//! use browser_scrape::browser::ScrapeService;
//! use browser_scrape::scrape::{ExtractionRequest, ScrapeRequest};
//!
//! # fn main() -> browser_scrape::Result<()> {
//! let service = ScrapeService::from_env()?;
//! let request = ScrapeRequest::new("https://books.toscrape.com")
//!     .with_extraction(ExtractionRequest::new().get("first", "article.product_pod h3 a(title)"));
//!
//! let response = service.scrape(&request);
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`query`]: notation parsing, navigation plans, the query engine and record extraction
//! - [`dom`]: the [`DocumentAccessor`] seam with static-HTML and Chrome-tab implementations
//! - [`scrape`]: request grammar, extraction runner and response
//! - [`browser`]: browser sessions, proxies and the retrying scrape service
//! - [`config`]: environment configuration
//! - [`tools`]: session tools usable by name with JSON parameters
//! - [`error`]: error types and result aliases
//! - [`mcp`]: Model Context Protocol server (requires `mcp-handler` feature)

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod query;
pub mod scrape;
pub mod tools;

#[cfg(feature = "mcp-handler")]
pub mod mcp;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, ScrapeService};
pub use config::ScraperConfig;
pub use dom::{DocumentAccessor, HtmlDocument, TabDocument};
pub use error::{Result, ScrapeError};
pub use query::{FieldQuery, FieldRecipe, Navigation, QueryEngine, SelectorSpec};
pub use scrape::{ExtractionRequest, Extractor, ScrapeRequest, ScrapeResponse};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};

#[cfg(feature = "mcp-handler")]
pub use mcp::BrowserServer;
#[cfg(feature = "mcp-handler")]
pub use rmcp::ServiceExt;
