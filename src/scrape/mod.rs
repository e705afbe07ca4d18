//! Scrape requests and their execution
//!
//! A request names single values (`get`) and collections (`collect`); the
//! [`Extractor`] runs it against any [`DocumentAccessor`](crate::dom::DocumentAccessor)
//! and the outcome is wrapped in a [`ScrapeResponse`].

pub mod request;
pub mod response;
pub mod runner;

pub use request::{CollectField, ExtractionRequest, GetField, RecipeSource, ScrapeRequest};
pub use response::{Collected, ExtractedData, Extraction, ScrapeResponse};
pub use runner::Extractor;
