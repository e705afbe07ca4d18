//! Document access module
//!
//! The query engine reads documents only through [`DocumentAccessor`]. Two
//! implementations are provided:
//! - HtmlDocument: static HTML parsed in-process
//! - TabDocument: the live document of a Chrome tab

pub mod accessor;
pub mod html;
pub mod tab;

pub use accessor::{DocumentAccessor, Scope};
pub use html::{HtmlAccessor, HtmlDocument};
pub use tab::TabDocument;
