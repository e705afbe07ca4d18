//! Static HTML document backed by the `scraper` crate
//!
//! Used for offline extraction and to exercise the query engine without a browser.

use crate::dom::accessor::{DocumentAccessor, Scope};
use crate::error::{Result, ScrapeError};
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text is never rendered
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// A parsed HTML document
#[derive(Debug)]
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parse a complete HTML document
    pub fn parse(markup: &str) -> Self {
        Self { html: Html::parse_document(markup) }
    }

    /// Parse an HTML fragment (no implied `<html>`/`<body>` wrapper)
    pub fn parse_fragment(markup: &str) -> Self {
        Self { html: Html::parse_fragment(markup) }
    }

    /// Borrow the document through the accessor interface
    pub fn accessor(&self) -> HtmlAccessor<'_> {
        HtmlAccessor { html: &self.html }
    }
}

/// [`DocumentAccessor`] over a borrowed [`HtmlDocument`]
#[derive(Debug, Clone, Copy)]
pub struct HtmlAccessor<'a> {
    html: &'a Html,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

impl<'a> DocumentAccessor for HtmlAccessor<'a> {
    type Element = ElementRef<'a>;

    fn match_first(&self, scope: Scope<'_, Self::Element>, selector: &str) -> Result<Option<Self::Element>> {
        let selector = compile(selector)?;
        Ok(match scope {
            Scope::Document => self.html.select(&selector).next(),
            Scope::Within(root) => root.select(&selector).find(|el| el.id() != root.id()),
        })
    }

    fn match_all(&self, scope: Scope<'_, Self::Element>, selector: &str) -> Result<Vec<Self::Element>> {
        let selector = compile(selector)?;
        Ok(match scope {
            Scope::Document => self.html.select(&selector).collect(),
            Scope::Within(root) => root.select(&selector).filter(|el| el.id() != root.id()).collect(),
        })
    }

    fn closest_match(&self, element: &Self::Element, selector: &str) -> Result<Option<Self::Element>> {
        let selector = compile(selector)?;
        Ok(std::iter::once(*element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find(|el| selector.matches(el)))
    }

    fn matches(&self, element: &Self::Element, selector: &str) -> Result<bool> {
        Ok(compile(selector)?.matches(element))
    }

    fn parent(&self, element: &Self::Element) -> Result<Option<Self::Element>> {
        Ok(element.parent().and_then(ElementRef::wrap))
    }

    fn next_sibling(&self, element: &Self::Element) -> Result<Option<Self::Element>> {
        Ok(element.next_siblings().find_map(ElementRef::wrap))
    }

    fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>> {
        Ok(element.value().attr(name).map(str::to_string))
    }

    fn rendered_text(&self, element: &Self::Element) -> Result<String> {
        let mut text = String::new();
        for node in element.descendants() {
            if let Node::Text(fragment) = node.value() {
                let hidden = node
                    .ancestors()
                    .take_while(|ancestor| ancestor.id() != element.id())
                    .filter_map(ElementRef::wrap)
                    .any(|ancestor| HIDDEN_TAGS.contains(&ancestor.value().name()));
                if !hidden {
                    text.push_str(fragment);
                }
            }
        }
        Ok(text)
    }

    fn outer_markup(&self, element: &Self::Element) -> Result<String> {
        Ok(element.html())
    }

    fn document_markup(&self) -> Result<String> {
        Ok(self.html.html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <ul id="list">
                <li class="item"><span>One</span></li>
                <!-- separator -->
                <li class="item" data-x="  keep  me "><span>Two</span></li>
            </ul>
            <script>var hidden = 1;</script>
        </body></html>
    "#;

    #[test]
    fn test_match_first_and_all() {
        let doc = HtmlDocument::parse(PAGE);
        let acc = doc.accessor();

        let first = acc.match_first(Scope::Document, "li.item").unwrap().unwrap();
        assert_eq!(acc.rendered_text(&first).unwrap().trim(), "One");
        assert_eq!(acc.match_all(Scope::Document, "li.item").unwrap().len(), 2);
        assert!(acc.match_first(Scope::Document, "table").unwrap().is_none());
    }

    #[test]
    fn test_within_scope_excludes_root() {
        let doc = HtmlDocument::parse(PAGE);
        let acc = doc.accessor();

        let list = acc.match_first(Scope::Document, "ul").unwrap().unwrap();
        assert!(acc.match_first(Scope::Within(&list), "ul").unwrap().is_none());
        assert_eq!(acc.match_all(Scope::Within(&list), "span").unwrap().len(), 2);
    }

    #[test]
    fn test_navigation_primitives() {
        let doc = HtmlDocument::parse(PAGE);
        let acc = doc.accessor();

        let span = acc.match_first(Scope::Document, "span").unwrap().unwrap();
        let item = acc.parent(&span).unwrap().unwrap();
        assert_eq!(item.value().name(), "li");

        let closest = acc.closest_match(&span, "ul").unwrap().unwrap();
        assert_eq!(acc.attribute(&closest, "id").unwrap().as_deref(), Some("list"));
        assert_eq!(acc.closest_match(&item, "li").unwrap(), Some(item));

        let sibling = acc.next_sibling(&item).unwrap().unwrap();
        assert_eq!(acc.attribute(&sibling, "data-x").unwrap().as_deref(), Some("  keep  me "));
        assert!(acc.next_sibling(&sibling).unwrap().is_none());
        assert!(acc.matches(&sibling, "li.item").unwrap());
    }

    #[test]
    fn test_root_has_no_parent() {
        let doc = HtmlDocument::parse(PAGE);
        let acc = doc.accessor();

        let html = acc.match_first(Scope::Document, "html").unwrap().unwrap();
        assert!(acc.parent(&html).unwrap().is_none());
    }

    #[test]
    fn test_rendered_text_skips_scripts() {
        let doc = HtmlDocument::parse(PAGE);
        let acc = doc.accessor();

        let body = acc.match_first(Scope::Document, "body").unwrap().unwrap();
        let text = acc.rendered_text(&body).unwrap();
        assert!(text.contains("One"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_invalid_selector() {
        let doc = HtmlDocument::parse(PAGE);
        let result = doc.accessor().match_first(Scope::Document, "li[");
        assert!(matches!(result, Err(ScrapeError::InvalidSelector(_))));
    }

    #[test]
    fn test_markup() {
        let doc = HtmlDocument::parse(PAGE);
        let acc = doc.accessor();

        let span = acc.match_first(Scope::Document, "span").unwrap().unwrap();
        assert_eq!(acc.outer_markup(&span).unwrap(), "<span>One</span>");
        assert!(acc.document_markup().unwrap().contains("<ul id=\"list\">"));
    }
}
