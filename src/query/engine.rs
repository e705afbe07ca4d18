//! Query execution engine
//!
//! Walks a resolved [`Navigation`] over a [`DocumentAccessor`]. A step that
//! finds no element ends the walk with `None`, which callers turn into an empty
//! value; only accessor failures surface as errors.

use crate::dom::{DocumentAccessor, Scope};
use crate::error::{Result, ScrapeError};
use crate::query::normalize::normalize_text;
use crate::query::notation::SelectorSpec;
use crate::query::resolve::{CompactChainPlan, Navigation, Operator, QueryPlan};
use serde::{Deserialize, Serialize};

/// How the element at the end of a traversal is turned into a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadMode {
    /// Rendered text, whitespace-normalized
    Text,
    /// Raw attribute value, `""` when absent
    Attribute(String),
    /// Outer markup, unmodified
    Markup,
}

impl ReadMode {
    /// `Attribute` when a name is given, `Text` otherwise
    pub fn from_attribute(attribute: Option<String>) -> Self {
        attribute.map_or(Self::Text, Self::Attribute)
    }
}

/// Text of an element together with its outer markup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextAndMarkup {
    pub text: String,
    pub html: String,
}

impl TextAndMarkup {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.html.is_empty()
    }
}

/// A document-level query: where to go and what to read there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    pub navigation: Navigation,
    pub read: ReadMode,
}

impl FieldQuery {
    /// Parse `selector`, `selector(attr)` or a navigation chain such as `a.test<.product_pod(id)`.
    ///
    /// The attribute applies only to the element the whole chain resolves to.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_spec(SelectorSpec::parse(raw)?)
    }

    /// Build a query from an already split selector spec
    pub fn from_spec(spec: SelectorSpec) -> Result<Self> {
        if spec.targets_self() {
            return Err(ScrapeError::notation(
                format!("({})", spec.attribute.unwrap_or_default()),
                "a document-level query needs a selector",
            ));
        }

        Ok(Self { navigation: Navigation::resolve(&spec.base_selector)?, read: ReadMode::from_attribute(spec.attribute) })
    }

    /// Builder method: override the read mode
    pub fn with_read(mut self, read: ReadMode) -> Self {
        self.read = read;
        self
    }
}

/// Executes navigations against one document
pub struct QueryEngine<'d, D: DocumentAccessor> {
    doc: &'d D,
}

impl<'d, D: DocumentAccessor> QueryEngine<'d, D> {
    /// Create an engine over a document accessor
    pub fn new(doc: &'d D) -> Self {
        Self { doc }
    }

    /// The underlying accessor
    pub fn document(&self) -> &'d D {
        self.doc
    }

    /// Single mode: the value of the first match, `""` when any step finds nothing
    pub fn extract_one(&self, query: &FieldQuery) -> Result<String> {
        log::debug!("extract_one: {:?} -> {:?}", query.navigation, query.read);
        match self.locate(Scope::Document, &query.navigation)? {
            Some(element) => self.read(&element, &query.read),
            None => Ok(String::new()),
        }
    }

    /// Collection mode: one value per match of the start selector, in document order
    pub fn extract_all(&self, query: &FieldQuery) -> Result<Vec<String>> {
        log::debug!("extract_all: {:?} -> {:?}", query.navigation, query.read);
        self.locate_all(Scope::Document, &query.navigation)?
            .iter()
            .map(|resolved| match resolved {
                Some(element) => self.read(element, &query.read),
                None => Ok(String::new()),
            })
            .collect()
    }

    /// Text and markup of the element `navigation` reaches; both `""` when nothing matches
    pub fn extract_text_and_markup(&self, navigation: &Navigation) -> Result<TextAndMarkup> {
        match self.locate(Scope::Document, navigation)? {
            Some(element) => self.text_and_markup(&element),
            None => Ok(TextAndMarkup::default()),
        }
    }

    /// Text and markup for every match of the start selector, in document order
    pub fn extract_all_text_and_markup(&self, navigation: &Navigation) -> Result<Vec<TextAndMarkup>> {
        self.locate_all(Scope::Document, navigation)?
            .iter()
            .map(|resolved| match resolved {
                Some(element) => self.text_and_markup(element),
                None => Ok(TextAndMarkup::default()),
            })
            .collect()
    }

    fn text_and_markup(&self, element: &D::Element) -> Result<TextAndMarkup> {
        Ok(TextAndMarkup { text: self.read(element, &ReadMode::Text)?, html: self.read(element, &ReadMode::Markup)? })
    }

    /// Resolve the first match of the start selector in `scope` through the navigation
    pub fn locate(&self, scope: Scope<'_, D::Element>, navigation: &Navigation) -> Result<Option<D::Element>> {
        match self.doc.match_first(scope, navigation.start_selector())? {
            Some(start) => self.follow(start, navigation),
            None => Ok(None),
        }
    }

    /// Resolve every match of the start selector in `scope`, keeping one slot per match
    pub fn locate_all(
        &self,
        scope: Scope<'_, D::Element>,
        navigation: &Navigation,
    ) -> Result<Vec<Option<D::Element>>> {
        self.doc
            .match_all(scope, navigation.start_selector())?
            .into_iter()
            .map(|start| self.follow(start, navigation))
            .collect()
    }

    fn follow(&self, start: D::Element, navigation: &Navigation) -> Result<Option<D::Element>> {
        match navigation {
            Navigation::Chain(plan) => self.walk(start, plan),
            Navigation::Compact(plan) => self.climb(start, plan),
        }
    }

    /// Apply every `(operator, selection)` step of `plan` starting at `start`
    pub fn walk(&self, start: D::Element, plan: &QueryPlan) -> Result<Option<D::Element>> {
        let mut current = start;

        for (op, selection) in plan.steps() {
            let next = match op {
                Operator::Ancestor => self.doc.closest_match(&current, selection)?,
                Operator::Descendant => self.doc.match_first(Scope::Within(&current), selection)?,
                Operator::Sibling => match self.doc.next_sibling(&current)? {
                    Some(sibling) => self.doc.match_first(Scope::Within(&sibling), selection)?,
                    None => None,
                },
            };

            match next {
                Some(element) => current = element,
                None => {
                    log::debug!("step '{} {}' found nothing", op, selection);
                    return Ok(None);
                }
            }
        }

        Ok(Some(current))
    }

    /// Climb `parent_hops` parents from `start`, then match the target below that ancestor
    pub fn climb(&self, start: D::Element, plan: &CompactChainPlan) -> Result<Option<D::Element>> {
        match self.ascend(start, plan.parent_hops)? {
            Some(container) => self.doc.match_first(Scope::Within(&container), &plan.target_selector),
            None => Ok(None),
        }
    }

    /// Follow `hops` parent links from `start`
    pub fn ascend(&self, start: D::Element, hops: usize) -> Result<Option<D::Element>> {
        let mut current = start;
        for _ in 0..hops {
            match self.doc.parent(&current)? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Follow at least one parent link from a borrowed element
    pub fn ancestor(&self, element: &D::Element, hops: usize) -> Result<Option<D::Element>> {
        match self.doc.parent(element)? {
            Some(parent) => self.ascend(parent, hops.saturating_sub(1)),
            None => Ok(None),
        }
    }

    /// Read the terminal value of an element
    pub fn read(&self, element: &D::Element, mode: &ReadMode) -> Result<String> {
        match mode {
            ReadMode::Text => Ok(normalize_text(&self.doc.rendered_text(element)?)),
            ReadMode::Attribute(name) => Ok(self.doc.attribute(element, name)?.unwrap_or_default()),
            ReadMode::Markup => self.doc.outer_markup(element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;

    const BOOKS: &str = r#"
        <html><body>
        <section id="catalogue">
            <div class="alert"><strong>  In
                stock  </strong></div>
            <article class="product_pod" data-sku="  B-1  ">
                <h3><a class="test" href="/book-1">A Light in the Attic</a></h3>
                <p class="price">£51.77</p>
            </article>
            <article class="product_pod" data-sku="B-2">
                <h3><a class="test" href="/book-2">Tipping the Velvet</a></h3>
                <p class="price">£53.74</p>
            </article>
            <article class="product_pod" data-sku="B-3">
                <h3>No link here</h3>
            </article>
        </section>
        </body></html>
    "#;

    fn query(raw: &str) -> FieldQuery {
        FieldQuery::parse(raw).unwrap()
    }

    #[test]
    fn test_plain_selector_text_and_attribute() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        assert_eq!(engine.extract_one(&query("h3 a")).unwrap(), "A Light in the Attic");
        assert_eq!(engine.extract_one(&query("h3 a(href)")).unwrap(), "/book-1");
        assert_eq!(engine.extract_one(&query("table")).unwrap(), "");
        assert_eq!(engine.extract_one(&query("a(title)")).unwrap(), "");
    }

    #[test]
    fn test_ancestor_step_reads_container() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        let text = engine.extract_one(&query("a.test<.product_pod")).unwrap();
        assert_eq!(text, "A Light in the Attic £51.77");
    }

    #[test]
    fn test_attribute_applies_to_final_element_only() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        assert_eq!(engine.extract_one(&query("a.test<.product_pod(data-sku)")).unwrap(), "  B-1  ");
        assert_eq!(engine.extract_one(&query("a.test<.product_pod(href)")).unwrap(), "");
    }

    #[test]
    fn test_mixed_chain() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        let text = engine.extract_one(&query("a.test<.product_pod<section>div.alert>strong")).unwrap();
        assert_eq!(text, "In stock");
    }

    #[test]
    fn test_sibling_step() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        // first article -> next article -> its price
        let text = engine.extract_one(&query("a.test<article+p.price")).unwrap();
        assert_eq!(text, "£53.74");
        assert_eq!(engine.extract_one(&query("p.price<article+h3 < section > table")).unwrap(), "");
    }

    #[test]
    fn test_missing_step_short_circuits() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        assert_eq!(engine.extract_one(&query("a.test<table>td")).unwrap(), "");
        assert_eq!(engine.extract_one(&query("a.missing<.product_pod")).unwrap(), "");
    }

    #[test]
    fn test_collection_mode_keeps_one_slot_per_match() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        let skus = engine.extract_all(&query("h3<.product_pod(data-sku)")).unwrap();
        assert_eq!(skus, vec!["  B-1  ", "B-2", "B-3"]);

        let links = engine.extract_all(&query("h3<article>a(href)")).unwrap();
        assert_eq!(links, vec!["/book-1", "/book-2", ""]);
    }

    #[test]
    fn test_compact_chain() {
        let page = r#"
            <div class="container">
                <h1>Heading</h1>
                <div class="txt"><span class="hasan">x</span></div>
            </div>
        "#;
        let doc = HtmlDocument::parse(page);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        assert_eq!(engine.extract_one(&query(".hasan<div<div>h1")).unwrap(), "Heading");
        assert_eq!(engine.extract_one(&query(".hasan<div<div<div<div<div<div<div>h1")).unwrap(), "");
    }

    #[test]
    fn test_markup_is_not_normalized() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        let markup = engine.extract_one(&query("div.alert").with_read(ReadMode::Markup)).unwrap();
        assert!(markup.starts_with("<div class=\"alert\">"));
        assert!(markup.contains("  In\n"));
    }

    #[test]
    fn test_document_query_requires_selector() {
        assert!(FieldQuery::parse("(href)").is_err());
        assert!(FieldQuery::parse("").is_err());
    }

    #[test]
    fn test_text_and_markup_together() {
        let doc = HtmlDocument::parse(BOOKS);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);

        let alert = engine.extract_text_and_markup(&query("div.alert").navigation).unwrap();
        assert_eq!(alert.text, "In stock");
        assert!(alert.html.starts_with("<div class=\"alert\">"));

        let missing = engine.extract_text_and_markup(&query("table").navigation).unwrap();
        assert!(missing.is_empty());

        let titles = engine.extract_all_text_and_markup(&query("h3").navigation).unwrap();
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[2].text, "No link here");
        assert_eq!(titles[2].html, "<h3>No link here</h3>");
    }
}
