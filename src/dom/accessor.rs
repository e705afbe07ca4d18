use crate::error::Result;

/// Where a selector lookup is evaluated
#[derive(Debug)]
pub enum Scope<'e, E> {
    /// The whole document
    Document,
    /// Descendants of the given element, excluding the element itself
    Within(&'e E),
}

impl<E> Clone for Scope<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Scope<'_, E> {}

/// Capabilities the query engine needs from a document.
///
/// Every call may cross a process boundary (a live browser tab), so callers
/// must not assume two calls observe the same document state. A lookup that
/// finds nothing is `Ok(None)`; `Err` is reserved for failures of the
/// accessor itself.
pub trait DocumentAccessor {
    /// Handle to one element of the document
    type Element;

    /// First element in `scope` matching `selector`
    fn match_first(&self, scope: Scope<'_, Self::Element>, selector: &str) -> Result<Option<Self::Element>>;

    /// Every element in `scope` matching `selector`, in document order
    fn match_all(&self, scope: Scope<'_, Self::Element>, selector: &str) -> Result<Vec<Self::Element>>;

    /// Nearest ancestor-or-self of `element` matching `selector`
    fn closest_match(&self, element: &Self::Element, selector: &str) -> Result<Option<Self::Element>>;

    /// Whether `element` itself matches `selector`
    fn matches(&self, element: &Self::Element, selector: &str) -> Result<bool>;

    /// Parent element, `None` at the document root
    fn parent(&self, element: &Self::Element) -> Result<Option<Self::Element>>;

    /// Next sibling element, skipping text and comment nodes
    fn next_sibling(&self, element: &Self::Element) -> Result<Option<Self::Element>>;

    /// Raw attribute value as stored on the element
    fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// User-visible text, falling back to raw node text
    fn rendered_text(&self, element: &Self::Element) -> Result<String>;

    /// Serialized markup of the element including itself
    fn outer_markup(&self, element: &Self::Element) -> Result<String>;

    /// Serialized markup of the whole document
    fn document_markup(&self) -> Result<String>;
}
