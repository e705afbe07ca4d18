//! Live document accessor backed by a Chrome tab
//!
//! Every operation is a `Runtime.callFunctionOn` against the element handle with
//! selectors and attribute names passed as call arguments, never spliced into
//! script source.

use crate::dom::accessor::{DocumentAccessor, Scope};
use crate::error::{Result, ScrapeError};
use headless_chrome::protocol::cdp::{DOM, Runtime::RemoteObject};
use headless_chrome::{Element, Tab};
use serde_json::{Value, json};

const QUERY_FIRST: &str = "function(selector) { return this.querySelector(selector); }";
const QUERY_COUNT: &str = "function(selector) { return this.querySelectorAll(selector).length; }";
const QUERY_NTH: &str = "function(selector, index) { return this.querySelectorAll(selector)[index] || null; }";
const CLOSEST: &str = "function(selector) { return this.closest(selector); }";
const MATCHES: &str = "function(selector) { return this.matches(selector); }";
const PARENT: &str = "function() { return this.parentElement; }";
const NEXT_SIBLING: &str = "function() { return this.nextElementSibling; }";
const ATTRIBUTE: &str = "function(name) { return this.getAttribute(name); }";
const RENDERED_TEXT: &str = "function() { return this.innerText || this.textContent || ''; }";
const OUTER_MARKUP: &str = "function() { return this.outerHTML; }";
const DOCUMENT_MARKUP: &str = "function() { return this.documentElement ? this.documentElement.outerHTML : ''; }";

/// [`DocumentAccessor`] over the document currently loaded in a tab
pub struct TabDocument<'a> {
    tab: &'a Tab,
    document: Element<'a>,
}

impl<'a> TabDocument<'a> {
    /// Bind to the tab's current document.
    ///
    /// Must be created after navigation: a new page invalidates the document node.
    pub fn new(tab: &'a Tab) -> Result<Self> {
        let root = tab
            .get_document()
            .map_err(|e| ScrapeError::AccessorFailed(format!("Failed to read document: {}", e)))?;
        let document = Element::new(tab, root.node_id)
            .map_err(|e| ScrapeError::AccessorFailed(format!("Failed to resolve document node: {}", e)))?;

        Ok(Self { tab, document })
    }

    fn call(&self, target: &Element<'a>, function: &str, args: Vec<Value>) -> Result<RemoteObject> {
        target
            .call_js_fn(function, args, false)
            .map_err(|e| ScrapeError::AccessorFailed(e.to_string()))
    }

    fn call_in_scope(&self, scope: Scope<'_, Element<'a>>, function: &str, args: Vec<Value>) -> Result<RemoteObject> {
        match scope {
            Scope::Document => self.call(&self.document, function, args),
            Scope::Within(element) => self.call(element, function, args),
        }
    }

    /// Turn a returned node reference into an element handle; `null` becomes `None`
    fn adopt(&self, object: RemoteObject) -> Result<Option<Element<'a>>> {
        let Some(object_id) = object.object_id else {
            return Ok(None);
        };

        let node_id = self
            .tab
            .call_method(DOM::RequestNode { object_id })
            .map_err(|e| ScrapeError::AccessorFailed(format!("Failed to request node: {}", e)))?
            .node_id;

        Element::new(self.tab, node_id)
            .map(Some)
            .map_err(|e| ScrapeError::AccessorFailed(format!("Failed to resolve node {}: {}", node_id, e)))
    }
}

fn string_value(object: RemoteObject) -> Option<String> {
    object.value.and_then(|value| value.as_str().map(str::to_string))
}

impl<'a> DocumentAccessor for TabDocument<'a> {
    type Element = Element<'a>;

    fn match_first(&self, scope: Scope<'_, Self::Element>, selector: &str) -> Result<Option<Self::Element>> {
        let object = self.call_in_scope(scope, QUERY_FIRST, vec![json!(selector)])?;
        self.adopt(object)
    }

    fn match_all(&self, scope: Scope<'_, Self::Element>, selector: &str) -> Result<Vec<Self::Element>> {
        let count = self
            .call_in_scope(scope, QUERY_COUNT, vec![json!(selector)])?
            .value
            .and_then(|value| value.as_u64())
            .unwrap_or(0);

        let mut elements = Vec::with_capacity(count as usize);
        for index in 0..count {
            let object = self.call_in_scope(scope, QUERY_NTH, vec![json!(selector), json!(index)])?;
            // The document may have shrunk between calls
            if let Some(element) = self.adopt(object)? {
                elements.push(element);
            }
        }

        Ok(elements)
    }

    fn closest_match(&self, element: &Self::Element, selector: &str) -> Result<Option<Self::Element>> {
        let object = self.call(element, CLOSEST, vec![json!(selector)])?;
        self.adopt(object)
    }

    fn matches(&self, element: &Self::Element, selector: &str) -> Result<bool> {
        let object = self.call(element, MATCHES, vec![json!(selector)])?;
        Ok(object.value.and_then(|value| value.as_bool()).unwrap_or(false))
    }

    fn parent(&self, element: &Self::Element) -> Result<Option<Self::Element>> {
        let object = self.call(element, PARENT, Vec::new())?;
        self.adopt(object)
    }

    fn next_sibling(&self, element: &Self::Element) -> Result<Option<Self::Element>> {
        let object = self.call(element, NEXT_SIBLING, Vec::new())?;
        self.adopt(object)
    }

    fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>> {
        let object = self.call(element, ATTRIBUTE, vec![json!(name)])?;
        Ok(string_value(object))
    }

    fn rendered_text(&self, element: &Self::Element) -> Result<String> {
        let object = self.call(element, RENDERED_TEXT, Vec::new())?;
        Ok(string_value(object).unwrap_or_default())
    }

    fn outer_markup(&self, element: &Self::Element) -> Result<String> {
        let object = self.call(element, OUTER_MARKUP, Vec::new())?;
        Ok(string_value(object).unwrap_or_default())
    }

    fn document_markup(&self) -> Result<String> {
        let object = self.call(&self.document, DOCUMENT_MARKUP, Vec::new())?;
        Ok(string_value(object).unwrap_or_default())
    }
}
