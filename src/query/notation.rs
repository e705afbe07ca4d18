use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};

/// A selector string split into its base selector and optional attribute
///
/// `a(href)` reads the `href` attribute of the first `a`; `(class)` reads the
/// attribute of the current element itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Selector text with the attribute suffix removed
    pub base_selector: String,

    /// Attribute name requested by a trailing `(...)`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl SelectorSpec {
    /// Create a spec without an attribute
    pub fn new(base_selector: impl Into<String>) -> Self {
        Self { base_selector: base_selector.into(), attribute: None }
    }

    /// Builder method: request an attribute
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Parse the `selector(attr)` notation.
    ///
    /// The attribute is taken from the last `(` up to the next `)`, so
    /// parentheses inside the selector body (`li:nth-child(2)(title)`) survive.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        let spec = match trimmed.rfind('(') {
            Some(open) if trimmed.ends_with(')') => {
                let close = trimmed[open..].find(')').map(|offset| open + offset).unwrap_or(trimmed.len() - 1);
                let attribute = trimmed[open + 1..close].trim();
                if attribute.is_empty() {
                    return Err(ScrapeError::notation(raw, "empty attribute name"));
                }
                Self::new(trimmed[..open].trim()).with_attribute(attribute)
            }
            _ => Self::new(trimmed),
        };

        if !parentheses_balanced(&spec.base_selector) {
            return Err(ScrapeError::notation(raw, "unmatched parenthesis"));
        }

        Ok(spec)
    }

    /// Whether this targets the current element itself (`(attr)` or empty)
    pub fn targets_self(&self) -> bool {
        self.base_selector.is_empty()
    }
}

fn parentheses_balanced(selector: &str) -> bool {
    let mut depth: usize = 0;
    for ch in selector.chars() {
        match ch {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
