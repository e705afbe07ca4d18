//! Field recipes for record extraction
//!
//! A recipe describes how one field of a record is read relative to the
//! record's anchor element:
//!
//! | Recipe            | Meaning                                                   |
//! |-------------------|-----------------------------------------------------------|
//! | `text`            | rendered text of the anchor                               |
//! | `(attr)`          | attribute of the anchor                                   |
//! | `sel` / `sel(a)`  | first descendant of the anchor matching `sel`             |
//! | `>> sel`          | one parent hop per `>>`, then `sel` below that ancestor   |
//! | `* sel`           | nearest ancestor (from the parent up) containing `sel`    |
//! | `parent sel`      | one parent hop, then `sel` below the parent               |
//! | `a<div<div>h1`    | compact parent chain starting inside the anchor           |
//! | `a<.box>h1`       | operator chain starting inside the anchor                 |

use crate::dom::{DocumentAccessor, Scope};
use crate::error::{Result, ScrapeError};
use crate::query::engine::{QueryEngine, ReadMode};
use crate::query::notation::SelectorSpec;
use crate::query::resolve::{CompactChainPlan, Navigation, QueryPlan};

const HOP_PREFIX: &str = ">>";
const SEARCH_PREFIX: char = '*';
const PARENT_KEYWORD: &str = "parent";
const OWN_TEXT_KEYWORD: &str = "text";

/// How a single record field is read from its anchor element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRecipe {
    /// Rendered text of the anchor itself
    OwnText,

    /// Attribute of the anchor itself
    AttributeOnCurrent(String),

    /// First descendant of the anchor matching `selector`
    ///
    /// When an attribute is requested and the anchor itself matches
    /// `selector`, the anchor is read.
    ChildSelector { selector: String, attribute: Option<String> },

    /// `hops` parent links up, then `selector` below that ancestor (or the ancestor itself)
    GrandparentHops { hops: usize, selector: Option<String>, attribute: Option<String> },

    /// Nearest ancestor, starting at the anchor's parent, whose subtree contains `selector`
    AncestorSearch { selector: String, attribute: Option<String> },

    /// One parent link up, then `selector` below the parent (or the parent itself)
    OneParentHop { selector: Option<String>, attribute: Option<String> },

    /// Compact parent chain whose start selector is matched inside the anchor
    CompactChain { plan: CompactChainPlan, attribute: Option<String> },

    /// Operator chain whose first selection is matched inside the anchor
    Chain { plan: QueryPlan, attribute: Option<String> },
}

impl FieldRecipe {
    /// Parse a recipe string such as `>> a(href)` or `span.price`
    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_spec(SelectorSpec::parse(raw)?).map_err(|e| match e {
            ScrapeError::InvalidNotation { reason, .. } => ScrapeError::notation(raw, reason),
            other => other,
        })
    }

    /// Build a recipe from the object form `{selector, attr}`.
    ///
    /// An explicit attribute wins over one written in the selector.
    pub fn from_parts(selector: &str, attribute: Option<&str>) -> Result<Self> {
        let mut spec = SelectorSpec::parse(selector)?;
        if let Some(attribute) = attribute.map(str::trim).filter(|a| !a.is_empty()) {
            spec.attribute = Some(attribute.to_string());
        }
        Self::from_spec(spec)
    }

    /// Classify a split selector spec
    pub fn from_spec(spec: SelectorSpec) -> Result<Self> {
        let SelectorSpec { base_selector, attribute } = spec;
        let base = base_selector.trim();

        if base.is_empty() {
            return match attribute {
                Some(name) => Ok(Self::AttributeOnCurrent(name)),
                None => Err(ScrapeError::notation(base, "empty field recipe")),
            };
        }

        if base == OWN_TEXT_KEYWORD && attribute.is_none() {
            return Ok(Self::OwnText);
        }

        if base.starts_with(HOP_PREFIX) {
            let mut rest = base;
            let mut hops = 0;
            while let Some(stripped) = rest.strip_prefix(HOP_PREFIX) {
                hops += 1;
                rest = stripped.trim_start();
            }
            return Ok(Self::GrandparentHops { hops, selector: non_empty(rest), attribute });
        }

        if let Some(rest) = base.strip_prefix(SEARCH_PREFIX) {
            let selector = non_empty(rest)
                .ok_or_else(|| ScrapeError::notation(base, "ancestor search needs a selector after '*'"))?;
            return Ok(Self::AncestorSearch { selector, attribute });
        }

        if base == PARENT_KEYWORD {
            return Ok(Self::OneParentHop { selector: None, attribute });
        }
        if let Some(rest) = base.strip_prefix(PARENT_KEYWORD).filter(|rest| rest.starts_with(char::is_whitespace)) {
            return Ok(Self::OneParentHop { selector: non_empty(rest), attribute });
        }

        if base.contains('<') {
            return Ok(match Navigation::resolve(base)? {
                Navigation::Compact(plan) => Self::CompactChain { plan, attribute },
                Navigation::Chain(plan) => Self::Chain { plan, attribute },
            });
        }

        Ok(Self::ChildSelector { selector: base.to_string(), attribute })
    }

    /// The attribute read at the end, if any
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::OwnText => None,
            Self::AttributeOnCurrent(name) => Some(name),
            Self::ChildSelector { attribute, .. }
            | Self::GrandparentHops { attribute, .. }
            | Self::AncestorSearch { attribute, .. }
            | Self::OneParentHop { attribute, .. }
            | Self::CompactChain { attribute, .. }
            | Self::Chain { attribute, .. } => attribute.as_deref(),
        }
    }

    /// Read this field for one anchor. A missing element yields `""`.
    pub fn evaluate<D: DocumentAccessor>(&self, engine: &QueryEngine<'_, D>, anchor: &D::Element) -> Result<String> {
        let doc = engine.document();
        let mode = ReadMode::from_attribute(self.attribute().map(str::to_string));

        let target = match self {
            Self::OwnText | Self::AttributeOnCurrent(_) => return engine.read(anchor, &mode),
            Self::ChildSelector { selector, attribute } => {
                if attribute.is_some() && doc.matches(anchor, selector)? {
                    return engine.read(anchor, &mode);
                }
                doc.match_first(Scope::Within(anchor), selector)?
            }
            Self::GrandparentHops { hops, selector, .. } => {
                below(doc, engine.ancestor(anchor, *hops)?, selector.as_deref())?
            }
            Self::OneParentHop { selector, .. } => below(doc, engine.ancestor(anchor, 1)?, selector.as_deref())?,
            Self::AncestorSearch { selector, .. } => {
                let mut current = doc.parent(anchor)?;
                let mut found = None;
                while let Some(ancestor) = current {
                    found = doc.match_first(Scope::Within(&ancestor), selector)?;
                    if found.is_some() {
                        break;
                    }
                    current = doc.parent(&ancestor)?;
                }
                found
            }
            Self::CompactChain { plan, .. } => match doc.match_first(Scope::Within(anchor), &plan.start_selector)? {
                Some(start) => engine.climb(start, plan)?,
                None => None,
            },
            Self::Chain { plan, .. } => match doc.match_first(Scope::Within(anchor), plan.first())? {
                Some(start) => engine.walk(start, plan)?,
                None => None,
            },
        };

        match target {
            Some(element) => engine.read(&element, &mode),
            None => Ok(String::new()),
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// `selector` matched below `container`, or the container itself when there is no selector
fn below<D: DocumentAccessor>(
    doc: &D,
    container: Option<D::Element>,
    selector: Option<&str>,
) -> Result<Option<D::Element>> {
    match (container, selector) {
        (Some(container), Some(selector)) => doc.match_first(Scope::Within(&container), selector),
        (container, None) => Ok(container),
        (None, Some(_)) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;

    const SHOP: &str = r#"
        <div id="shop" data-shop="corner">
            <h2 class="title">Corner   Shop</h2>
            <ul class="items">
                <li class="item" data-id="1"><a class="link" href="/apple">Apple</a> <span class="price">1.00</span></li>
                <li class="item" data-id="2"><a class="link" href="/pear">Pear</a></li>
            </ul>
            <p class="note"><span class="hasan">x</span></p>
        </div>
    "#;

    fn evaluate_all(recipe: &str, anchors: &str) -> Vec<String> {
        let doc = HtmlDocument::parse(SHOP);
        let acc = doc.accessor();
        let engine = QueryEngine::new(&acc);
        let recipe = FieldRecipe::parse(recipe).unwrap();

        acc.match_all(Scope::Document, anchors)
            .unwrap()
            .iter()
            .map(|anchor| recipe.evaluate(&engine, anchor).unwrap())
            .collect()
    }

    #[test]
    fn test_classification() {
        assert_eq!(FieldRecipe::parse("text").unwrap(), FieldRecipe::OwnText);
        assert_eq!(FieldRecipe::parse("(data-id)").unwrap(), FieldRecipe::AttributeOnCurrent("data-id".into()));
        assert_eq!(
            FieldRecipe::parse("span.price").unwrap(),
            FieldRecipe::ChildSelector { selector: "span.price".into(), attribute: None }
        );
        assert_eq!(
            FieldRecipe::parse(">> >> a(href)").unwrap(),
            FieldRecipe::GrandparentHops { hops: 2, selector: Some("a".into()), attribute: Some("href".into()) }
        );
        assert_eq!(
            FieldRecipe::parse(">>>>h2").unwrap(),
            FieldRecipe::GrandparentHops { hops: 2, selector: Some("h2".into()), attribute: None }
        );
        assert_eq!(
            FieldRecipe::parse("* a(href)").unwrap(),
            FieldRecipe::AncestorSearch { selector: "a".into(), attribute: Some("href".into()) }
        );
        assert_eq!(FieldRecipe::parse("parent").unwrap(), FieldRecipe::OneParentHop { selector: None, attribute: None });
        assert_eq!(
            FieldRecipe::parse("parent h2").unwrap(),
            FieldRecipe::OneParentHop { selector: Some("h2".into()), attribute: None }
        );
        assert!(matches!(FieldRecipe::parse(".parent-row").unwrap(), FieldRecipe::ChildSelector { .. }));
        assert!(matches!(FieldRecipe::parse(".hasan<div<div>h1").unwrap(), FieldRecipe::CompactChain { .. }));
        assert!(matches!(FieldRecipe::parse("a<li>span(title)").unwrap(), FieldRecipe::Chain { .. }));
    }

    #[test]
    fn test_invalid_recipes() {
        assert!(FieldRecipe::parse("").is_err());
        assert!(FieldRecipe::parse("*").is_err());
        assert!(FieldRecipe::parse("a()").is_err());
        assert!(FieldRecipe::parse("a<").is_err());
    }

    #[test]
    fn test_from_parts_prefers_explicit_attribute() {
        let recipe = FieldRecipe::from_parts("a(title)", Some("href")).unwrap();
        assert_eq!(recipe.attribute(), Some("href"));

        let recipe = FieldRecipe::from_parts("a", None).unwrap();
        assert_eq!(recipe.attribute(), None);
    }

    #[test]
    fn test_own_text_and_attribute() {
        assert_eq!(evaluate_all("text", "li.item"), vec!["Apple 1.00", "Pear"]);
        assert_eq!(evaluate_all("(data-id)", "li.item"), vec!["1", "2"]);
    }

    #[test]
    fn test_child_selector() {
        assert_eq!(evaluate_all("span.price", "li.item"), vec!["1.00", ""]);
        assert_eq!(evaluate_all("a(href)", "li.item"), vec!["/apple", "/pear"]);
    }

    #[test]
    fn test_child_selector_reads_matching_anchor() {
        assert_eq!(evaluate_all("a(href)", "a.link"), vec!["/apple", "/pear"]);
        assert_eq!(evaluate_all("a", "a.link"), vec!["", ""]);
    }

    #[test]
    fn test_parent_hops() {
        assert_eq!(evaluate_all(">> h2", "li.item"), vec!["", ""]);
        assert_eq!(evaluate_all(">> >> h2", "li.item"), vec!["Corner Shop", "Corner Shop"]);
        assert_eq!(evaluate_all(">> a.link(href)", "li.item"), vec!["/apple", "/apple"]);
        assert_eq!(evaluate_all(">> >>(data-shop)", "li.item"), vec!["corner", "corner"]);
        assert_eq!(evaluate_all("parent li.item(data-id)", "li.item"), vec!["1", "1"]);
        assert_eq!(evaluate_all("parent(class)", "li.item"), vec!["items", "items"]);
    }

    #[test]
    fn test_ancestor_search() {
        assert_eq!(evaluate_all("* h2", "li.item"), vec!["Corner Shop", "Corner Shop"]);
        assert_eq!(evaluate_all("* .hasan", "li.item"), vec!["x", "x"]);
        assert_eq!(evaluate_all("* a(href)", "span.price"), vec!["/apple"]);
        assert_eq!(evaluate_all("* table", "li.item"), vec!["", ""]);
    }

    #[test]
    fn test_chains_start_inside_anchor() {
        assert_eq!(evaluate_all(".hasan<p<div>h2", "#shop"), vec!["Corner Shop"]);
        assert_eq!(evaluate_all(".hasan<p<div>h2", "li.item"), vec!["", ""]);
        assert_eq!(evaluate_all("a.link<li>span.price", "li.item"), vec!["1.00", ""]);
    }
}
