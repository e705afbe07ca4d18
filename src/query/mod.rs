//! Selector notation and its execution
//!
//! Raw field strings flow through four stages:
//! 1. [`SelectorSpec::parse`] splits off a trailing `(attribute)`
//! 2. [`Navigation::resolve`] picks the traversal dialect and builds a plan
//! 3. [`QueryEngine`] walks the plan over a [`DocumentAccessor`](crate::dom::DocumentAccessor)
//! 4. [`normalize_text`] cleans up rendered text
//!
//! Record extraction compiles each field into a [`FieldRecipe`] evaluated
//! relative to an anchor element.

pub mod collect;
pub mod engine;
pub mod normalize;
pub mod notation;
pub mod recipe;
pub mod resolve;

pub use collect::{CollectOptions, FieldFailure, Record, RecordExtractor, RecordSet, StickyState, collect_values};
pub use engine::{FieldQuery, QueryEngine, ReadMode, TextAndMarkup};
pub use normalize::normalize_text;
pub use notation::SelectorSpec;
pub use recipe::FieldRecipe;
pub use resolve::{CompactChainPlan, Navigation, Operator, QueryPlan};
