//! Collection extraction
//!
//! Either a plain list of values (one per matched element) or a list of
//! records, one per anchor element, with every field evaluated through its
//! [`FieldRecipe`]. A failing field leaves `""` in its slot and is reported
//! once; the other fields and records are unaffected.

use crate::dom::{DocumentAccessor, Scope};
use crate::error::Result;
use crate::query::engine::{FieldQuery, QueryEngine};
use crate::query::recipe::FieldRecipe;
use crate::query::resolve::Navigation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One extracted record, in field declaration order
pub type Record = IndexMap<String, String>;

/// Options for a single collection call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectOptions {
    /// Field whose last non-empty value is copied into later records where it is empty
    #[serde(default)]
    pub sticky_field: Option<String>,

    /// Drop records (or list values) whose own values are all empty
    #[serde(default)]
    pub drop_empty_records: bool,
}

impl CollectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: designate the sticky marker field
    pub fn sticky_field(mut self, field: impl Into<String>) -> Self {
        self.sticky_field = Some(field.into());
        self
    }

    /// Builder method: drop all-empty records
    pub fn drop_empty_records(mut self, drop: bool) -> Self {
        self.drop_empty_records = drop;
        self
    }
}

/// Carry-over state for the sticky marker field, scoped to one collection call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickyState {
    field: String,
    current: Option<String>,
}

impl StickyState {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into(), current: None }
    }

    /// The value later records will inherit
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Remember a non-empty marker, or fill an empty one from the last remembered value
    pub fn apply(&mut self, record: &mut Record) {
        let Some(value) = record.get_mut(&self.field) else {
            return;
        };

        if value.is_empty() {
            if let Some(current) = &self.current {
                value.clone_from(current);
            }
        } else {
            self.current = Some(value.clone());
        }
    }
}

/// A field that could not be compiled or evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

/// Output of a record extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub records: Vec<Record>,
    pub failures: Vec<FieldFailure>,
}

/// Compiled field map evaluated once per anchor
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    fields: IndexMap<String, Option<FieldRecipe>>,
    compile_failures: Vec<FieldFailure>,
    options: CollectOptions,
}

impl RecordExtractor {
    pub fn new(options: CollectOptions) -> Self {
        Self { options, ..Self::default() }
    }

    /// Builder method: add a compiled field
    pub fn field(mut self, name: impl Into<String>, recipe: FieldRecipe) -> Self {
        self.fields.insert(name.into(), Some(recipe));
        self
    }

    /// Add a field from a compile result; a failed compile keeps an always-empty slot
    pub fn add(&mut self, name: impl Into<String>, recipe: Result<FieldRecipe>) {
        let name = name.into();
        match recipe {
            Ok(recipe) => {
                self.fields.insert(name, Some(recipe));
            }
            Err(e) => {
                log::warn!("Field '{}' has an invalid recipe: {}", name, e);
                self.compile_failures.push(FieldFailure { field: name.clone(), message: e.to_string() });
                self.fields.insert(name, None);
            }
        }
    }

    /// Names of all declared fields, in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn options(&self) -> &CollectOptions {
        &self.options
    }

    /// The sticky field, when it names no declared field
    pub fn unknown_sticky_field(&self) -> Option<&str> {
        self.options.sticky_field.as_deref().filter(|field| !self.fields.contains_key(*field))
    }

    /// Extract one record per anchor matched by `anchors`.
    ///
    /// Anchors whose navigation dead-ends are skipped. Only a failure to list
    /// the anchors is returned as an error.
    pub fn extract<D: DocumentAccessor>(&self, engine: &QueryEngine<'_, D>, anchors: &Navigation) -> Result<RecordSet> {
        let anchors: Vec<D::Element> = engine.locate_all(Scope::Document, anchors)?.into_iter().flatten().collect();
        log::debug!("Extracting {} field(s) from {} anchor(s)", self.fields.len(), anchors.len());

        let mut failures: IndexMap<String, String> = self
            .compile_failures
            .iter()
            .map(|failure| (failure.field.clone(), failure.message.clone()))
            .collect();
        let mut sticky = self.options.sticky_field.as_deref().map(StickyState::new);
        let mut records = Vec::with_capacity(anchors.len());

        for anchor in &anchors {
            let mut record = Record::with_capacity(self.fields.len());

            for (name, recipe) in &self.fields {
                let value = match recipe.as_ref().map(|recipe| recipe.evaluate(engine, anchor)) {
                    Some(Ok(value)) => value,
                    Some(Err(e)) => {
                        if !failures.contains_key(name) {
                            log::warn!("Field '{}' failed: {}", name, e);
                            failures.insert(name.clone(), e.to_string());
                        }
                        String::new()
                    }
                    None => String::new(),
                };
                record.insert(name.clone(), value);
            }

            if self.options.drop_empty_records && record.values().all(String::is_empty) {
                continue;
            }
            if let Some(sticky) = sticky.as_mut() {
                sticky.apply(&mut record);
            }
            records.push(record);
        }

        Ok(RecordSet {
            records,
            failures: failures.into_iter().map(|(field, message)| FieldFailure { field, message }).collect(),
        })
    }
}

/// Plain collection: one value per match, in document order
pub fn collect_values<D: DocumentAccessor>(
    engine: &QueryEngine<'_, D>,
    query: &FieldQuery,
    options: &CollectOptions,
) -> Result<Vec<String>> {
    let mut values = engine.extract_all(query)?;
    if options.drop_empty_records {
        values.retain(|value| !value.is_empty());
    }
    Ok(values)
}
