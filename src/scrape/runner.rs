use crate::dom::DocumentAccessor;
use crate::error::Result;
use crate::query::{CollectOptions, FieldQuery, QueryEngine, ReadMode, RecordExtractor, TextAndMarkup, collect_values};
use crate::scrape::request::{CollectField, ExtractionRequest, GetField};
use crate::scrape::response::{Collected, Extraction, FieldValue};

const LINKS_QUERY: &str = "a[href](href)";
const IMAGES_QUERY: &str = "img[src](src)";

/// Runs an [`ExtractionRequest`] against one document.
///
/// Every field is compiled and executed on its own: a notation error or
/// accessor failure leaves that field empty and is reported under
/// [`Extraction::errors`], never aborting the rest of the pass.
pub struct Extractor<'d, D: DocumentAccessor> {
    engine: QueryEngine<'d, D>,
    drop_empty_default: bool,
}

impl<'d, D: DocumentAccessor> Extractor<'d, D> {
    pub fn new(doc: &'d D) -> Self {
        Self { engine: QueryEngine::new(doc), drop_empty_default: false }
    }

    /// Builder method: default for collections that do not set `drop_empty`
    pub fn drop_empty_default(mut self, drop: bool) -> Self {
        self.drop_empty_default = drop;
        self
    }

    /// Run the whole request
    pub fn run(&self, request: &ExtractionRequest) -> Extraction {
        log::info!("Extracting {} get field(s) and {} collection(s)", request.get.len(), request.collect.len());
        let include_html = request.include_html;
        let mut extraction = Extraction::default();

        for (name, field) in &request.get {
            let value = self.get_value(field, include_html).unwrap_or_else(|e| {
                log::warn!("get.{} failed: {}", name, e);
                extraction.errors.insert(format!("get.{}", name), e.to_string());
                if include_html { TextAndMarkup::default().into() } else { FieldValue::default() }
            });
            extraction.data.get.insert(name.clone(), value);
        }

        for (name, field) in &request.collect {
            let collected = self.collect(name, field, include_html, &mut extraction).unwrap_or_else(|e| {
                log::warn!("collect.{} failed: {}", name, e);
                extraction.errors.insert(format!("collect.{}", name), e.to_string());
                match field.fields {
                    Some(_) => Collected::Records(Vec::new()),
                    None if include_html => Collected::TextAndMarkup(Vec::new()),
                    None => Collected::Values(Vec::new()),
                }
            });
            extraction.data.collect.insert(name.clone(), collected);
        }

        if request.extract_links {
            match self.links() {
                Ok(links) => extraction.links = Some(links),
                Err(e) => {
                    log::warn!("Link extraction failed: {}", e);
                    extraction.errors.insert("links".to_string(), e.to_string());
                }
            }
        }

        if request.extract_images {
            match self.images() {
                Ok(images) => extraction.images = Some(images),
                Err(e) => {
                    log::warn!("Image extraction failed: {}", e);
                    extraction.errors.insert("images".to_string(), e.to_string());
                }
            }
        }

        if request.debug {
            match self.engine.document().document_markup() {
                Ok(markup) => extraction.debug_html = Some(markup),
                Err(e) => {
                    extraction.errors.insert("debug_html".to_string(), e.to_string());
                }
            }
        }

        extraction
    }

    /// Single value for one `get` field; text reads also carry markup when `include_html` is set
    pub fn get_value(&self, field: &GetField, include_html: bool) -> Result<FieldValue> {
        let query = field.compile()?;
        if include_html && query.read == ReadMode::Text {
            return self.engine.extract_text_and_markup(&query.navigation).map(FieldValue::from);
        }
        self.engine.extract_one(&query).map(FieldValue::from)
    }

    /// One `collect` entry; field-level record failures go to `extraction.errors`
    fn collect(
        &self,
        name: &str,
        field: &CollectField,
        include_html: bool,
        extraction: &mut Extraction,
    ) -> Result<Collected> {
        let options = field.options(self.drop_empty_default);

        let Some(fields) = &field.fields else {
            if let Some(sticky) = &options.sticky_field {
                extraction.errors.insert(
                    format!("collect.{}", name),
                    format!("sticky field '{}' needs a record collection with fields", sticky),
                );
            }

            let query = FieldQuery::parse(&field.selector)?;
            if include_html && query.read == ReadMode::Text {
                let mut values = self.engine.extract_all_text_and_markup(&query.navigation)?;
                if options.drop_empty_records {
                    values.retain(|value| !value.is_empty());
                }
                return Ok(Collected::TextAndMarkup(values));
            }
            return collect_values(&self.engine, &query, &options).map(Collected::Values);
        };

        let anchors = field.anchors()?;
        let mut extractor = RecordExtractor::new(options);
        for (field_name, recipe) in fields {
            extractor.add(field_name.clone(), recipe.compile());
        }

        if let Some(sticky) = extractor.unknown_sticky_field() {
            log::warn!("collect.{}: sticky field '{}' is not declared", name, sticky);
            extraction
                .errors
                .insert(format!("collect.{}", name), format!("sticky field '{}' is not one of the declared fields", sticky));
        }

        let set = extractor.extract(&self.engine, &anchors)?;
        for failure in set.failures {
            extraction.errors.insert(format!("collect.{}.{}", name, failure.field), failure.message);
        }
        Ok(Collected::Records(set.records))
    }

    /// Every non-empty `href` in document order
    pub fn links(&self) -> Result<Vec<String>> {
        let query = FieldQuery::parse(LINKS_QUERY)?;
        collect_values(&self.engine, &query, &CollectOptions::new().drop_empty_records(true))
    }

    /// Every non-empty image `src` in document order
    pub fn images(&self) -> Result<Vec<String>> {
        let query = FieldQuery::parse(IMAGES_QUERY)?;
        collect_values(&self.engine, &query, &CollectOptions::new().drop_empty_records(true))
    }
}
