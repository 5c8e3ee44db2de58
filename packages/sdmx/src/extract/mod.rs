//! Structural extractors.
//!
//! Each SDMX artifact kind implements [`Artifact`], which knows how to walk
//! a parsed [`Document`] into that kind's mapping. [`Extractor`] pairs a
//! document with a single-assignment cache so the walk runs at most once
//! per instance.
//!
//! All walks are fail-fast: a missing required element or attribute aborts
//! the extraction with [`SdmxError::MissingField`](crate::error::SdmxError::MissingField).
//! The only defaulted field is the observation status.

mod category;
mod codelist;
mod concept;
mod dataflow;
mod organisation;
mod series;
mod service;

use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::error::Result;
use crate::model::TimeSeries;
use crate::xml::Document;

pub use category::CategorySchemes;
pub use codelist::{CodeLists, KeyFamilies};
pub use concept::Concepts;
pub use dataflow::Dataflows;
pub use organisation::OrganisationSchemes;
pub use series::GenericData;
pub use service::ServiceDescription;

/// An SDMX artifact kind and the walk that extracts it.
pub trait Artifact {
    /// Human-readable kind, used in logs and error context.
    const KIND: &'static str;

    /// Mapping produced by the walk.
    type Output: fmt::Debug + Send + Sync;

    /// Walk the document and build the mapping.
    fn walk(document: &Document) -> Result<Self::Output>;
}

/// A parsed document with a memoized extraction for one artifact kind.
pub struct Extractor<A: Artifact> {
    document: Document,
    cache: OnceLock<A::Output>,
    _kind: PhantomData<fn() -> A>,
}

impl<A: Artifact> Extractor<A> {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            cache: OnceLock::new(),
            _kind: PhantomData,
        }
    }

    /// The underlying document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Extract the mapping, walking the document on the first call only.
    ///
    /// A failed walk is not cached; since the document never changes,
    /// calling again fails the same way.
    pub fn extract(&self) -> Result<&A::Output> {
        if let Some(output) = self.cache.get() {
            return Ok(output);
        }

        let output = A::walk(&self.document)?;
        tracing::debug!(kind = A::KIND, "Extracted artifact");
        Ok(self.cache.get_or_init(|| output))
    }

    /// Whether [`extract`](Self::extract) has already succeeded.
    #[must_use]
    pub fn is_extracted(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl<A: Artifact> fmt::Debug for Extractor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("kind", &A::KIND)
            .field("extracted", &self.is_extracted())
            .finish_non_exhaustive()
    }
}

impl Extractor<GenericData> {
    /// Find a series by its dot-joined key (e.g., `M.USD.EUR.SP00.A`).
    ///
    /// Surrogate ids change from one extraction to the next; the series
    /// key is the stable way to look a series up.
    pub fn find_by_key(&self, key: &str) -> Result<Option<&TimeSeries>> {
        Ok(self
            .extract()?
            .values()
            .find(|series| series.dimensions.to_key_string() == key))
    }
}

pub type CodeListExtractor = Extractor<CodeLists>;
pub type KeyFamilyExtractor = Extractor<KeyFamilies>;
pub type DataflowExtractor = Extractor<Dataflows>;
pub type ConceptExtractor = Extractor<Concepts>;
pub type CategorySchemeExtractor = Extractor<CategorySchemes>;
pub type OrganisationSchemeExtractor = Extractor<OrganisationSchemes>;
pub type TimeSeriesExtractor = Extractor<GenericData>;
pub type ServiceDescriptionExtractor = Extractor<ServiceDescription>;
