//! Client facade tying URL construction, fetching and extraction together.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{
    data_url, resource_url, service_description_url, ClientConfig, DataQuery, Resource,
};
use crate::error::Result;
use crate::extract::{
    Artifact, CategorySchemeExtractor, CodeListExtractor, ConceptExtractor, DataflowExtractor,
    Extractor, KeyFamilyExtractor, OrganisationSchemeExtractor, ServiceDescriptionExtractor,
    TimeSeriesExtractor,
};
use crate::http::{DocumentSource, HttpSource};

/// Extractors of one artifact kind, keyed by the URL they were fetched from.
type Slot<A> = Mutex<HashMap<String, Arc<Extractor<A>>>>;

/// Client for one SDMX service and agency.
///
/// Every call builds the resource URL, fetches it through the configured
/// [`DocumentSource`] and wraps the document in the matching extractor.
/// Extractors are cached per URL for the lifetime of the client, so repeated
/// calls with the same arguments issue a single request while calls with
/// different resource identifiers are fetched separately.
///
/// The cache lock is not held while fetching: two threads racing on the same
/// uncached URL may both fetch it, and both receive the extractor that was
/// stored first.
///
/// # Example
///
/// ```no_run
/// use sdmx_rest::{ClientConfig, SdmxClient};
///
/// let client = SdmxClient::new(ClientConfig::new("http://sdw-ws.ecb.europa.eu", "ECB")?)?;
/// let code_lists = client.code_list("EXR")?;
/// for (name, codes) in code_lists.extract()? {
///     println!("{name}: {} codes", codes.len());
/// }
/// # Ok::<(), sdmx_rest::SdmxError>(())
/// ```
pub struct SdmxClient {
    config: ClientConfig,
    source: Box<dyn DocumentSource>,
    dataflows: Slot<crate::extract::Dataflows>,
    organisation_schemes: Slot<crate::extract::OrganisationSchemes>,
    concepts: Slot<crate::extract::Concepts>,
    code_lists: Slot<crate::extract::CodeLists>,
    key_families: Slot<crate::extract::KeyFamilies>,
    category_schemes: Slot<crate::extract::CategorySchemes>,
    data: Slot<crate::extract::GenericData>,
    service_descriptions: Slot<crate::extract::ServiceDescription>,
}

impl SdmxClient {
    /// Create a client that fetches over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let source = HttpSource::from_config(&config)?;
        Ok(Self::with_source(config, source))
    }

    /// Create a client with a custom document source.
    pub fn with_source(config: ClientConfig, source: impl DocumentSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
            dataflows: Slot::default(),
            organisation_schemes: Slot::default(),
            concepts: Slot::default(),
            code_lists: Slot::default(),
            key_families: Slot::default(),
            category_schemes: Slot::default(),
            data: Slot::default(),
            service_descriptions: Slot::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dataflows: `{base}/Dataflow[/{resource_id}]`.
    pub fn dataflow(&self, resource_id: Option<&str>) -> Result<Arc<DataflowExtractor>> {
        let url = resource_url(&self.config.base_url, Resource::Dataflow, resource_id, None)?;
        self.cached(&self.dataflows, url)
    }

    /// Organisation schemes: `{base}/OrganisationScheme`.
    pub fn organisation_scheme(&self) -> Result<Arc<OrganisationSchemeExtractor>> {
        let url = resource_url(
            &self.config.base_url,
            Resource::OrganisationScheme,
            None,
            None,
        )?;
        self.cached(&self.organisation_schemes, url)
    }

    /// Concepts: `{base}/Concept[/{flow_ref}/{agency}]`.
    pub fn concept(&self, flow_ref: Option<&str>) -> Result<Arc<ConceptExtractor>> {
        let agency = flow_ref.map(|_| self.config.agency_id.as_str());
        let url = resource_url(&self.config.base_url, Resource::Concept, flow_ref, agency)?;
        self.cached(&self.concepts, url)
    }

    /// Code lists of a dataflow: `{base}/CodeList/{flow_ref}/{agency}`.
    pub fn code_list(&self, flow_ref: &str) -> Result<Arc<CodeListExtractor>> {
        let url = resource_url(
            &self.config.base_url,
            Resource::CodeList,
            Some(flow_ref),
            Some(&self.config.agency_id),
        )?;
        self.cached(&self.code_lists, url)
    }

    /// Key families: `{base}/KeyFamily[/{flow_ref}]`.
    pub fn key_family(&self, flow_ref: Option<&str>) -> Result<Arc<KeyFamilyExtractor>> {
        let url = resource_url(&self.config.base_url, Resource::KeyFamily, flow_ref, None)?;
        self.cached(&self.key_families, url)
    }

    /// Category schemes: `{base}/CategoryScheme[/{flow_ref}]`.
    pub fn category_scheme(
        &self,
        flow_ref: Option<&str>,
    ) -> Result<Arc<CategorySchemeExtractor>> {
        let url = resource_url(
            &self.config.base_url,
            Resource::CategoryScheme,
            flow_ref,
            None,
        )?;
        self.cached(&self.category_schemes, url)
    }

    /// Observation data: `{base}/GenericData?dataflow=...` (see [`data_url`]).
    pub fn data_extraction(&self, query: &DataQuery) -> Result<Arc<TimeSeriesExtractor>> {
        let url = data_url(&self.config.base_url, query)?;
        self.cached(&self.data, url)
    }

    /// Schema imports of the service's WSDL: `{base}/services/SDMXQuery?wsdl`.
    pub fn service_description(&self) -> Result<Arc<ServiceDescriptionExtractor>> {
        let url = service_description_url(&self.config.base_url);
        self.cached(&self.service_descriptions, url)
    }

    fn cached<A: Artifact>(&self, slot: &Slot<A>, url: String) -> Result<Arc<Extractor<A>>> {
        if let Some(extractor) = lock(slot).get(&url) {
            tracing::debug!(kind = A::KIND, url, "Using cached document");
            return Ok(Arc::clone(extractor));
        }

        let document = self.source.fetch(&url)?;
        let extractor = Arc::new(Extractor::new(document));

        let mut extractors = lock(slot);
        Ok(Arc::clone(extractors.entry(url).or_insert(extractor)))
    }
}

/// The map is only ever inserted into, so a poisoned lock still holds valid data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
