//! Configuration constants, validation and resource URL construction.

use std::time::Duration;

use url::Url;

use crate::error::{Result, SdmxError};

/// Base URL of the ECB statistical data warehouse SDMX service.
pub const DEFAULT_BASE_URL: &str = "http://sdw-ws.ecb.europa.eu";

/// Agency maintaining the artifacts served by [`DEFAULT_BASE_URL`].
pub const DEFAULT_AGENCY_ID: &str = "ECB";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 20;

/// Default maximum HTTP response size in bytes (100 MB).
///
/// Unfiltered GenericData queries can be very large; the limit keeps a
/// single call from exhausting memory.
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 100 * 1024 * 1024;

/// Observation status used when an observation carries no OBS_STATUS attribute.
pub const DEFAULT_OBS_STATUS: &str = "A";

/// Structural resource types served under `{base}/{ResourceType}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Dataflow,
    OrganisationScheme,
    Concept,
    CodeList,
    KeyFamily,
    CategoryScheme,
}

impl Resource {
    /// Path segment for this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataflow => "Dataflow",
            Self::OrganisationScheme => "OrganisationScheme",
            Self::Concept => "Concept",
            Self::CodeList => "CodeList",
            Self::KeyFamily => "KeyFamily",
            Self::CategoryScheme => "CategoryScheme",
        }
    }
}

/// Connection settings for an [`SdmxClient`](crate::client::SdmxClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root without trailing slash.
    pub base_url: String,

    /// Agency appended to agency-scoped resource paths.
    pub agency_id: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Largest response body accepted, in bytes.
    pub max_response_size: u64,
}

impl ClientConfig {
    /// Create a validated configuration with default timeout and size limit.
    ///
    /// # Examples
    /// ```
    /// use sdmx_rest::config::ClientConfig;
    ///
    /// let config = ClientConfig::new("http://sdw-ws.ecb.europa.eu/", "ECB").unwrap();
    /// assert_eq!(config.base_url, "http://sdw-ws.ecb.europa.eu");
    /// assert!(ClientConfig::new("not a url", "ECB").is_err());
    /// ```
    pub fn new(base_url: &str, agency_id: &str) -> Result<Self> {
        validate_base_url(base_url)?;
        validate_agency_id(agency_id)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agency_id: agency_id.to_string(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the response size limit.
    #[must_use]
    pub fn with_max_response_size(mut self, bytes: u64) -> Self {
        self.max_response_size = bytes;
        self
    }
}

/// Validate that a base URL is an absolute http or https URL.
///
/// # Examples
/// ```
/// use sdmx_rest::config::validate_base_url;
///
/// assert!(validate_base_url("https://example.org/sdmx").is_ok());
/// assert!(validate_base_url("ftp://example.org").is_err());
/// ```
pub fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed =
        Url::parse(base_url).map_err(|_| SdmxError::InvalidBaseUrl(base_url.to_string()))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => {}
        _ => return Err(SdmxError::InvalidBaseUrl(base_url.to_string())),
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(SdmxError::InvalidBaseUrl(base_url.to_string()));
    }

    Ok(())
}

/// Validate an agency identifier (non-empty, usable as one path segment).
pub fn validate_agency_id(agency_id: &str) -> Result<()> {
    if agency_id.is_empty() || agency_id.chars().any(is_reserved) {
        return Err(SdmxError::InvalidAgency(agency_id.to_string()));
    }
    Ok(())
}

/// Validate a value that is placed verbatim in a path segment or query string.
///
/// SDMX key syntax (`USD+GBP`, `M.USD.EUR`) passes; anything that would end
/// the segment or start another query parameter does not.
///
/// # Examples
/// ```
/// use sdmx_rest::config::validate_parameter;
///
/// assert!(validate_parameter("key", "USD+GBP").is_ok());
/// assert!(validate_parameter("dataflow", "EXR&FREQ=D").is_err());
/// ```
pub fn validate_parameter(name: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.chars().any(is_reserved) {
        return Err(SdmxError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn is_reserved(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '?' | '#' | '&' | '=')
}

/// Build a structural resource URL.
///
/// Shape: `{base}/{ResourceType}[/{resource_id}][/{agency_id}]`.
///
/// # Examples
/// ```
/// use sdmx_rest::config::{resource_url, Resource};
///
/// assert_eq!(
///     resource_url("http://host", Resource::CodeList, Some("EXR"), Some("ECB")).unwrap(),
///     "http://host/CodeList/EXR/ECB"
/// );
/// assert!(resource_url("http://host", Resource::Dataflow, Some("EXR/../x"), None).is_err());
/// ```
pub fn resource_url(
    base_url: &str,
    resource: Resource,
    resource_id: Option<&str>,
    agency_id: Option<&str>,
) -> Result<String> {
    let mut url = format!("{}/{}", base_url.trim_end_matches('/'), resource.as_str());

    if let Some(id) = resource_id {
        validate_parameter("resource identifier", id)?;
        url.push('/');
        url.push_str(id);
    }
    if let Some(agency) = agency_id {
        validate_agency_id(agency)?;
        url.push('/');
        url.push_str(agency);
    }

    Ok(url)
}

/// Parameters of a GenericData query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataQuery {
    /// Dataflow to query (e.g., "EXR").
    pub flow_ref: String,

    /// Frequency code (FREQ dimension).
    pub freq: Option<String>,

    /// Series key value, sent as the CURRENCY dimension.
    pub key: Option<String>,

    /// First period to include.
    pub start_period: Option<String>,

    /// Last period to include.
    pub end_period: Option<String>,
}

impl DataQuery {
    /// Unfiltered query for a whole dataflow.
    #[must_use]
    pub fn new(flow_ref: impl Into<String>) -> Self {
        Self {
            flow_ref: flow_ref.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_freq(mut self, freq: impl Into<String>) -> Self {
        self.freq = Some(freq.into());
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Restrict the query to a period range.
    #[must_use]
    pub fn with_period(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_period = Some(start.into());
        self.end_period = Some(end.into());
        self
    }

    /// Whether enough filters are present to build a filtered query.
    ///
    /// FREQ, start and end must all be set; the key alone never filters.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.freq.is_some() && self.start_period.is_some() && self.end_period.is_some()
    }
}

/// Build a GenericData query URL.
///
/// Filter parameters are appended only when [`DataQuery::is_filtered`]
/// holds, always in the order FREQ, CURRENCY, startTime, endTime. Every value
/// is checked with [`validate_parameter`]; a filtered query without a key
/// sends an empty CURRENCY.
///
/// # Examples
/// ```
/// use sdmx_rest::config::{data_url, DataQuery};
///
/// assert_eq!(
///     data_url("http://host", &DataQuery::new("EXR")).unwrap(),
///     "http://host/GenericData?dataflow=EXR"
/// );
/// ```
pub fn data_url(base_url: &str, query: &DataQuery) -> Result<String> {
    validate_parameter("dataflow", &query.flow_ref)?;
    let mut url = format!(
        "{}/GenericData?dataflow={}",
        base_url.trim_end_matches('/'),
        query.flow_ref
    );

    if query.is_filtered() {
        let freq = query.freq.as_deref().unwrap_or_default();
        let start = query.start_period.as_deref().unwrap_or_default();
        let end = query.end_period.as_deref().unwrap_or_default();
        validate_parameter("frequency", freq)?;
        validate_parameter("start period", start)?;
        validate_parameter("end period", end)?;

        let key = query.key.as_deref().unwrap_or_default();
        if !key.is_empty() {
            validate_parameter("key", key)?;
        }

        url.push_str(&format!(
            "&FREQ={freq}&CURRENCY={key}&startTime={start}&endTime={end}"
        ));
    }

    Ok(url)
}

/// Build the URL of the service's WSDL description.
pub fn service_description_url(base_url: &str) -> String {
    format!("{}/services/SDMXQuery?wsdl", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url_valid() {
        assert!(validate_base_url("http://sdw-ws.ecb.europa.eu").is_ok());
        assert!(validate_base_url("https://example.org/sdmx/rest/").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
    }

    #[test]
    fn test_validate_base_url_invalid() {
        assert!(validate_base_url("").is_err());
        assert!(validate_base_url("sdw-ws.ecb.europa.eu").is_err());
        assert!(validate_base_url("ftp://example.org").is_err());
        assert!(validate_base_url("http://example.org?x=1").is_err());
        assert!(validate_base_url("file:///tmp/sdmx").is_err());
    }

    #[test]
    fn test_validate_agency_id() {
        assert!(validate_agency_id("ECB").is_ok());
        assert!(validate_agency_id("SDMX").is_ok());
        assert!(validate_agency_id("").is_err());
        assert!(validate_agency_id("EC B").is_err());
        assert!(validate_agency_id("ECB/1").is_err());
    }

    #[test]
    fn test_client_config_trims_trailing_slash() {
        let config = ClientConfig::new("http://host/sdmx//", "ECB").unwrap();
        assert_eq!(config.base_url, "http://host/sdmx");
        assert_eq!(config.timeout, Duration::from_secs(HTTP_TIMEOUT_SECS));
        assert_eq!(config.max_response_size, DEFAULT_MAX_RESPONSE_SIZE);
    }

    #[test]
    fn test_client_config_overrides() {
        let config = ClientConfig::new("http://host", "ECB")
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .with_max_response_size(1024);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_response_size, 1024);
    }

    #[test]
    fn test_resource_url() {
        assert_eq!(
            resource_url("http://host", Resource::Dataflow, None, None).unwrap(),
            "http://host/Dataflow"
        );
        assert_eq!(
            resource_url("http://host", Resource::Dataflow, Some("EXR"), None).unwrap(),
            "http://host/Dataflow/EXR"
        );
        assert_eq!(
            resource_url("http://host/", Resource::Concept, Some("EXR"), Some("ECB")).unwrap(),
            "http://host/Concept/EXR/ECB"
        );
    }

    #[test]
    fn test_data_url_unfiltered() {
        assert_eq!(
            data_url("http://host", &DataQuery::new("EXR")).unwrap(),
            "http://host/GenericData?dataflow=EXR"
        );
    }

    #[test]
    fn test_data_url_filtered() {
        let query = DataQuery::new("EXR")
            .with_freq("M")
            .with_key("USD")
            .with_period("2020-01", "2020-12");
        assert_eq!(
            data_url("http://host", &query).unwrap(),
            "http://host/GenericData?dataflow=EXR&FREQ=M&CURRENCY=USD&startTime=2020-01&endTime=2020-12"
        );
    }

    #[test]
    fn test_data_url_partial_filters_are_ignored() {
        // Key and start without FREQ/end do not filter
        let query = DataQuery {
            flow_ref: "EXR".to_string(),
            freq: None,
            key: Some("USD".to_string()),
            start_period: Some("2020".to_string()),
            end_period: None,
        };
        assert!(!query.is_filtered());
        assert_eq!(
            data_url("http://host", &query).unwrap(),
            "http://host/GenericData?dataflow=EXR"
        );
    }

    #[test]
    fn test_data_url_filtered_without_key() {
        let query = DataQuery::new("EXR").with_freq("A").with_period("2000", "2010");
        assert_eq!(
            data_url("http://host", &query).unwrap(),
            "http://host/GenericData?dataflow=EXR&FREQ=A&CURRENCY=&startTime=2000&endTime=2010"
        );
    }

    #[test]
    fn test_data_url_sdmx_key_syntax_passes() {
        let query = DataQuery::new("EXR")
            .with_freq("M")
            .with_key("USD+GBP")
            .with_period("2020-01", "2020-12");
        assert!(data_url("http://host", &query)
            .unwrap()
            .contains("&CURRENCY=USD+GBP&"));
    }

    #[test]
    fn test_data_url_rejects_injected_parameters() {
        let injected = DataQuery::new("EXR&FREQ=D");
        assert!(matches!(
            data_url("http://host", &injected),
            Err(SdmxError::InvalidParameter { ref name, .. }) if name == "dataflow"
        ));

        let query = DataQuery::new("EXR")
            .with_freq("M")
            .with_key("USD&startTime=1999")
            .with_period("2020-01", "2020-12");
        assert!(data_url("http://host", &query).is_err());

        let query = DataQuery::new("EXR").with_freq("M").with_period("2020-01", "2020-12#x");
        assert!(data_url("http://host", &query).is_err());
    }

    #[test]
    fn test_resource_url_rejects_unsafe_identifiers() {
        for id in ["", "EXR/ECB", "EXR?x=1", "EXR#top", "E X R"] {
            assert!(
                resource_url("http://host", Resource::Dataflow, Some(id), None).is_err(),
                "expected {id:?} to be rejected"
            );
        }
        assert!(resource_url("http://host", Resource::CodeList, Some("EXR"), Some("E/CB")).is_err());
    }

    #[test]
    fn test_service_description_url() {
        assert_eq!(
            service_description_url("http://host/"),
            "http://host/services/SDMXQuery?wsdl"
        );
    }
}
