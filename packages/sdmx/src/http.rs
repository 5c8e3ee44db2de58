//! HTTP document fetching.
//!
//! The client talks to the service through the [`DocumentSource`] trait so
//! that tests can substitute canned documents for network access.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::{ClientConfig, DEFAULT_MAX_RESPONSE_SIZE, HTTP_TIMEOUT_SECS};
use crate::error::{Result, SdmxError};
use crate::xml::Document;

/// User agent string identifying this client.
const USER_AGENT: &str = concat!("sdmx-rest/", env!("CARGO_PKG_VERSION"));

/// Source of parsed SDMX documents, addressed by URL.
pub trait DocumentSource: Send + Sync {
    /// Fetch and parse the document at `url`.
    ///
    /// # Errors
    /// [`SdmxError::ServiceUnavailable`] when the service cannot be reached
    /// or answers with a non-success status.
    fn fetch(&self, url: &str) -> Result<Document>;
}

impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    fn fetch(&self, url: &str) -> Result<Document> {
        (**self).fetch(url)
    }
}

/// [`DocumentSource`] backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    max_response_size: u64,
}

impl HttpSource {
    /// Create a source with the default timeout and size limit.
    pub fn new() -> Result<Self> {
        Self::with_limits(
            Duration::from_secs(HTTP_TIMEOUT_SECS),
            DEFAULT_MAX_RESPONSE_SIZE,
        )
    }

    /// Create a source using the timeout and size limit of `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::with_limits(config.timeout, config.max_response_size)
    }

    fn with_limits(timeout: Duration, max_response_size: u64) -> Result<Self> {
        Ok(Self {
            client: create_client(timeout)?,
            max_response_size,
        })
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Document> {
        let bytes = download_bytes(&self.client, url, self.max_response_size)?;
        Document::parse(&bytes_to_string(&bytes, url))
    }
}

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with the given timeout and user agent.
pub fn create_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download content from a URL.
///
/// A single attempt is made; any failure is terminal for the call.
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to download from
/// * `max_size` - Largest accepted body in bytes
///
/// # Returns
/// Raw bytes of the response body
pub fn download_bytes(client: &Client, url: &str, max_size: u64) -> Result<Vec<u8>> {
    tracing::debug!(url, "Requesting SDMX resource");

    let response = client.get(url).send().map_err(|e| {
        tracing::warn!(url, error = %e, "Request failed");
        SdmxError::ServiceUnavailable {
            url: url.to_string(),
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url, status = %status, "Service returned an error status");
        return Err(SdmxError::ServiceUnavailable {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        });
    }

    if let Some(length) = response.content_length() {
        if length > max_size {
            return Err(SdmxError::ResponseTooLarge {
                url: url.to_string(),
                size: length,
                limit: max_size,
            });
        }
    }

    let bytes = response.bytes().map_err(|e| SdmxError::ServiceUnavailable {
        url: url.to_string(),
        status: Some(status.as_u16()),
        message: e.to_string(),
    })?;

    // Content-Length may be absent for chunked responses
    let size = bytes.len() as u64;
    if size > max_size {
        return Err(SdmxError::ResponseTooLarge {
            url: url.to_string(),
            size,
            limit: max_size,
        });
    }

    tracing::debug!(url, bytes = size, "Downloaded SDMX resource");
    Ok(bytes.to_vec())
}

/// Decode a response body as UTF-8, replacing invalid sequences.
///
/// # Arguments
/// * `bytes` - Raw response body
/// * `context` - Description of the resource, used in the warning
pub fn bytes_to_string(bytes: &[u8], context: &str) -> String {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!(context, "Response is not valid UTF-8, replacing invalid sequences");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let client = create_client(Duration::from_secs(HTTP_TIMEOUT_SECS));
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_source_from_config() {
        let config = ClientConfig::new("http://localhost", "ECB").unwrap();
        assert!(HttpSource::from_config(&config).is_ok());
    }

    #[test]
    fn test_bytes_to_string_valid() {
        assert_eq!(bytes_to_string("<a>é</a>".as_bytes(), "test"), "<a>é</a>");
    }

    #[test]
    fn test_bytes_to_string_lossy() {
        let bytes = [b'<', b'a', b'>', 0xff, b'<', b'/', b'a', b'>'];
        assert_eq!(bytes_to_string(&bytes, "test"), "<a>\u{fffd}</a>");
    }
}
