//! Error types for the SDMX client.
//!
//! A single `SdmxError` covers transport, document and extraction failures
//! so that callers can match on the kind of failure without downcasting.

use thiserror::Error;

/// Main error type for the SDMX client library.
#[derive(Debug, Error)]
pub enum SdmxError {
    /// Base URL of the service is not an absolute http(s) URL.
    #[error("Invalid base URL: '{0}'. Expected an absolute http(s) URL (e.g., http://sdw-ws.ecb.europa.eu)")]
    InvalidBaseUrl(String),

    /// Agency identifier is empty or cannot be used as a path segment.
    #[error("Invalid agency identifier: '{0}'")]
    InvalidAgency(String),

    /// A resource identifier or query value would alter the URL it is placed in.
    #[error("Invalid {name}: '{value}'. Identifiers and query values may not contain whitespace or any of / ? # & =")]
    InvalidParameter { name: String, value: String },

    /// The service could not be reached or answered with a non-success status.
    #[error("Service unavailable at {url}{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    ServiceUnavailable {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Response body exceeds the configured size limit.
    #[error("Response from {url} is {size} bytes, exceeding the limit of {limit} bytes")]
    ResponseTooLarge { url: String, size: u64, limit: u64 },

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// XML parsing failed, even after recovery.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Document is well-formed XML but not a usable SDMX message.
    #[error("Malformed SDMX document: {0}")]
    MalformedDocument(String),

    /// Missing required XML element or attribute.
    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },

    /// A lookup path uses a prefix the document does not declare.
    #[error("Namespace prefix '{0}' is not declared on the document root")]
    UnboundPrefix(String),

    /// A lookup path could not be parsed.
    #[error("Invalid element path: '{0}'")]
    InvalidPath(String),

    /// Frequency code other than A, Q or M.
    #[error("Unsupported frequency: '{0}'. Expected one of A, Q, M")]
    UnsupportedFrequency(String),

    /// Period text does not match the shape required by its frequency.
    #[error("Malformed period '{period}' for {frequency} frequency")]
    MalformedPeriod { period: String, frequency: String },

    /// Series key carries no FREQ dimension.
    #[error("Series {series} has no FREQ dimension")]
    MissingFrequency { series: String },

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    Serialization(#[from] serde_yaml_ng::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdmxError {
    /// Shorthand for a [`SdmxError::MissingField`].
    pub fn missing(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// HTTP status attached to a [`SdmxError::ServiceUnavailable`], if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServiceUnavailable { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for SDMX operations.
pub type Result<T> = std::result::Result<T, SdmxError>;
