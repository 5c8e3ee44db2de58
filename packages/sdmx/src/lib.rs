//! SDMX REST client - Fetch code lists, dataflows and time series from SDMX-ML web services.
//!
//! This crate talks to SDMX 2.0 REST endpoints (the ECB Statistical Data
//! Warehouse by default), parses the returned SDMX-ML documents and turns them
//! into plain mappings: code lists, dataflow definitions, concepts, category
//! schemes, organisation schemes and sorted time series.
//!
//! # Example
//!
//! ```
//! use sdmx_rest::{normalize, ClientConfig, Frequency};
//!
//! // Validate a service configuration
//! assert!(ClientConfig::new("http://sdw-ws.ecb.europa.eu", "ECB").is_ok());
//! assert!(ClientConfig::new("not a url", "ECB").is_err());
//!
//! // Periods are normalized to the first day of their month
//! let date = normalize("2020-Q2", Frequency::Quarterly).unwrap();
//! assert_eq!(date.to_string(), "2020-06-01");
//! ```
//!
//! # Architecture
//!
//! The client is organized into several modules:
//!
//! - [`config`]: Service configuration, validation and URL construction
//! - [`error`]: Error types and Result alias
//! - [`period`]: Frequency codes and period normalization
//! - [`xml`]: Owned, namespace-aware XML tree with path queries and recovery
//! - [`http`]: Document sources, including the HTTP one
//! - [`model`]: Extracted records (codes, dataflows, series, ...)
//! - [`extract`]: Per-kind document walks with memoized results
//! - [`client`]: Facade caching one extractor per requested resource
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod model;
pub mod period;
pub mod xml;

// Re-export commonly used items
pub use client::SdmxClient;
pub use config::{ClientConfig, DataQuery};
pub use error::{Result, SdmxError};
pub use extract::{Artifact, Extractor};
pub use http::{DocumentSource, HttpSource};
pub use period::{normalize, Frequency};
pub use xml::Document;
