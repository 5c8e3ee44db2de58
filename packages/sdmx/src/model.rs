//! Domain records extracted from SDMX-ML documents.
//!
//! Every artifact kind is exposed as an ordered map keyed by its identifier.
//! The records are plain data: they are computed once by an extractor and
//! never modified afterwards.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single code of a code list or key family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    /// Code value (e.g., "A").
    pub value: String,

    /// Human-readable description (e.g., "Annual").
    pub description: String,
}

impl Code {
    #[must_use]
    pub fn new(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
        }
    }
}

/// Code lists by name, codes in document order.
pub type CodeListMap = BTreeMap<String, Vec<Code>>;

/// A dataflow definition and the structures it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataflow {
    pub agency_id: String,
    pub version: String,
    pub name: String,
    pub key_family_id: String,
    pub key_family_agency_id: String,
    pub category_scheme_id: String,
    pub category_id: String,
}

/// Dataflows by id.
pub type DataflowMap = BTreeMap<String, Dataflow>;

/// A statistical concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub agency_id: String,
    pub version: String,
    pub name: String,
}

/// Concepts by id.
pub type ConceptMap = BTreeMap<String, Concept>;

/// Reference from a category to a dataflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataflowRef {
    pub agency_id: String,
    pub version: String,
    pub dataflow_id: String,
}

/// A category of a category scheme with the dataflows filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub dataflows: Vec<DataflowRef>,
}

/// Category schemes by name, categories flattened in document order.
pub type CategorySchemeMap = BTreeMap<String, Vec<Category>>;

/// A maintenance or reporting agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
}

impl Agency {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Organisation schemes by name.
pub type OrganisationSchemeMap = BTreeMap<String, Vec<Agency>>;

/// One data point of a time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Normalized period (see [`crate::period::normalize`]).
    pub timestamp: NaiveDate,

    /// Raw observation value as published.
    pub value: String,

    /// Observation status code, "A" when the service gives none.
    pub status: String,
}

impl Observation {
    /// The value as a number, when it parses as one.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use sdmx_rest::model::Observation;
    ///
    /// let obs = Observation {
    ///     timestamp: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    ///     value: "1.0876".to_string(),
    ///     status: "A".to_string(),
    /// };
    /// assert_eq!(obs.numeric_value(), Some(1.0876));
    /// ```
    #[must_use]
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// Series key: dimension values in the order the service lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesKey(Vec<(String, String)>);

impl SeriesKey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a dimension value; a repeated concept keeps its position and takes the new value.
    pub fn insert(&mut self, concept: impl Into<String>, value: impl Into<String>) {
        let concept = concept.into();
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == concept) {
            Some(entry) => entry.1 = value,
            None => self.0.push((concept, value)),
        }
    }

    /// Value of a dimension, e.g. `get("FREQ")`.
    #[must_use]
    pub fn get(&self, concept: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(c, _)| c == concept)
            .map(|(_, v)| v.as_str())
    }

    /// Dimensions as `(concept, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dot-joined values, e.g. `M.USD.EUR.SP00.A`.
    #[must_use]
    pub fn to_key_string(&self) -> String {
        self.0
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl<C: Into<String>, V: Into<String>> FromIterator<(C, V)> for SeriesKey {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut key = Self::new();
        for (concept, value) in iter {
            key.insert(concept, value);
        }
        key
    }
}

/// A time series: its key and its observations sorted by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub dimensions: SeriesKey,
    pub observations: Vec<Observation>,
}

/// Time series by surrogate id.
pub type TimeSeriesMap = BTreeMap<String, TimeSeries>;

/// An XML schema imported by the service description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaImport {
    pub namespace: String,
    pub schema_location: String,
}

/// Schema imports by namespace.
pub type SchemaImportMap = BTreeMap<String, SchemaImport>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_key_preserves_order() {
        let key: SeriesKey = [("FREQ", "M"), ("CURRENCY", "USD"), ("CURRENCY_DENOM", "EUR")]
            .into_iter()
            .collect();
        assert_eq!(key.to_key_string(), "M.USD.EUR");
        assert_eq!(key.get("CURRENCY"), Some("USD"));
        assert_eq!(key.get("EXR_TYPE"), None);
        assert_eq!(key.len(), 3);
    }

    #[test]
    fn test_series_key_repeated_concept() {
        let mut key = SeriesKey::new();
        key.insert("FREQ", "M");
        key.insert("CURRENCY", "USD");
        key.insert("FREQ", "Q");
        assert_eq!(key.to_key_string(), "Q.USD");
    }

    #[test]
    fn test_numeric_value() {
        let obs = |value: &str| Observation {
            timestamp: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            value: value.to_string(),
            status: "A".to_string(),
        };
        assert_eq!(obs("42").numeric_value(), Some(42.0));
        assert_eq!(obs(" -0.5 ").numeric_value(), Some(-0.5));
        assert_eq!(obs("").numeric_value(), None);
        assert!(obs("NaN").numeric_value().is_some_and(f64::is_nan));
    }
}
