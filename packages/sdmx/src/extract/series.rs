//! Time series extraction from GenericData messages.
//!
//! Series are read from every `generic:Group` and, for ungrouped data,
//! directly from the `DataSet` element. Observation periods are normalized with
//! the series' own FREQ dimension and the observations are sorted by date.

use uuid::Uuid;

use crate::config::DEFAULT_OBS_STATUS;
use crate::error::{Result, SdmxError};
use crate::model::{Observation, SeriesKey, TimeSeries, TimeSeriesMap};
use crate::period::{normalize, Frequency};
use crate::xml::{Document, Element, Namespaces};

use super::Artifact;

/// Observation data (`{base}/GenericData?dataflow=...`).
#[derive(Debug)]
pub struct GenericData;

impl Artifact for GenericData {
    const KIND: &'static str = "GenericData";
    type Output = TimeSeriesMap;

    fn walk(document: &Document) -> Result<TimeSeriesMap> {
        let ns = document.namespaces();
        let mut series_map = TimeSeriesMap::new();

        let mut all_series = Vec::new();
        for group in document.find_all(".//generic:Group")? {
            all_series.extend(group.find_all(".//generic:Series", ns)?);
        }
        // DataSet is namespaced differently across services
        all_series.extend(document.find_all(".//DataSet/generic:Series")?);

        for series in all_series {
            let time_series = read_series(series, ns)?;
            series_map.insert(Uuid::new_v4().to_string(), time_series);
        }

        tracing::debug!(series = series_map.len(), "Read time series");
        Ok(series_map)
    }
}

fn read_series(series: &Element, ns: &Namespaces) -> Result<TimeSeries> {
    let mut dimensions = SeriesKey::new();
    for value in series.find_all("generic:SeriesKey/generic:Value", ns)? {
        dimensions.insert(
            value.required_attribute("concept", "generic:SeriesKey")?,
            value.required_attribute("value", "generic:SeriesKey")?,
        );
    }

    let context = format!("Series {}", dimensions.to_key_string());
    let frequency = dimensions
        .get("FREQ")
        .ok_or_else(|| SdmxError::MissingFrequency {
            series: dimensions.to_key_string(),
        })
        .and_then(Frequency::from_code)?;

    let mut observations = series
        .find_all(".//generic:Obs", ns)?
        .into_iter()
        .map(|obs| read_observation(obs, ns, frequency, &context))
        .collect::<Result<Vec<_>>>()?;

    observations.sort_by_key(|obs| obs.timestamp);

    Ok(TimeSeries {
        dimensions,
        observations,
    })
}

fn read_observation(
    obs: &Element,
    ns: &Namespaces,
    frequency: Frequency,
    context: &str,
) -> Result<Observation> {
    let period = obs.required_text("generic:Time", ns, context)?;
    let timestamp = normalize(period, frequency)?;

    let value = obs
        .required("generic:ObsValue", ns, context)?
        .required_attribute("value", context)?;

    // Attribute blocks may be nested; a later OBS_STATUS overrides an earlier one
    let status = match obs
        .find_all(
            ".//generic:Attributes//generic:Value[@concept='OBS_STATUS']",
            ns,
        )?
        .last()
    {
        Some(attribute) => attribute.required_attribute("value", context)?,
        None => DEFAULT_OBS_STATUS,
    };

    Ok(Observation {
        timestamp,
        value: value.to_string(),
        status: status.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn generic(body: &str) -> Document {
        Document::parse(&format!(
            r#"<message:GenericData xmlns:message="urn:message" xmlns:generic="urn:generic">
                 <generic:DataSet>{body}</generic:DataSet>
               </message:GenericData>"#
        ))
        .unwrap()
    }

    fn obs(time: &str, value: &str, status: Option<&str>) -> String {
        let attributes = status
            .map(|s| {
                format!(
                    r#"<generic:Attributes>
                         <generic:Value concept="OBS_CONF" value="F"/>
                         <generic:Value concept="OBS_STATUS" value="{s}"/>
                       </generic:Attributes>"#
                )
            })
            .unwrap_or_default();
        format!(
            r#"<generic:Obs><generic:Time>{time}</generic:Time><generic:ObsValue value="{value}"/>{attributes}</generic:Obs>"#
        )
    }

    fn series(freq: &str, observations: &[String]) -> String {
        format!(
            r#"<generic:Series>
                 <generic:SeriesKey>
                   <generic:Value concept="FREQ" value="{freq}"/>
                   <generic:Value concept="CURRENCY" value="USD"/>
                 </generic:SeriesKey>
                 {}
               </generic:Series>"#,
            observations.concat()
        )
    }

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_grouped_series_sorted() {
        let body = format!(
            "<generic:Group>{}</generic:Group>",
            series(
                "M",
                &[
                    obs("2020-03", "1.10", None),
                    obs("2020-01", "1.12", Some("E")),
                    obs("2020-02", "1.09", None),
                ]
            )
        );
        let map = GenericData::walk(&generic(&body)).unwrap();
        assert_eq!(map.len(), 1);

        let ts = map.values().next().unwrap();
        assert_eq!(ts.dimensions.get("FREQ"), Some("M"));
        assert_eq!(ts.dimensions.get("CURRENCY"), Some("USD"));

        let timestamps: Vec<_> = ts.observations.iter().map(|o| o.timestamp).collect();
        assert_eq!(timestamps, vec![date(2020, 1), date(2020, 2), date(2020, 3)]);
        assert_eq!(ts.observations[0].value, "1.12");
        assert_eq!(ts.observations[0].status, "E");
        assert_eq!(ts.observations[1].status, "A");
    }

    #[test]
    fn test_ungrouped_series() {
        let body = series("A", &[obs("2001", "5", None), obs("2000", "4", None)]);
        let map = GenericData::walk(&generic(&body)).unwrap();
        let ts = map.values().next().unwrap();
        assert_eq!(ts.observations[0].timestamp, date(2000, 1));
        assert_eq!(ts.observations[1].value, "5");
    }

    #[test]
    fn test_quarterly_series() {
        let body = series("Q", &[obs("2020-Q4", "2", None), obs("2020-Q1", "1", None)]);
        let map = GenericData::walk(&generic(&body)).unwrap();
        let ts = map.values().next().unwrap();
        assert_eq!(ts.observations[0].timestamp, date(2020, 3));
        assert_eq!(ts.observations[1].timestamp, date(2020, 12));
    }

    #[test]
    fn test_each_series_gets_own_id() {
        let body = format!(
            "<generic:Group>{}{}</generic:Group>",
            series("A", &[obs("2000", "1", None)]),
            series("M", &[obs("2000-01", "1", None)])
        );
        let map = GenericData::walk(&generic(&body)).unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.keys().all(|k| Uuid::parse_str(k).is_ok()));
    }

    #[test]
    fn test_missing_frequency() {
        let body = r#"<generic:Series>
            <generic:SeriesKey><generic:Value concept="CURRENCY" value="USD"/></generic:SeriesKey>
        </generic:Series>"#;
        let err = GenericData::walk(&generic(body)).unwrap_err();
        assert!(matches!(err, SdmxError::MissingFrequency { ref series } if series == "USD"));
    }

    #[test]
    fn test_unsupported_frequency() {
        let body = series("D", &[obs("2020-01-01", "1", None)]);
        assert!(matches!(
            GenericData::walk(&generic(&body)),
            Err(SdmxError::UnsupportedFrequency(code)) if code == "D"
        ));
    }

    #[test]
    fn test_malformed_period_propagates() {
        let body = series("M", &[obs("2020-13", "1", None)]);
        assert!(matches!(
            GenericData::walk(&generic(&body)),
            Err(SdmxError::MalformedPeriod { .. })
        ));
    }

    #[test]
    fn test_last_nested_status_wins() {
        let observation = r#"<generic:Obs>
            <generic:Time>2000</generic:Time>
            <generic:ObsValue value="1"/>
            <generic:Attributes>
              <generic:Value concept="OBS_STATUS" value="E"/>
              <generic:Group><generic:Value concept="OBS_STATUS" value="P"/></generic:Group>
            </generic:Attributes>
          </generic:Obs>"#;
        let map = GenericData::walk(&generic(&series("A", &[observation.to_string()]))).unwrap();
        let ts = map.values().next().unwrap();
        assert_eq!(ts.observations[0].status, "P");
    }

    #[test]
    fn test_missing_obs_value() {
        let body = series(
            "A",
            &["<generic:Obs><generic:Time>2000</generic:Time></generic:Obs>".to_string()],
        );
        let err = GenericData::walk(&generic(&body)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required field: generic:ObsValue in Series A.USD"
        );
    }
}
