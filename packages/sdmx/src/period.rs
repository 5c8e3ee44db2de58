//! Conversion of SDMX time periods to calendar dates.
//!
//! Observation periods are written in a frequency-dependent shape
//! (`2020`, `2020-Q3`, `2020-07`). Every period is normalized to the first
//! day of a month so that series of any supported frequency sort the same way.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdmxError};

/// Annual period: YYYY.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ANNUAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid regex"));

/// Quarterly period: YYYY-Qn.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static QUARTERLY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-Q(\d{1,2})$").expect("valid regex"));

/// Monthly period: YYYY-MM.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MONTHLY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("valid regex"));

/// Observation frequencies the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "A")]
    Annual,
    #[serde(rename = "Q")]
    Quarterly,
    #[serde(rename = "M")]
    Monthly,
}

impl Frequency {
    /// Parse a FREQ dimension code.
    ///
    /// # Examples
    /// ```
    /// use sdmx_rest::period::Frequency;
    ///
    /// assert_eq!(Frequency::from_code("Q").unwrap(), Frequency::Quarterly);
    /// assert!(Frequency::from_code("D").is_err());
    /// ```
    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim() {
            "A" => Ok(Self::Annual),
            "Q" => Ok(Self::Quarterly),
            "M" => Ok(Self::Monthly),
            other => Err(SdmxError::UnsupportedFrequency(other.to_string())),
        }
    }

    /// The SDMX code for this frequency.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Annual => "A",
            Self::Quarterly => "Q",
            Self::Monthly => "M",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
            Self::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

/// Normalize a period string to a calendar date.
///
/// - Annual `YYYY` becomes January 1 of that year.
/// - Quarterly `YYYY-Qn` becomes the first day of month `3n`, so Q1 maps
///   to March and Q4 to December.
/// - Monthly `YYYY-MM` becomes the first day of that month.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use sdmx_rest::period::{normalize, Frequency};
///
/// assert_eq!(
///     normalize("2020-Q1", Frequency::Quarterly).unwrap(),
///     NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
/// );
/// assert!(normalize("2020-13", Frequency::Monthly).is_err());
/// ```
pub fn normalize(period: &str, frequency: Frequency) -> Result<NaiveDate> {
    let text = period.trim();
    let malformed = || SdmxError::MalformedPeriod {
        period: period.to_string(),
        frequency: frequency.to_string(),
    };

    let (year, month) = match frequency {
        Frequency::Annual => {
            let caps = ANNUAL_PATTERN.captures(text).ok_or_else(malformed)?;
            (parse_number(&caps[1]).ok_or_else(malformed)?, 1)
        }
        Frequency::Quarterly => {
            let caps = QUARTERLY_PATTERN.captures(text).ok_or_else(malformed)?;
            let quarter: u32 = parse_number(&caps[2]).ok_or_else(malformed)?;
            (parse_number(&caps[1]).ok_or_else(malformed)?, quarter * 3)
        }
        Frequency::Monthly => {
            let caps = MONTHLY_PATTERN.captures(text).ok_or_else(malformed)?;
            (
                parse_number(&caps[1]).ok_or_else(malformed)?,
                parse_number(&caps[2]).ok_or_else(malformed)?,
            )
        }
    };

    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(malformed)
}

/// Normalize a period using a raw FREQ code.
pub fn normalize_with_code(period: &str, frequency_code: &str) -> Result<NaiveDate> {
    normalize(period, Frequency::from_code(frequency_code)?)
}

fn parse_number<T: std::str::FromStr>(digits: &str) -> Option<T> {
    digits.parse().ok()
}
