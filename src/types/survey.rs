//! Typed records for the soil-survey layers the scorers read.
//!
//! Headers are lower-cased before rows reach these structs, so field names
//! match the survey's column names directly. Numeric columns are parsed
//! leniently: an empty or non-numeric cell becomes `None` and the scoring
//! fallbacks take over.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct MapUnit {
    pub mukey: String,
    #[serde(default)]
    pub muname: String,
    #[serde(default)]
    pub musym: String,
    /// Legacy Iowa corn suitability rating carried by the survey.
    #[serde(default, alias = "iacornsr", deserialize_with = "lenient_u32")]
    pub csr: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    pub mukey: String,
    pub cokey: String,
    #[serde(default)]
    pub compname: String,
    #[serde(default)]
    pub compkind: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub comppct_r: Option<f64>,
    #[serde(default)]
    pub majcompflag: String,
    #[serde(default)]
    pub localphase: String,
    #[serde(default)]
    pub taxsubgrp: String,
    #[serde(default)]
    pub taxpartsize: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub tfact: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub slope_r: Option<f64>,
    #[serde(default)]
    pub erocl: String,
    #[serde(default)]
    pub nirrcapscl: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub nirrcapcl: Option<u32>,
}

impl Component {
    pub fn is_miscellaneous_area(&self) -> bool {
        self.compkind.trim().eq_ignore_ascii_case("miscellaneous area")
    }

    pub fn is_wet_class_five(&self) -> bool {
        self.nirrcapscl.trim() == "w" && self.nirrcapcl == Some(5)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Horizon {
    pub cokey: String,
    #[serde(default)]
    pub chkey: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hzdept_r: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hzdepb_r: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub awc_r: Option<f64>,
}

impl Horizon {
    pub fn thickness(&self) -> Option<f64> {
        Some(self.hzdepb_r? - self.hzdept_r?)
    }

    pub fn water_capacity(&self) -> Option<f64> {
        Some(self.thickness()? * self.awc_r?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyClimate {
    pub cokey: String,
    #[serde(default)]
    pub month: String,
    #[serde(rename = "flodfreqcl", default, deserialize_with = "frequency_class")]
    pub flood_frequency: Frequency,
    #[serde(rename = "floddurcl", default, deserialize_with = "duration_class")]
    pub flood_duration: Duration,
    #[serde(rename = "pondfreqcl", default, deserialize_with = "frequency_class")]
    pub pond_frequency: Frequency,
    #[serde(rename = "ponddurcl", default, deserialize_with = "duration_class")]
    pub pond_duration: Duration,
}

impl MonthlyClimate {
    pub fn is_may(&self) -> bool {
        self.month.trim().eq_ignore_ascii_case("may")
    }

    /// Flooding severe enough to rule the land out for row crops.
    pub fn disqualifies(&self) -> bool {
        match self.flood_frequency {
            Frequency::VeryFrequent => true,
            Frequency::Frequent => {
                matches!(self.flood_duration, Duration::Long | Duration::VeryLong)
            }
            _ => false,
        }
    }
}

/// Subset of the `muaggatt` layer used for dataset-derived corrections.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateAttributes {
    pub mukey: String,
    #[serde(default)]
    pub musym: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Frequency {
    #[default]
    None,
    VeryRare,
    Rare,
    Occasional,
    Frequent,
    VeryFrequent,
}

impl Frequency {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "very frequent" => Self::VeryFrequent,
            "frequent" => Self::Frequent,
            "occasional" => Self::Occasional,
            "rare" => Self::Rare,
            "very rare" => Self::VeryRare,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Duration {
    #[default]
    None,
    ExtremelyBrief,
    VeryBrief,
    Brief,
    Long,
    VeryLong,
}

impl Duration {
    /// Survey labels carry the range in parentheses, e.g. `Long (7 to 30 days)`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        if normalized.starts_with("extremely brief") {
            Self::ExtremelyBrief
        } else if normalized.starts_with("very brief") {
            Self::VeryBrief
        } else if normalized.starts_with("brief") {
            Self::Brief
        } else if normalized.starts_with("very long") {
            Self::VeryLong
        } else if normalized.starts_with("long") {
            Self::Long
        } else {
            Self::None
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_f64))
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_int))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(parse_int)
        .and_then(|value| u32::try_from(value).ok()))
}

fn frequency_class<'de, D>(deserializer: D) -> Result<Frequency, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Frequency::from_label).unwrap_or_default())
}

fn duration_class<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Duration::from_label).unwrap_or_default())
}

pub(crate) fn parse_f64(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Accepts `5` and `5.0`; anything with a fractional part is rejected.
pub(crate) fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = parse_f64(trimmed)?;
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_labels_map_by_prefix() {
        assert_eq!(
            Duration::from_label("Very long (more than 30 days)"),
            Duration::VeryLong
        );
        assert_eq!(Duration::from_label("Long (7 to 30 days)"), Duration::Long);
        assert_eq!(
            Duration::from_label("Very Brief (4 to 48 hours)"),
            Duration::VeryBrief
        );
        assert_eq!(Duration::from_label(""), Duration::None);
    }

    #[test]
    fn frequency_labels_are_case_insensitive() {
        assert_eq!(
            Frequency::from_label("Very frequent"),
            Frequency::VeryFrequent
        );
        assert_eq!(Frequency::from_label("FREQUENT"), Frequency::Frequent);
        assert_eq!(Frequency::from_label("None"), Frequency::None);
    }

    #[test]
    fn frequent_flooding_disqualifies_only_with_long_duration() {
        let mut record = MonthlyClimate {
            cokey: "c1".to_string(),
            month: "April".to_string(),
            flood_frequency: Frequency::Frequent,
            flood_duration: Duration::Brief,
            pond_frequency: Frequency::None,
            pond_duration: Duration::None,
        };
        assert!(!record.disqualifies());
        record.flood_duration = Duration::Long;
        assert!(record.disqualifies());
        record.flood_frequency = Frequency::Occasional;
        assert!(!record.disqualifies());
    }

    #[test]
    fn integer_parser_accepts_integral_floats_only() {
        assert_eq!(parse_int("5"), Some(5));
        assert_eq!(parse_int(" 3.0 "), Some(3));
        assert_eq!(parse_int("2.5"), None);
        assert_eq!(parse_int("n/a"), None);
    }

    #[test]
    fn horizon_capacity_requires_all_fields() {
        let horizon = Horizon {
            cokey: "c1".to_string(),
            chkey: "h1".to_string(),
            hzdept_r: Some(0.0),
            hzdepb_r: Some(20.0),
            awc_r: Some(0.2),
        };
        assert_eq!(horizon.thickness(), Some(20.0));
        assert!((horizon.water_capacity().unwrap_or_default() - 4.0).abs() < 1e-9);

        let missing = Horizon {
            awc_r: None,
            ..horizon
        };
        assert_eq!(missing.water_capacity(), None);
    }
}
