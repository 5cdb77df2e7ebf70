//! Corn Suitability Rating 2.
//!
//! Each surviving component starts from its taxonomy score and loses points
//! for particle size (M), water-holding capacity (W), erosion tolerance (D),
//! flooding, ponding, slope and local conditions (F), plus manual EJ
//! corrections. Component scores are floored at 5 and weighted by
//! `comppct_r` into the map-unit score.

use crate::dataset::SurveyDataset;
use crate::lookup::ReferenceTables;
use crate::select::{select_components, EarlyExit, SelectedComponent, Selection};
use crate::types::report::FailureReason;
use crate::types::survey::{Duration, Frequency};
use serde::Serialize;

pub const MIN_CSR2: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorBreakdown {
    pub cokey: String,
    pub compname: String,
    pub comppct_r: Option<f64>,
    pub s_fact: f64,
    pub m_fact: f64,
    pub w_fact: f64,
    pub d_fact: f64,
    pub f_fact: f64,
    pub ej_fact: f64,
    pub csr2: f64,
}

/// How a map unit's CSR2 was reached, kept for `score --mukey`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Csr2Explanation {
    EarlyExit { rule: EarlyExit, csr2: u32 },
    Weighted {
        components: Vec<FactorBreakdown>,
        csr2: u32,
    },
}

impl Csr2Explanation {
    pub fn csr2(&self) -> u32 {
        match self {
            Self::EarlyExit { csr2, .. } | Self::Weighted { csr2, .. } => *csr2,
        }
    }
}

pub fn score_unit(
    mukey: &str,
    dataset: &SurveyDataset,
    tables: &ReferenceTables,
) -> Result<u32, FailureReason> {
    explain_unit(mukey, dataset, tables).map(|explanation| explanation.csr2())
}

pub fn explain_unit(
    mukey: &str,
    dataset: &SurveyDataset,
    tables: &ReferenceTables,
) -> Result<Csr2Explanation, FailureReason> {
    let selected = match select_components(mukey, dataset, tables)? {
        Selection::Fixed(rule) => {
            return Ok(Csr2Explanation::EarlyExit {
                rule,
                csr2: rule.score(),
            })
        }
        Selection::Components(selected) => selected,
    };

    let components = selected
        .iter()
        .map(|component| score_component(mukey, component, tables))
        .collect::<Vec<_>>();

    let mut weighted = 0.0;
    for breakdown in &components {
        let share = breakdown
            .comppct_r
            .ok_or_else(|| FailureReason::MissingCoverage {
                cokey: breakdown.cokey.clone(),
            })?;
        weighted += share / 100.0 * breakdown.csr2;
    }

    let csr2 = unit_score(weighted)?;
    Ok(Csr2Explanation::Weighted { components, csr2 })
}

/// Floors the weighted sum at 5 and rounds half to even.
pub fn unit_score(weighted: f64) -> Result<u32, FailureReason> {
    if !weighted.is_finite() {
        return Err(FailureReason::NonFiniteScore);
    }
    Ok(weighted.max(MIN_CSR2).round_ties_even() as u32)
}

pub fn score_component(
    mukey: &str,
    selected: &SelectedComponent<'_>,
    tables: &ReferenceTables,
) -> FactorBreakdown {
    let component = selected.component;
    let s_fact = f64::from(selected.s_fact);
    let m_fact = m_factor(&component.taxpartsize, tables);
    let w_fact = w_factor(selected.cwhc);
    let d_fact = d_factor(&component.compname, component.tfact);

    let (flood, pond) = selected
        .may
        .map(|may| {
            (
                flood_penalty(may.flood_frequency, may.flood_duration),
                pond_penalty(may.pond_frequency, may.pond_duration),
            )
        })
        .unwrap_or((0.0, 0.0));
    let f_fact = flood
        + pond
        + slope_penalty(component.slope_r)
        + condition_penalty(&component.localphase, &component.erocl);

    let ej_fact = ej_factor(&component.compname, mukey, tables);

    let raw = s_fact - m_fact - w_fact - f_fact - d_fact - ej_fact;
    FactorBreakdown {
        cokey: component.cokey.clone(),
        compname: component.compname.clone(),
        comppct_r: component.comppct_r,
        s_fact,
        m_fact,
        w_fact,
        d_fact,
        f_fact,
        ej_fact,
        csr2: raw.max(MIN_CSR2),
    }
}

/// Particle-size penalty. Skeletal textures are a flat 12.
pub fn m_factor(taxpartsize: &str, tables: &ReferenceTables) -> f64 {
    if taxpartsize.contains("skeletal") {
        return 12.0;
    }
    let mut penalty = tables
        .particle_size_factor(taxpartsize)
        .map(f64::from)
        .unwrap_or(0.0);
    if taxpartsize.contains("calcareous") {
        penalty += 5.0;
    }
    penalty
}

/// Water-holding capacity penalty; thresholds are exclusive upper bounds.
pub fn w_factor(cwhc: Option<f64>) -> f64 {
    match cwhc {
        None => 99.0,
        Some(value) if value < 3.01 => 24.0,
        Some(value) if value < 6.00 => 12.0,
        Some(value) if value < 9.0 => 8.0,
        Some(_) => 0.0,
    }
}

/// Erosion-tolerance penalty from the T factor.
pub fn d_factor(compname: &str, tfact: Option<i64>) -> f64 {
    if compname.contains("Histosols") {
        return 0.0;
    }
    match tfact {
        Some(4) => 10.0,
        Some(3) => 20.0,
        Some(2) => 30.0,
        Some(1) => 40.0,
        _ => 0.0,
    }
}

pub fn flood_penalty(frequency: Frequency, duration: Duration) -> f64 {
    match (frequency, duration) {
        (Frequency::Frequent, Duration::Brief) => 20.0,
        (Frequency::Frequent, Duration::VeryBrief) => 10.0,
        (Frequency::Frequent, Duration::ExtremelyBrief) => 5.0,
        (Frequency::Occasional, Duration::VeryLong) => 34.0,
        (Frequency::Occasional, Duration::Long) => 10.0,
        (Frequency::Occasional, Duration::Brief) => 6.0,
        (Frequency::Occasional, Duration::VeryBrief) => 4.0,
        (Frequency::Occasional, Duration::ExtremelyBrief) => 2.0,
        _ => 0.0,
    }
}

pub fn pond_penalty(frequency: Frequency, duration: Duration) -> f64 {
    if !matches!(frequency, Frequency::Frequent | Frequency::Occasional) {
        return 0.0;
    }
    match duration {
        Duration::Brief | Duration::VeryBrief => 20.0,
        Duration::Long | Duration::VeryLong => 44.0,
        _ => 0.0,
    }
}

pub fn slope_penalty(slope: Option<f64>) -> f64 {
    match slope {
        None => 0.0,
        Some(value) if value < 2.0 => 0.0,
        Some(value) if value < 5.0 => 5.0,
        Some(value) if value < 9.0 => 15.0,
        Some(value) => 3.0 * value,
    }
}

pub fn condition_penalty(localphase: &str, erocl: &str) -> f64 {
    let mut penalty = 0.0;
    if localphase.contains("channeled") {
        penalty += 40.0;
    }
    if erocl.contains("Class 2") {
        penalty += 3.0;
    }
    penalty
}

/// Net manual correction; positive values lower the score.
pub fn ej_factor(compname: &str, mukey: &str, tables: &ReferenceTables) -> f64 {
    let points = i64::from(tables.ej_subtraction(compname))
        - i64::from(tables.ej_addition(compname))
        - i64::from(tables.ej_addition(mukey));
    points as f64
}
