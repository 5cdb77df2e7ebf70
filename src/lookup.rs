//! Static reference data used by the scorers.
//!
//! Every table ships with the binary and may be replaced by a CSV file named
//! in the `[reference]` config section. Tables are loaded once per process;
//! the only mutation is [`ReferenceTables::with_dataset_additions`], which
//! consumes the tables before any scoring borrows them.

use crate::config::resolve_path;
use crate::dataset::SurveyDataset;
use crate::error::{Result, SoilError};
use crate::types::config::{MusymAddition, ReferenceConfig};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// PI slope bands, 0-2% (A) through >43% (H). Columns 0-2 are favorable
/// soils with no, "2" and "3" sub-slope digits; columns 3-5 the unfavorable
/// counterparts.
pub const SLOPE_BANDS: [(char, [f64; 6]); 8] = [
    ('A', [1.00, 0.96, 0.89, 1.00, 0.94, 0.79]),
    ('B', [0.99, 0.95, 0.88, 0.99, 0.93, 0.78]),
    ('C', [0.97, 0.93, 0.86, 0.96, 0.90, 0.74]),
    ('D', [0.93, 0.89, 0.81, 0.91, 0.83, 0.69]),
    ('E', [0.87, 0.82, 0.75, 0.85, 0.78, 0.63]),
    ('F', [0.71, 0.66, 0.59, 0.68, 0.62, 0.47]),
    ('G', [0.52, 0.48, 0.40, 0.49, 0.43, 0.28]),
    ('H', [0.48, 0.44, 0.36, 0.45, 0.39, 0.24]),
];

pub fn slope_band(letter: char) -> Option<&'static [f64; 6]> {
    SLOPE_BANDS
        .iter()
        .find(|(band, _)| *band == letter)
        .map(|(_, multipliers)| multipliers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTable {
    TaxonomyFactors,
    ParticleSizeFactors,
    EjSubtract,
    EjAdd,
    CountySurveyAreas,
    PiRatings,
}

impl ReferenceTable {
    pub fn name(self) -> &'static str {
        match self {
            Self::TaxonomyFactors => "taxonomy_factors",
            Self::ParticleSizeFactors => "particle_size_factors",
            Self::EjSubtract => "ej_subtract",
            Self::EjAdd => "ej_add",
            Self::CountySurveyAreas => "county_survey_areas",
            Self::PiRatings => "pi_ratings",
        }
    }

    fn packaged(self) -> &'static str {
        match self {
            Self::TaxonomyFactors => include_str!("../data/taxonomy_factors.csv"),
            Self::ParticleSizeFactors => include_str!("../data/particle_size_factors.csv"),
            Self::EjSubtract => include_str!("../data/ej_subtract.csv"),
            Self::EjAdd => include_str!("../data/ej_add.csv"),
            Self::CountySurveyAreas => include_str!("../data/county_survey_areas.csv"),
            Self::PiRatings => include_str!("../data/pi_ratings.csv"),
        }
    }

    fn override_path(self, overrides: &ReferenceConfig) -> Option<&str> {
        match self {
            Self::TaxonomyFactors => overrides.taxonomy_factors.as_deref(),
            Self::ParticleSizeFactors => overrides.particle_size_factors.as_deref(),
            Self::EjSubtract => overrides.ej_subtract.as_deref(),
            Self::EjAdd => overrides.ej_add.as_deref(),
            Self::CountySurveyAreas => overrides.county_survey_areas.as_deref(),
            Self::PiRatings => overrides.pi_ratings.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiRating {
    pub value: f64,
    pub unfavorable: i64,
}

#[derive(Debug, Clone)]
pub struct ReferenceTables {
    taxonomy: HashMap<String, i32>,
    particle_size: HashMap<String, i32>,
    ej_subtract: HashMap<String, i32>,
    ej_add: HashMap<String, i32>,
    counties: BTreeMap<String, String>,
    pi_ratings: HashMap<String, PiRating>,
}

impl ReferenceTables {
    pub fn packaged() -> Result<Self> {
        Self::load(Path::new("."), None)
    }

    pub fn load(root: &Path, overrides: Option<&ReferenceConfig>) -> Result<Self> {
        let read = |table: ReferenceTable| -> Result<String> {
            match overrides.and_then(|config| table.override_path(config)) {
                Some(path) => {
                    let full_path = resolve_path(root, path);
                    tracing::info!(
                        table = table.name(),
                        path = %full_path.display(),
                        "using reference override"
                    );
                    std::fs::read_to_string(&full_path).map_err(|e| {
                        SoilError::ReferenceTable {
                            table: table.name().to_string(),
                            detail: format!("{}: {e}", full_path.display()),
                        }
                    })
                }
                None => Ok(table.packaged().to_string()),
            }
        };

        let taxonomy = points_table(
            ReferenceTable::TaxonomyFactors,
            &read(ReferenceTable::TaxonomyFactors)?,
        )?;
        let particle_size = points_table(
            ReferenceTable::ParticleSizeFactors,
            &read(ReferenceTable::ParticleSizeFactors)?,
        )?;
        let ej_subtract =
            points_table(ReferenceTable::EjSubtract, &read(ReferenceTable::EjSubtract)?)?;
        let ej_add = points_table(ReferenceTable::EjAdd, &read(ReferenceTable::EjAdd)?)?;

        let counties = parse_rows::<(String, String)>(
            ReferenceTable::CountySurveyAreas,
            &read(ReferenceTable::CountySurveyAreas)?,
        )?
        .into_iter()
        .map(|(county, area)| (county.trim().to_string(), area.trim().to_string()))
        .collect();

        let pi_ratings = parse_rows::<(String, f64, i64)>(
            ReferenceTable::PiRatings,
            &read(ReferenceTable::PiRatings)?,
        )?
        .into_iter()
        .map(|(musym, value, unfavorable)| {
            (musym.trim().to_string(), PiRating { value, unfavorable })
        })
        .collect();

        Ok(Self {
            taxonomy,
            particle_size,
            ej_subtract,
            ej_add,
            counties,
            pi_ratings,
        })
    }

    /// Registers `mukey` additions for every aggregate row whose map symbol
    /// matches a rule. Must run before the tables are handed to a scorer.
    pub fn with_dataset_additions(
        mut self,
        dataset: &SurveyDataset,
        rules: &[MusymAddition],
    ) -> Self {
        let mut added = 0usize;
        for aggregate in &dataset.aggregates {
            let musym = aggregate.musym.trim();
            if let Some(rule) = rules.iter().find(|rule| rule.musym == musym) {
                self.ej_add.insert(aggregate.mukey.clone(), rule.points);
                added += 1;
            }
        }
        if added > 0 {
            tracing::info!(dataset = %dataset.name, added, "registered dataset EJ additions");
        }
        self
    }

    pub fn taxonomy_factor(&self, taxsubgrp: &str) -> Option<i32> {
        self.taxonomy.get(taxsubgrp.trim()).copied()
    }

    pub fn particle_size_factor(&self, taxpartsize: &str) -> Option<i32> {
        self.particle_size.get(taxpartsize.trim()).copied()
    }

    pub fn ej_subtraction(&self, key: &str) -> i32 {
        self.ej_subtract.get(key).copied().unwrap_or(0)
    }

    pub fn ej_addition(&self, key: &str) -> i32 {
        self.ej_add.get(key).copied().unwrap_or(0)
    }

    pub fn survey_area(&self, county: &str) -> Option<&str> {
        let wanted = normalize_county(county);
        self.counties
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&wanted))
            .map(|(_, area)| area.as_str())
    }

    pub fn county_for_area(&self, areasymbol: &str) -> Option<&str> {
        self.counties
            .iter()
            .find(|(_, area)| area.eq_ignore_ascii_case(areasymbol.trim()))
            .map(|(name, _)| name.as_str())
    }

    pub fn pi_rating(&self, musym: &str) -> Option<PiRating> {
        self.pi_ratings.get(musym).copied()
    }
}

/// `"Story County"` and `" story "` both name Story.
pub fn normalize_county(name: &str) -> String {
    let trimmed = name.trim();
    trimmed
        .strip_suffix(" County")
        .or_else(|| trimmed.strip_suffix(" county"))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

fn points_table(table: ReferenceTable, content: &str) -> Result<HashMap<String, i32>> {
    Ok(parse_rows::<(String, i32)>(table, content)?
        .into_iter()
        .map(|(key, points)| (key.trim().to_string(), points))
        .collect())
}

fn parse_rows<T: DeserializeOwned>(table: ReferenceTable, content: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    reader
        .deserialize::<T>()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(|e| SoilError::ReferenceTable {
                table: table.name().to_string(),
                detail: format!("row {}: {e}", index + 1),
            })
        })
        .collect()
}
