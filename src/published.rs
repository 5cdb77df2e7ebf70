//! Joins published county CSR2 ratings onto map units.
//!
//! Map-unit polygons carry `(mukey, areasymbol, musym)`; the ratings sheet
//! is keyed by county and soil code. Survey areas outside the county map are
//! dropped, units without a published rating keep a null value.

use crate::error::{Result, SoilError};
use crate::lookup::{normalize_county, ReferenceTables};
use crate::types::survey::parse_f64;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
struct PolygonRow {
    mukey: String,
    areasymbol: String,
    musym: String,
}

#[derive(Debug, Clone)]
struct RatingRow {
    county: String,
    soil_code: String,
    csr2: Option<u32>,
}

/// Column positions in the ratings sheet.
///
/// Published sheets repeat the `Soil Description` header: the first holds
/// the soil name, the second the rating. An explicit `csr2` column wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RatingColumns {
    county: usize,
    soil_code: usize,
    csr2: usize,
}

impl RatingColumns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|header| header == name);
        let missing = |name: &str| SoilError::MalformedRow {
            layer: "ratings".to_string(),
            detail: format!("missing column {name}"),
        };

        let county = position("county").ok_or_else(|| missing("county"))?;
        let soil_code = position("soil code").ok_or_else(|| missing("soil code"))?;
        let csr2 = position("csr2")
            .or_else(|| {
                headers
                    .iter()
                    .enumerate()
                    .filter(|(_, header)| *header == "soil description")
                    .map(|(index, _)| index)
                    .nth(1)
            })
            .or_else(|| position("soil description.1"))
            .or_else(|| headers.len().checked_sub(1))
            .filter(|index| *index != county && *index != soil_code)
            .ok_or_else(|| missing("csr2"))?;

        Ok(Self {
            county,
            soil_code,
            csr2,
        })
    }

    fn read(&self, record: &StringRecord) -> RatingRow {
        let field = |index: usize| record.get(index).unwrap_or_default().to_string();
        RatingRow {
            county: field(self.county),
            soil_code: field(self.soil_code),
            csr2: parse_f64(&field(self.csr2))
                .map(|value| value.round_ties_even().max(0.0) as u32),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedRow {
    pub mukey: String,
    pub csr2: Option<u32>,
}

pub fn join_published(
    polygons: &Path,
    ratings: &Path,
    tables: &ReferenceTables,
) -> Result<Vec<PublishedRow>> {
    let polygons = read_polygons(polygons)?;
    let ratings = read_ratings(ratings)?;

    let mut by_county_symbol = HashMap::new();
    for rating in ratings {
        let key = (
            normalize_county(&rating.county).to_ascii_lowercase(),
            rating.soil_code.trim().to_string(),
        );
        by_county_symbol.entry(key).or_insert(rating.csr2);
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for polygon in polygons {
        if !seen.insert((polygon.mukey.clone(), polygon.areasymbol.clone())) {
            continue;
        }
        let Some(county) = tables.county_for_area(&polygon.areasymbol) else {
            tracing::debug!(areasymbol = %polygon.areasymbol, "survey area outside county map");
            continue;
        };
        let key = (county.to_ascii_lowercase(), polygon.musym.trim().to_string());
        rows.push(PublishedRow {
            mukey: polygon.mukey,
            csr2: by_county_symbol.get(&key).copied().flatten(),
        });
    }

    tracing::info!(
        rows = rows.len(),
        matched = rows.iter().filter(|row| row.csr2.is_some()).count(),
        "joined published ratings"
    );
    Ok(rows)
}

pub fn write_published(rows: &[PublishedRow], writer: impl std::io::Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_polygons(path: &Path) -> Result<Vec<PolygonRow>> {
    let (headers, records) = read_table(path)?;
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .deserialize::<PolygonRow>(Some(&headers))
                .map_err(|e| SoilError::MalformedRow {
                    layer: "mupolygon".to_string(),
                    detail: format!("row {}: {e}", index + 1),
                })
        })
        .collect()
}

fn read_ratings(path: &Path) -> Result<Vec<RatingRow>> {
    let (headers, records) = read_table(path)?;
    let columns = RatingColumns::locate(&headers)?;
    Ok(records.iter().map(|record| columns.read(record)).collect())
}

/// Reads a CSV or tab-separated export, lower-casing its headers.
fn read_table(path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    if !path.is_file() {
        return Err(SoilError::PathNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let first_line = content.lines().next().unwrap_or_default();
    let delimiter = if first_line.contains('\t') { b'\t' } else { b',' };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.to_ascii_lowercase())
        .collect::<StringRecord>();
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok((headers, records))
}
