pub mod directory;
#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::{Result, SoilError};
use crate::types::survey::{AggregateAttributes, Component, Horizon, MapUnit, MonthlyClimate};
use csv::StringRecord;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

pub use directory::DirectoryLayerSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    MapUnit,
    Component,
    ComponentMonth,
    Horizon,
    AggregateAttributes,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::MapUnit,
        Layer::Component,
        Layer::ComponentMonth,
        Layer::Horizon,
        Layer::AggregateAttributes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MapUnit => "mapunit",
            Self::Component => "component",
            Self::ComponentMonth => "comonth",
            Self::Horizon => "chorizon",
            Self::AggregateAttributes => "muaggatt",
        }
    }

    /// Scoring cannot start without these layers.
    pub fn is_required(self) -> bool {
        !matches!(self, Self::AggregateAttributes)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column-labelled rows of one layer, headers already lower-cased.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    pub fn new(headers: StringRecord, rows: Vec<StringRecord>) -> Self {
        let headers = headers
            .iter()
            .map(|header| header.trim().to_ascii_lowercase())
            .collect::<StringRecord>();
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records<T: DeserializeOwned>(&self, layer: Layer) -> Result<Vec<T>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                row.deserialize(Some(&self.headers))
                    .map_err(|e| SoilError::MalformedRow {
                        layer: layer.name().to_string(),
                        detail: format!("row {}: {e}", index + 1),
                    })
            })
            .collect()
    }
}

/// Where survey layers come from. Implementations return the whole layer.
pub trait LayerSource {
    fn fetch_layer(&self, layer: Layer) -> Result<Table>;

    fn describe(&self) -> String;
}

/// One survey dataset held in memory and grouped by owner key.
#[derive(Debug, Clone, Default)]
pub struct SurveyDataset {
    pub name: String,
    pub map_units: Vec<MapUnit>,
    pub aggregates: Vec<AggregateAttributes>,
    components: BTreeMap<String, Vec<Component>>,
    horizons: BTreeMap<String, Vec<Horizon>>,
    months: BTreeMap<String, Vec<MonthlyClimate>>,
}

impl SurveyDataset {
    pub fn load(source: &dyn LayerSource) -> Result<Self> {
        let map_units = source
            .fetch_layer(Layer::MapUnit)?
            .records::<MapUnit>(Layer::MapUnit)?;
        let components = source
            .fetch_layer(Layer::Component)?
            .records::<Component>(Layer::Component)?;
        let months = source
            .fetch_layer(Layer::ComponentMonth)?
            .records::<MonthlyClimate>(Layer::ComponentMonth)?;
        let horizons = source
            .fetch_layer(Layer::Horizon)?
            .records::<Horizon>(Layer::Horizon)?;
        let aggregates = source
            .fetch_layer(Layer::AggregateAttributes)?
            .records::<AggregateAttributes>(Layer::AggregateAttributes)?;

        let dataset = Self::from_records(
            source.describe(),
            map_units,
            components,
            horizons,
            months,
            aggregates,
        );
        tracing::info!(
            dataset = %dataset.name,
            map_units = dataset.map_units.len(),
            components = dataset.components.values().map(Vec::len).sum::<usize>(),
            "loaded survey dataset"
        );
        Ok(dataset)
    }

    pub fn from_records(
        name: impl Into<String>,
        map_units: Vec<MapUnit>,
        components: Vec<Component>,
        horizons: Vec<Horizon>,
        months: Vec<MonthlyClimate>,
        aggregates: Vec<AggregateAttributes>,
    ) -> Self {
        let mut by_unit = group_by(components, |component| component.mukey.clone());
        for group in by_unit.values_mut() {
            group.sort_by(|a, b| a.cokey.cmp(&b.cokey));
        }

        let mut by_component = group_by(horizons, |horizon| horizon.cokey.clone());
        for group in by_component.values_mut() {
            group.sort_by(|a, b| {
                a.hzdept_r
                    .unwrap_or(f64::MAX)
                    .total_cmp(&b.hzdept_r.unwrap_or(f64::MAX))
                    .then_with(|| a.chkey.cmp(&b.chkey))
            });
        }

        let mut by_month_owner = group_by(months, |record| record.cokey.clone());
        for group in by_month_owner.values_mut() {
            group.sort_by(|a, b| a.month.cmp(&b.month));
        }

        Self {
            name: name.into(),
            map_units,
            aggregates,
            components: by_unit,
            horizons: by_component,
            months: by_month_owner,
        }
    }

    pub fn map_unit(&self, mukey: &str) -> Option<&MapUnit> {
        self.map_units.iter().find(|unit| unit.mukey == mukey)
    }

    pub fn components_of(&self, mukey: &str) -> &[Component] {
        self.components.get(mukey).map_or(&[], Vec::as_slice)
    }

    pub fn horizons_of(&self, cokey: &str) -> &[Horizon] {
        self.horizons.get(cokey).map_or(&[], Vec::as_slice)
    }

    pub fn months_of(&self, cokey: &str) -> &[MonthlyClimate] {
        self.months.get(cokey).map_or(&[], Vec::as_slice)
    }
}

fn group_by<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> BTreeMap<String, Vec<T>> {
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{component, horizon};

    #[test]
    fn table_lowercases_headers_before_deserializing() {
        let table = Table::new(
            StringRecord::from(vec!["MUKEY", "MuSym", "MUNAME", "IACORNSR"]),
            vec![StringRecord::from(vec!["409089", "221B", "Palms muck", "46"])],
        );
        let units = table
            .records::<MapUnit>(Layer::MapUnit)
            .expect("rows should deserialize");
        assert_eq!(units[0].mukey, "409089");
        assert_eq!(units[0].musym, "221B");
        assert_eq!(units[0].csr, Some(46));
    }

    #[test]
    fn malformed_rows_name_the_layer() {
        let table = Table::new(
            StringRecord::from(vec!["musym"]),
            vec![StringRecord::from(vec!["221B"])],
        );
        let err = table
            .records::<MapUnit>(Layer::MapUnit)
            .expect_err("missing mukey should fail");
        assert!(err.to_string().contains("mapunit"));
    }

    #[test]
    fn grouping_is_independent_of_row_order() {
        let forward = SurveyDataset::from_records(
            "a",
            Vec::new(),
            vec![component("1", "c2"), component("1", "c1")],
            vec![horizon("c1", 20.0, 40.0, 0.2), horizon("c1", 0.0, 20.0, 0.1)],
            Vec::new(),
            Vec::new(),
        );
        let reversed = SurveyDataset::from_records(
            "b",
            Vec::new(),
            vec![component("1", "c1"), component("1", "c2")],
            vec![horizon("c1", 0.0, 20.0, 0.1), horizon("c1", 20.0, 40.0, 0.2)],
            Vec::new(),
            Vec::new(),
        );

        let keys = |dataset: &SurveyDataset| {
            dataset
                .components_of("1")
                .iter()
                .map(|component| component.cokey.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&forward), keys(&reversed));
        assert_eq!(forward.horizons_of("c1")[0].hzdept_r, Some(0.0));
        assert!(forward.components_of("missing").is_empty());
    }
}
