use crate::dataset::SurveyDataset;
use crate::lookup::ReferenceTables;
use crate::types::report::FailureReason;
use crate::types::survey::{Component, MonthlyClimate};
use serde::Serialize;

/// Conditions that settle a map unit's CSR2 without factor scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyExit {
    GulliedLand,
    UrbanLand,
    WetClassFive,
    MiscellaneousArea,
    UnmappedTaxonomy,
    Flooding,
}

impl EarlyExit {
    pub fn score(self) -> u32 {
        match self {
            Self::GulliedLand | Self::UrbanLand | Self::UnmappedTaxonomy | Self::Flooding => 5,
            Self::WetClassFive => 25,
            Self::MiscellaneousArea => 0,
        }
    }
}

/// A component that survived filtering, with its horizons folded in.
#[derive(Debug, Clone)]
pub struct SelectedComponent<'a> {
    pub component: &'a Component,
    pub s_fact: i32,
    /// Cumulative water-holding capacity; `None` when no horizon carries
    /// complete depth and awc data.
    pub cwhc: Option<f64>,
    pub depth: f64,
    pub may: Option<&'a MonthlyClimate>,
}

#[derive(Debug, Clone)]
pub enum Selection<'a> {
    Fixed(EarlyExit),
    Components(Vec<SelectedComponent<'a>>),
}

pub fn select_components<'a>(
    mukey: &str,
    dataset: &'a SurveyDataset,
    tables: &ReferenceTables,
) -> Result<Selection<'a>, FailureReason> {
    let components = dataset.components_of(mukey);
    if components.is_empty() {
        return Err(FailureReason::NoComponents);
    }

    if let Some(exit) = early_exit(components) {
        return Ok(Selection::Fixed(exit));
    }

    let mapped = components
        .iter()
        .filter_map(|component| {
            tables
                .taxonomy_factor(&component.taxsubgrp)
                .map(|s_fact| (component, s_fact))
        })
        .collect::<Vec<_>>();
    if mapped.is_empty() {
        return Ok(Selection::Fixed(EarlyExit::UnmappedTaxonomy));
    }

    let flooded = mapped.iter().any(|(component, _)| {
        dataset
            .months_of(&component.cokey)
            .iter()
            .any(MonthlyClimate::disqualifies)
    });
    if flooded {
        return Ok(Selection::Fixed(EarlyExit::Flooding));
    }

    let selected = mapped
        .into_iter()
        .filter_map(|(component, s_fact)| {
            let horizons = dataset.horizons_of(&component.cokey);
            if horizons.is_empty() {
                tracing::debug!(
                    mukey,
                    cokey = %component.cokey,
                    "component has no horizons, dropped"
                );
                return None;
            }
            let depth = horizons.iter().filter_map(|horizon| horizon.thickness()).sum();
            let capacities = horizons
                .iter()
                .filter_map(|horizon| horizon.water_capacity())
                .collect::<Vec<_>>();
            let cwhc = if capacities.is_empty() {
                None
            } else {
                Some(capacities.iter().sum())
            };
            let may = dataset
                .months_of(&component.cokey)
                .iter()
                .find(|record| record.is_may());
            Some(SelectedComponent {
                component,
                s_fact,
                cwhc,
                depth,
                may,
            })
        })
        .collect();

    Ok(Selection::Components(selected))
}

fn early_exit(components: &[Component]) -> Option<EarlyExit> {
    if components.iter().any(|c| c.compname == "Gullied Land") {
        Some(EarlyExit::GulliedLand)
    } else if components.iter().any(|c| c.compname == "Urban Land") {
        Some(EarlyExit::UrbanLand)
    } else if components.iter().any(Component::is_wet_class_five) {
        Some(EarlyExit::WetClassFive)
    } else if components.iter().any(Component::is_miscellaneous_area) {
        Some(EarlyExit::MiscellaneousArea)
    } else {
        None
    }
}
