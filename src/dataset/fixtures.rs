//! Record builders shared by unit tests.

use crate::types::survey::{Component, Duration, Frequency, Horizon, MapUnit, MonthlyClimate};

pub fn map_unit(mukey: &str, musym: &str) -> MapUnit {
    MapUnit {
        mukey: mukey.to_string(),
        muname: format!("unit {mukey}"),
        musym: musym.to_string(),
        csr: None,
    }
}

/// A well-drained, mapped component covering the whole unit.
pub fn component(mukey: &str, cokey: &str) -> Component {
    Component {
        mukey: mukey.to_string(),
        cokey: cokey.to_string(),
        compname: "Testsoil".to_string(),
        compkind: "Series".to_string(),
        comppct_r: Some(100.0),
        majcompflag: "Yes".to_string(),
        localphase: String::new(),
        taxsubgrp: "Typic Hapludolls".to_string(),
        taxpartsize: "fine-loamy".to_string(),
        tfact: Some(5),
        slope_r: Some(1.0),
        erocl: String::new(),
        nirrcapscl: "e".to_string(),
        nirrcapcl: Some(2),
    }
}

pub fn horizon(cokey: &str, top: f64, bottom: f64, awc: f64) -> Horizon {
    Horizon {
        cokey: cokey.to_string(),
        chkey: format!("{cokey}-{top}"),
        hzdept_r: Some(top),
        hzdepb_r: Some(bottom),
        awc_r: Some(awc),
    }
}

pub fn month(cokey: &str, name: &str) -> MonthlyClimate {
    MonthlyClimate {
        cokey: cokey.to_string(),
        month: name.to_string(),
        flood_frequency: Frequency::None,
        flood_duration: Duration::None,
        pond_frequency: Frequency::None,
        pond_duration: Duration::None,
    }
}
