pub mod csr2;
pub mod pi;

use crate::dataset::SurveyDataset;
use crate::lookup::ReferenceTables;
use crate::types::report::{FailureReason, ScoreMethod, ScoreRow, ScoreValue};
use crate::types::survey::MapUnit;

pub fn score_unit(
    method: ScoreMethod,
    unit: &MapUnit,
    dataset: &SurveyDataset,
    tables: &ReferenceTables,
) -> Result<ScoreRow, FailureReason> {
    let value = match method {
        ScoreMethod::Csr2 => ScoreValue::Csr2(csr2::score_unit(&unit.mukey, dataset, tables)?),
        ScoreMethod::Pi => ScoreValue::Pi(pi::pi_value(&unit.musym, tables)),
    };
    Ok(ScoreRow {
        mukey: unit.mukey.clone(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::map_unit;

    #[test]
    fn pi_scoring_reads_the_map_symbol() {
        let tables = ReferenceTables::packaged().expect("packaged tables should parse");
        let unit = map_unit("7", "152A");
        let dataset = SurveyDataset::from_records(
            "gSSURGO_IL",
            vec![unit.clone()],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        let row = score_unit(ScoreMethod::Pi, &unit, &dataset, &tables).expect("pi should score");
        assert_eq!(row.value, ScoreValue::Pi(Some(140)));
    }

    #[test]
    fn csr2_scoring_propagates_unit_failures() {
        let tables = ReferenceTables::packaged().expect("packaged tables should parse");
        let unit = map_unit("7", "152A");
        let dataset = SurveyDataset::from_records(
            "gSSURGO_IA",
            vec![unit.clone()],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(
            score_unit(ScoreMethod::Csr2, &unit, &dataset, &tables),
            Err(FailureReason::NoComponents)
        );
    }
}
