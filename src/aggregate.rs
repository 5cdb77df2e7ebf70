//! Batch scoring over every map unit in a dataset.
//!
//! Units already present in the result store are skipped before any scoring
//! work, so an interrupted run can be restarted against the same
//! destination. A unit that cannot be scored is logged and the batch moves
//! on.

use crate::dataset::SurveyDataset;
use crate::import_log::{EventSink, Severity};
use crate::lookup::ReferenceTables;
use crate::score;
use crate::types::report::{BatchReport, ScoreMethod, UnitFailure, UnitOutcome};
use std::collections::HashSet;

/// Map units between progress log lines.
const PROGRESS_INTERVAL: usize = 500;

pub fn run_batch(
    dataset: &SurveyDataset,
    tables: &ReferenceTables,
    method: ScoreMethod,
    existing: &HashSet<String>,
    sink: &mut dyn EventSink,
) -> BatchReport {
    let mut report = BatchReport::new(method, dataset.name.clone());
    let mut seen = HashSet::new();
    let total = dataset.map_units.len();

    for (index, unit) in dataset.map_units.iter().enumerate() {
        if index > 0 && index % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                dataset = %dataset.name,
                processed = index,
                total,
                "scoring progress"
            );
        }

        if existing.contains(&unit.mukey) {
            report.skipped_existing += 1;
            continue;
        }
        if !seen.insert(unit.mukey.as_str()) {
            tracing::debug!(mukey = %unit.mukey, "duplicate map unit row ignored");
            continue;
        }

        let outcome = match score::score_unit(method, unit, dataset, tables) {
            Ok(row) => UnitOutcome::Scored(row),
            Err(reason) => {
                tracing::warn!(mukey = %unit.mukey, %reason, "map unit not scored");
                sink.log_event(
                    &format!(
                        "Error calculating {} for mukey: {}, {reason}",
                        method.column().to_uppercase(),
                        unit.mukey
                    ),
                    Severity::Error,
                );
                UnitOutcome::Failed(UnitFailure {
                    mukey: unit.mukey.clone(),
                    reason,
                })
            }
        };
        report.record(outcome);
    }

    tracing::info!(
        dataset = %dataset.name,
        %method,
        scored = report.scored,
        skipped = report.skipped_existing,
        failed = report.failures.len(),
        "batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{component, horizon, map_unit};
    use crate::types::report::{FailureReason, ScoreValue};

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<(Severity, String)>,
    }

    impl EventSink for RecordingSink {
        fn log_event(&mut self, message: &str, severity: Severity) {
            self.events.push((severity, message.to_string()));
        }
    }

    fn tables() -> ReferenceTables {
        ReferenceTables::packaged().expect("packaged tables should parse")
    }

    fn dataset() -> SurveyDataset {
        SurveyDataset::from_records(
            "gSSURGO_IA",
            vec![map_unit("1", "8B"), map_unit("2", "9B"), map_unit("3", "10B")],
            vec![component("1", "c1"), component("3", "c3")],
            vec![horizon("c1", 0.0, 150.0, 0.2), horizon("c3", 0.0, 150.0, 0.2)],
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn failed_unit_does_not_stop_the_batch() {
        let mut sink = RecordingSink::default();
        let report = run_batch(
            &dataset(),
            &tables(),
            ScoreMethod::Csr2,
            &HashSet::new(),
            &mut sink,
        );

        assert_eq!(report.scored, 2);
        assert_eq!(
            report.rows.iter().map(|row| row.mukey.as_str()).collect::<Vec<_>>(),
            vec!["1", "3"]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].mukey, "2");
        assert_eq!(report.failures[0].reason, FailureReason::NoComponents);
        assert_eq!(sink.events.len(), 1);
        assert_eq!(sink.events[0].0, Severity::Error);
        assert!(sink.events[0].1.contains("mukey: 2"));
    }

    #[test]
    fn existing_units_are_skipped_before_scoring() {
        let existing = ["1", "2"].iter().map(|key| key.to_string()).collect();
        let mut sink = RecordingSink::default();
        let report = run_batch(
            &dataset(),
            &tables(),
            ScoreMethod::Csr2,
            &existing,
            &mut sink,
        );

        assert_eq!(report.skipped_existing, 2);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].mukey, "3");
        // mukey 2 would fail, but it is never scored.
        assert!(sink.events.is_empty());
    }

    #[test]
    fn second_run_over_all_keys_appends_nothing() {
        let data = dataset();
        let mut sink = RecordingSink::default();
        let first = run_batch(&data, &tables(), ScoreMethod::Pi, &HashSet::new(), &mut sink);
        let existing = first
            .rows
            .iter()
            .map(|row| row.mukey.clone())
            .collect::<HashSet<_>>();

        let second = run_batch(&data, &tables(), ScoreMethod::Pi, &existing, &mut sink);
        assert!(second.rows.is_empty());
        assert_eq!(second.skipped_existing, 3);
    }

    #[test]
    fn duplicate_map_unit_rows_score_once() {
        let data = SurveyDataset::from_records(
            "gSSURGO_IL",
            vec![map_unit("5", "152A"), map_unit("5", "152A")],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let mut sink = RecordingSink::default();
        let report = run_batch(&data, &tables(), ScoreMethod::Pi, &HashSet::new(), &mut sink);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].value, ScoreValue::Pi(Some(140)));
    }
}
