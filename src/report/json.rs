use crate::score::csr2::Csr2Explanation;
use crate::types::report::BatchReport;
use serde_json::json;

pub fn to_json(report: &BatchReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn explanation_to_json(
    mukey: &str,
    explanation: &Csr2Explanation,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "mukey": mukey,
        "explanation": explanation,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::EarlyExit;
    use crate::types::report::{
        FailureReason, ScoreMethod, ScoreRow, ScoreValue, UnitFailure, UnitOutcome,
    };

    #[test]
    fn json_report_lists_rows_and_failures() {
        let mut report = BatchReport::new(ScoreMethod::Csr2, "gSSURGO_IA");
        report.record(UnitOutcome::Scored(ScoreRow {
            mukey: "1".to_string(),
            value: ScoreValue::Csr2(62),
        }));
        report.record(UnitOutcome::Failed(UnitFailure {
            mukey: "2".to_string(),
            reason: FailureReason::MissingCoverage {
                cokey: "c9".to_string(),
            },
        }));

        let rendered = to_json(&report).expect("json should serialize");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["method"], "csr2");
        assert_eq!(value["rows"][0]["csr2"], 62);
        assert_eq!(value["failures"][0]["reason"]["kind"], "missing_coverage");
        assert_eq!(value["failures"][0]["reason"]["cokey"], "c9");
    }

    #[test]
    fn explanation_names_the_early_exit_rule() {
        let explanation = Csr2Explanation::EarlyExit {
            rule: EarlyExit::WetClassFive,
            csr2: 25,
        };
        let rendered = explanation_to_json("7", &explanation).expect("json should serialize");
        assert!(rendered.contains("\"rule\": \"wet_class_five\""));
        assert!(rendered.contains("\"csr2\": 25"));
    }
}
