use crate::score::csr2::Csr2Explanation;
use crate::types::report::BatchReport;

/// Rows are left out; they live in the result file.
pub fn to_markdown(report: &BatchReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "# {} Scoring Report\n\n",
        report.method.column().to_uppercase()
    ));
    output.push_str(&format!("Dataset: {}\n\n", report.dataset));
    output.push_str("## Summary\n\n");
    output.push_str(&format!(
        "- scored: {}\n- skipped (already stored): {}\n- failed: {}\n\n",
        report.scored,
        report.skipped_existing,
        report.failures.len()
    ));

    output.push_str("## Failures\n\n");
    if report.failures.is_empty() {
        output.push_str("- none\n");
    } else {
        for failure in &report.failures {
            output.push_str(&format!("- mukey {}: {}\n", failure.mukey, failure.reason));
        }
    }

    output
}

pub fn explanation_to_markdown(mukey: &str, explanation: &Csr2Explanation) -> String {
    let mut output = String::new();
    output.push_str(&format!("# CSR2 for mukey {mukey}\n\n"));
    match explanation {
        Csr2Explanation::EarlyExit { rule, csr2 } => {
            output.push_str(&format!("Early exit: {rule:?} -> {csr2}\n"));
        }
        Csr2Explanation::Weighted { components, csr2 } => {
            output.push_str("| cokey | compname | pct | S | M | W | D | F | EJ | CSR2 |\n");
            output.push_str("|---|---|---|---|---|---|---|---|---|---|\n");
            for c in components {
                let pct = c
                    .comppct_r
                    .map(|value| format!("{value}"))
                    .unwrap_or_else(|| "-".to_string());
                output.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                    c.cokey,
                    c.compname,
                    pct,
                    c.s_fact,
                    c.m_fact,
                    c.w_fact,
                    c.d_fact,
                    c.f_fact,
                    c.ej_fact,
                    c.csr2
                ));
            }
            output.push_str(&format!("\nWeighted CSR2: {csr2}\n"));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::csr2::FactorBreakdown;
    use crate::types::report::{FailureReason, ScoreMethod, UnitFailure, UnitOutcome};

    #[test]
    fn markdown_report_contains_sections() {
        let mut report = BatchReport::new(ScoreMethod::Pi, "gSSURGO_IL");
        report.skipped_existing = 3;
        report.record(UnitOutcome::Failed(UnitFailure {
            mukey: "12".to_string(),
            reason: FailureReason::NoComponents,
        }));

        let rendered = to_markdown(&report);
        assert!(rendered.contains("# PI Scoring Report"));
        assert!(rendered.contains("- skipped (already stored): 3"));
        assert!(rendered.contains("- mukey 12: map unit has no components"));
    }

    #[test]
    fn explanation_table_lists_each_component() {
        let explanation = Csr2Explanation::Weighted {
            components: vec![FactorBreakdown {
                cokey: "c1".to_string(),
                compname: "Clarion".to_string(),
                comppct_r: Some(60.0),
                s_fact: 100.0,
                m_fact: 0.0,
                w_fact: 0.0,
                d_fact: 0.0,
                f_fact: 5.0,
                ej_fact: 0.0,
                csr2: 95.0,
            }],
            csr2: 95,
        };
        let rendered = explanation_to_markdown("409089", &explanation);
        assert!(rendered.contains("| c1 | Clarion | 60 | 100 | 0 | 0 | 0 | 5 | 0 | 95 |"));
        assert!(rendered.contains("Weighted CSR2: 95"));
    }
}
