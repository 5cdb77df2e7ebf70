pub mod json;
pub mod md;

use crate::error::SoilError;
use crate::score::csr2::Csr2Explanation;
use crate::types::report::BatchReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Md,
}

pub fn render(report: &BatchReport, format: OutputFormat) -> Result<String, SoilError> {
    match format {
        OutputFormat::Json => json::to_json(report).map_err(SoilError::Json),
        OutputFormat::Md => Ok(md::to_markdown(report)),
    }
}

pub fn render_explanation(
    mukey: &str,
    explanation: &Csr2Explanation,
    format: OutputFormat,
) -> Result<String, SoilError> {
    match format {
        OutputFormat::Json => {
            json::explanation_to_json(mukey, explanation).map_err(SoilError::Json)
        }
        OutputFormat::Md => Ok(md::explanation_to_markdown(mukey, explanation)),
    }
}
