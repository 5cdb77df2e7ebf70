use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    Csr2,
    Pi,
}

impl ScoreMethod {
    /// Column name the method writes next to `mukey`.
    pub fn column(self) -> &'static str {
        match self {
            Self::Csr2 => "csr2",
            Self::Pi => "pi",
        }
    }
}

impl fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreValue {
    Csr2(u32),
    Pi(Option<u32>),
}

impl ScoreValue {
    pub fn method(self) -> ScoreMethod {
        match self {
            Self::Csr2(_) => ScoreMethod::Csr2,
            Self::Pi(_) => ScoreMethod::Pi,
        }
    }

    pub fn as_option(self) -> Option<u32> {
        match self {
            Self::Csr2(value) => Some(value),
            Self::Pi(value) => value,
        }
    }
}

/// One output row: `{mukey, csr2}` or `{mukey, pi}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    pub mukey: String,
    #[serde(flatten)]
    pub value: ScoreValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    NoComponents,
    MissingCoverage { cokey: String },
    NonFiniteScore,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoComponents => f.write_str("map unit has no components"),
            Self::MissingCoverage { cokey } => {
                write!(f, "component {cokey} has no comppct_r value")
            }
            Self::NonFiniteScore => f.write_str("weighted score is not a finite number"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    pub mukey: String,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Scored(ScoreRow),
    Failed(UnitFailure),
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub method: ScoreMethod,
    pub dataset: String,
    pub scored: usize,
    pub skipped_existing: usize,
    pub rows: Vec<ScoreRow>,
    pub failures: Vec<UnitFailure>,
}

impl BatchReport {
    pub fn new(method: ScoreMethod, dataset: impl Into<String>) -> Self {
        Self {
            method,
            dataset: dataset.into(),
            scored: 0,
            skipped_existing: 0,
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Scored(row) => {
                self.scored += 1;
                self.rows.push(row);
            }
            UnitOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
