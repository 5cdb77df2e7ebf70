use crate::error::SoilError;
use crate::types::report::ScoreMethod;
use serde::Deserialize;
use std::collections::HashSet;

/// Every state and territory code the survey archive publishes.
pub const SURVEY_STATES: [&str; 58] = [
    "AK", "AL", "AR", "AS", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "FM", "GA", "GU", "HI",
    "IA", "ID", "IL", "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MH", "MI", "MN", "MO", "MP",
    "MS", "MT", "NC", "ND", "NE", "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA",
    "PRUSVI", "PW", "RI", "SC", "SD", "TN", "TX", "UT", "VA", "VT", "WA", "WI", "WV", "WY",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SoilConfig {
    pub states: Option<StatesConfig>,
    pub reference: Option<ReferenceConfig>,
    pub ej: Option<EjConfig>,
    pub output: Option<OutputConfig>,
    pub import_log: Option<ImportLogConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatesConfig {
    #[serde(default = "default_csr2_states")]
    pub csr2: Vec<String>,
    #[serde(default = "default_pi_states")]
    pub pi: Vec<String>,
    pub all: Option<Vec<String>>,
}

fn default_csr2_states() -> Vec<String> {
    vec!["IA".to_string()]
}

fn default_pi_states() -> Vec<String> {
    vec!["IL".to_string()]
}

/// Optional file overrides for the packaged lookup tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceConfig {
    pub taxonomy_factors: Option<String>,
    pub particle_size_factors: Option<String>,
    pub ej_subtract: Option<String>,
    pub ej_add: Option<String>,
    pub county_survey_areas: Option<String>,
    pub pi_ratings: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EjConfig {
    #[serde(default)]
    pub musym_additions: Vec<MusymAddition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MusymAddition {
    pub musym: String,
    pub points: i32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatName {
    Md,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub destination: Option<String>,
    pub format: Option<OutputFormatName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportLogConfig {
    pub path: Option<String>,
    pub max_log_size_kb: Option<u32>,
    pub retained_logs: Option<u32>,
}

impl SoilConfig {
    /// Map-symbol corrections applied to every dataset when none are configured.
    pub fn default_musym_additions() -> Vec<MusymAddition> {
        vec![MusymAddition {
            musym: "221B".to_string(),
            points: 10,
        }]
    }

    pub fn musym_additions(&self) -> Vec<MusymAddition> {
        match &self.ej {
            Some(ej) => ej.musym_additions.clone(),
            None => Self::default_musym_additions(),
        }
    }

    pub fn method_for_state(&self, state: &str) -> Option<ScoreMethod> {
        let state = state.trim().to_ascii_uppercase();
        let (csr2, pi) = match &self.states {
            Some(states) => (states.csr2.clone(), states.pi.clone()),
            None => (default_csr2_states(), default_pi_states()),
        };
        if csr2.iter().any(|code| code.eq_ignore_ascii_case(&state)) {
            Some(ScoreMethod::Csr2)
        } else if pi.iter().any(|code| code.eq_ignore_ascii_case(&state)) {
            Some(ScoreMethod::Pi)
        } else {
            None
        }
    }

    pub fn known_states(&self) -> Vec<String> {
        self.states
            .as_ref()
            .and_then(|states| states.all.clone())
            .unwrap_or_else(|| SURVEY_STATES.iter().map(|code| code.to_string()).collect())
    }

    pub fn is_known_state(&self, state: &str) -> bool {
        self.known_states()
            .iter()
            .any(|code| code.eq_ignore_ascii_case(state))
    }

    pub fn validate(&self) -> Result<(), SoilError> {
        if let Some(states) = &self.states {
            let known = self.known_states();
            let mut seen = HashSet::new();
            for code in states.csr2.iter().chain(states.pi.iter()) {
                let upper = code.to_ascii_uppercase();
                if !known.iter().any(|known| known.eq_ignore_ascii_case(&upper)) {
                    return Err(SoilError::ConfigParse(format!(
                        "states lists unknown state code: {code}"
                    )));
                }
                if !seen.insert(upper) {
                    return Err(SoilError::ConfigParse(format!(
                        "state {code} is assigned to more than one scorer"
                    )));
                }
            }
        }

        if let Some(ej) = &self.ej {
            for addition in &ej.musym_additions {
                if addition.musym.trim().is_empty() {
                    return Err(SoilError::ConfigParse(
                        "ej.musym_additions entries need a non-empty musym".to_string(),
                    ));
                }
                if addition.points < 0 {
                    return Err(SoilError::ConfigParse(format!(
                        "ej.musym_additions points must be non-negative (musym {})",
                        addition.musym
                    )));
                }
            }
        }

        if let Some(import_log) = &self.import_log {
            if import_log.max_log_size_kb == Some(0) {
                return Err(SoilError::ConfigParse(
                    "import_log.max_log_size_kb must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> SoilConfig {
        toml::from_str(toml_str).expect("config should parse")
    }

    #[test]
    fn empty_config_uses_default_state_routing() {
        let config = parse("");
        assert_eq!(config.method_for_state("IA"), Some(ScoreMethod::Csr2));
        assert_eq!(config.method_for_state("il"), Some(ScoreMethod::Pi));
        assert_eq!(config.method_for_state("NE"), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_musym_additions_apply_without_ej_section() {
        let config = parse("");
        assert_eq!(
            config.musym_additions(),
            vec![MusymAddition {
                musym: "221B".to_string(),
                points: 10
            }]
        );
    }

    #[test]
    fn explicit_ej_section_replaces_defaults() {
        let config = parse(
            r#"
[ej]
musym_additions = [{ musym = "11B", points = 4 }]
"#,
        );
        assert_eq!(config.musym_additions().len(), 1);
        assert_eq!(config.musym_additions()[0].musym, "11B");
    }

    #[test]
    fn parse_full_config() {
        let config = parse(
            r#"
[states]
csr2 = ["IA", "MN"]
pi = ["IL"]

[reference]
taxonomy_factors = "ref/taxonomy.csv"

[output]
destination = "out/results.csv"
format = "json"

[import_log]
path = "logs/import.log"
max_log_size_kb = 10
retained_logs = 2
"#,
        );
        assert_eq!(config.method_for_state("MN"), Some(ScoreMethod::Csr2));
        assert!(matches!(
            config.output.as_ref().and_then(|output| output.format),
            Some(OutputFormatName::Json)
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_state_on_two_scorers() {
        let config = parse(
            r#"
[states]
csr2 = ["IA"]
pi = ["IA"]
"#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_state_code() {
        let config = parse(
            r#"
[states]
csr2 = ["XX"]
"#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_points() {
        let config = parse(
            r#"
[[ej.musym_additions]]
musym = "221B"
points = -3
"#,
        );
        assert!(config.validate().is_err());
    }
}
