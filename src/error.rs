use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoilError {
    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("layer not found: {0}")]
    LayerNotFound(String),

    #[error("malformed row in {layer}: {detail}")]
    MalformedRow { layer: String, detail: String },

    #[error("reference table {table} is invalid: {detail}")]
    ReferenceTable { table: String, detail: String },

    #[error("no scorer configured for state: {0}")]
    NoScorerForState(String),

    #[error("cannot infer state from dataset path: {0}")]
    UnknownState(String),

    #[error("unknown county: {0}")]
    UnknownCounty(String),

    #[error("map unit not found: {0}")]
    MapUnitNotFound(String),

    #[error("result destination {path} expects column {expected}, found {found}")]
    DestinationMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SoilError>;
