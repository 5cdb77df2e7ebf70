use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "soilrate",
    version,
    about = "Soil productivity scoring (CSR2 and Illinois PI) for survey datasets"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory holding soilrate.toml and .soilrate/ (defaults to the current directory)
    #[arg(long, global = true)]
    pub config_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score every map unit of one dataset directory
    Score(ScoreCommand),
    /// Score every gSSURGO_<ST> dataset found under a folder
    Batch(BatchCommand),
    /// Print the survey-area symbol for an Iowa county
    SurveyArea(SurveyAreaCommand),
    /// Attach published county CSR2 ratings to map units
    Published(PublishedCommand),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MethodChoice {
    Csr2,
    Pi,
    /// Pick from the dataset's state
    Auto,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
}

#[derive(Args)]
pub struct ScoreCommand {
    pub dataset: PathBuf,
    #[arg(long, value_enum, default_value = "auto")]
    pub method: MethodChoice,
    /// State code used when the dataset directory name does not carry one
    #[arg(long)]
    pub state: Option<String>,
    /// Result CSV; appended to when it exists
    #[arg(long)]
    pub dest: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
    /// Print the factor breakdown of a single map unit instead of scoring the dataset
    #[arg(long)]
    pub mukey: Option<String>,
}

#[derive(Args)]
pub struct BatchCommand {
    pub dir: PathBuf,
    /// Output directory for <method>_<ST>.csv files
    #[arg(long)]
    pub dest: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

#[derive(Args)]
pub struct SurveyAreaCommand {
    pub county: String,
}

#[derive(Args)]
pub struct PublishedCommand {
    pub mupolygon: PathBuf,
    pub ratings: PathBuf,
    /// Output CSV (stdout when omitted)
    #[arg(long)]
    pub dest: Option<PathBuf>,
}
