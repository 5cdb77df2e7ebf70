mod aggregate;
mod batch;
mod cli;
mod config;
mod dataset;
mod error;
mod import_log;
mod lookup;
mod manifest;
mod published;
mod report;
mod score;
mod select;
mod store;
mod types;

use crate::dataset::{DirectoryLayerSource, LayerSource, SurveyDataset};
use crate::error::SoilError;
use crate::import_log::{EventSink, ImportLog, Severity};
use crate::lookup::ReferenceTables;
use crate::store::{CsvResultStore, ResultStore};
use crate::types::config::{OutputFormatName, SoilConfig};
use crate::types::report::{BatchReport, ScoreMethod};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const WARNINGS: i32 = 1;
    pub const RUNTIME_FAILURE: i32 = 3;
}

const DEFAULT_OUTPUT_DIR: &str = "output";

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<i32, SoilError> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let root = cli.config_root.clone().unwrap_or_else(|| PathBuf::from("."));
    let loaded = config::load_config(&root)?;
    if loaded.is_none() {
        tracing::info!(root = %root.display(), "no soilrate.toml found, using defaults");
    }
    let cfg = loaded.unwrap_or_default();

    match cli.command {
        cli::Commands::Score(cmd) => {
            if !cmd.dataset.exists() {
                return Err(SoilError::PathNotFound(cmd.dataset.display().to_string()));
            }
            let source = DirectoryLayerSource::open(&cmd.dataset)?;
            let state = cmd
                .state
                .as_deref()
                .map(|state| state.trim().to_ascii_uppercase())
                .or_else(|| batch::state_from_path(&cmd.dataset));
            let method = resolve_method(cmd.method, state.as_deref(), &cmd.dataset, &cfg)?;
            let format = output_format(cmd.format, &cfg);

            if let Some(mukey) = cmd.mukey.as_deref() {
                return explain_unit(&root, &cfg, &source, method, mukey, format);
            }

            let label = state.unwrap_or_else(|| source.describe());
            let destination = match cmd.dest {
                Some(path) => path,
                None => default_destination(&root, &cfg, method, &label),
            };

            let mut log = ImportLog::new(&root, Some(&cfg));
            let report = score_dataset(&root, &cfg, &source, method, &destination, &mut log)?;
            println!("{}", report::render(&report, format)?);

            if report.has_failures() {
                Ok(exit_code::WARNINGS)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
        cli::Commands::Batch(cmd) => {
            if !cmd.dir.exists() {
                return Err(SoilError::PathNotFound(cmd.dir.display().to_string()));
            }
            let format = output_format(cmd.format, &cfg);
            let datasets = batch::discover(&cmd.dir, &cfg);
            if datasets.is_empty() {
                eprintln!("warning: no gSSURGO_<ST> datasets found in {}", cmd.dir.display());
                return Ok(exit_code::WARNINGS);
            }

            let mut log = ImportLog::new(&root, Some(&cfg));
            let mut code = exit_code::SUCCESS;
            for found in datasets {
                let Some(method) = cfg.method_for_state(&found.state) else {
                    tracing::info!(state = %found.state, "no scorer for state, skipped");
                    continue;
                };
                let destination = match &cmd.dest {
                    Some(dir) => dir.join(result_file_name(method, &found.state)),
                    None => default_destination(&root, &cfg, method, &found.state),
                };

                let outcome = DirectoryLayerSource::open(&found.path).and_then(|source| {
                    score_dataset(&root, &cfg, &source, method, &destination, &mut log)
                });
                match outcome {
                    Ok(report) => {
                        println!("{}", report::render(&report, format)?);
                        if report.has_failures() {
                            code = code.max(exit_code::WARNINGS);
                        }
                    }
                    Err(error) => {
                        tracing::error!(state = %found.state, %error, "dataset import failed");
                        log.log_event(
                            &format!("import failed for state - {}: {error}", found.state),
                            Severity::Error,
                        );
                        log.flush()?;
                        code = exit_code::RUNTIME_FAILURE;
                    }
                }
            }
            Ok(code)
        }
        cli::Commands::SurveyArea(cmd) => {
            let tables = ReferenceTables::load(&root, cfg.reference.as_ref())?;
            match tables.survey_area(&cmd.county) {
                Some(area) => {
                    println!("{area}");
                    Ok(exit_code::SUCCESS)
                }
                None => Err(SoilError::UnknownCounty(cmd.county)),
            }
        }
        cli::Commands::Published(cmd) => {
            let tables = ReferenceTables::load(&root, cfg.reference.as_ref())?;
            let rows = published::join_published(&cmd.mupolygon, &cmd.ratings, &tables)?;
            match cmd.dest {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        if !parent.as_os_str().is_empty() {
                            std::fs::create_dir_all(parent)?;
                        }
                    }
                    let file = std::fs::File::create(&path)?;
                    published::write_published(&rows, file)?;
                    println!("published ratings: {} rows -> {}", rows.len(), path.display());
                }
                None => published::write_published(&rows, std::io::stdout().lock())?,
            }
            if rows.iter().any(|row| row.csr2.is_none()) {
                Ok(exit_code::WARNINGS)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
    }
}

/// Loads one dataset, scores the units not yet stored and appends them.
fn score_dataset(
    root: &Path,
    cfg: &SoilConfig,
    source: &DirectoryLayerSource,
    method: ScoreMethod,
    destination: &Path,
    log: &mut ImportLog,
) -> Result<BatchReport, SoilError> {
    let name = source.describe();
    log.milestone(&format!("scoring {method} for dataset - {name}, [START]"))?;

    let dataset = SurveyDataset::load(source)?;
    let tables = ReferenceTables::load(root, cfg.reference.as_ref())?
        .with_dataset_additions(&dataset, &cfg.musym_additions());

    let mut store = CsvResultStore::open(destination, method)?;
    let existing = store.existing_keys()?;
    let report = aggregate::run_batch(&dataset, &tables, method, &existing, log);

    if let Err(error) = store.append_rows(&report.rows) {
        let message = format!("writing results to {} failed: {error}", store.path().display());
        return Err(abort_run(log, &message, error));
    }

    let written = manifest::RunManifest::new(source, &report)
        .and_then(|manifest| manifest::write_manifest(destination, &manifest));
    let manifest_path = match written {
        Ok(path) => path,
        Err(error) => {
            let message = format!(
                "writing run manifest for {} failed: {error}",
                destination.display()
            );
            return Err(abort_run(log, &message, error));
        }
    };
    tracing::info!(
        destination = %destination.display(),
        manifest = %manifest_path.display(),
        "results written"
    );

    log.milestone(&format!(
        "scoring {method} for dataset - {name}, [END] scored {} failed {}",
        report.scored,
        report.failures.len()
    ))?;
    Ok(report)
}

/// Records a fatal run error and writes out every queued event before the
/// error propagates.
fn abort_run(log: &mut ImportLog, message: &str, error: SoilError) -> SoilError {
    log.log_event(message, Severity::Error);
    if let Err(flush_error) = log.flush() {
        tracing::warn!(%flush_error, "import log flush failed");
    }
    error
}

fn explain_unit(
    root: &Path,
    cfg: &SoilConfig,
    source: &DirectoryLayerSource,
    method: ScoreMethod,
    mukey: &str,
    format: report::OutputFormat,
) -> Result<i32, SoilError> {
    let dataset = SurveyDataset::load(source)?;
    let unit = dataset
        .map_unit(mukey)
        .ok_or_else(|| SoilError::MapUnitNotFound(mukey.to_string()))?;
    let tables = ReferenceTables::load(root, cfg.reference.as_ref())?
        .with_dataset_additions(&dataset, &cfg.musym_additions());

    match method {
        ScoreMethod::Csr2 => match score::csr2::explain_unit(mukey, &dataset, &tables) {
            Ok(explanation) => {
                println!("{}", report::render_explanation(mukey, &explanation, format)?);
                Ok(exit_code::SUCCESS)
            }
            Err(reason) => {
                eprintln!("warning: mukey {mukey} not scored: {reason}");
                Ok(exit_code::WARNINGS)
            }
        },
        ScoreMethod::Pi => {
            let parsed = score::pi::parse_symbol(&unit.musym);
            match score::pi::pi_value(&unit.musym, &tables) {
                Some(value) => {
                    println!(
                        "mukey {mukey} musym {} band {} pi {value}",
                        unit.musym, parsed.band
                    );
                    Ok(exit_code::SUCCESS)
                }
                None => {
                    eprintln!("warning: no PI rating for musym {}", unit.musym);
                    Ok(exit_code::WARNINGS)
                }
            }
        }
    }
}

fn resolve_method(
    choice: cli::MethodChoice,
    state: Option<&str>,
    dataset: &Path,
    cfg: &SoilConfig,
) -> Result<ScoreMethod, SoilError> {
    match choice {
        cli::MethodChoice::Csr2 => Ok(ScoreMethod::Csr2),
        cli::MethodChoice::Pi => Ok(ScoreMethod::Pi),
        cli::MethodChoice::Auto => {
            let state =
                state.ok_or_else(|| SoilError::UnknownState(dataset.display().to_string()))?;
            cfg.method_for_state(state)
                .ok_or_else(|| SoilError::NoScorerForState(state.to_string()))
        }
    }
}

fn output_format(choice: Option<cli::ReportFormat>, cfg: &SoilConfig) -> report::OutputFormat {
    let configured = cfg.output.as_ref().and_then(|output| output.format);
    match (choice, configured) {
        (Some(cli::ReportFormat::Json), _) | (None, Some(OutputFormatName::Json)) => {
            report::OutputFormat::Json
        }
        _ => report::OutputFormat::Md,
    }
}

fn result_file_name(method: ScoreMethod, label: &str) -> String {
    format!("{}_{label}.csv", method.column())
}

fn default_destination(
    root: &Path,
    cfg: &SoilConfig,
    method: ScoreMethod,
    label: &str,
) -> PathBuf {
    let dir = cfg
        .output
        .as_ref()
        .and_then(|output| output.destination.as_deref())
        .unwrap_or(DEFAULT_OUTPUT_DIR);
    config::resolve_path(root, dir).join(result_file_name(method, label))
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}
