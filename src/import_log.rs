use crate::config::resolve_path;
use crate::error::SoilError;
use crate::types::config::SoilConfig;
use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_IMPORT_LOG: &str = ".soilrate/import.log";

/// Entries buffered before an automatic flush.
const FLUSH_THRESHOLD: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("INFO"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// Fire-and-forget diagnostic sink.
pub trait EventSink {
    fn log_event(&mut self, message: &str, severity: Severity);
}

#[derive(Debug, Clone)]
struct ImportLogSettings {
    path: PathBuf,
    max_log_size_kb: u64,
    retained_logs: usize,
}

#[derive(Debug, Clone)]
struct LogEntry {
    timestamp: String,
    severity: Severity,
    description: String,
}

/// Timestamped import history, one line per event, rotated by size.
pub struct ImportLog {
    settings: ImportLogSettings,
    pending: Vec<LogEntry>,
}

impl ImportLog {
    pub fn new(root: &Path, cfg: Option<&SoilConfig>) -> Self {
        Self {
            settings: resolve_settings(root, cfg),
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.settings.path
    }

    /// Records an event and writes it out immediately.
    pub fn milestone(&mut self, message: &str) -> Result<(), SoilError> {
        self.push_entry(message, Severity::Info);
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), SoilError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.settings.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.settings.path)?;

        for entry in &self.pending {
            writeln!(
                file,
                "{} | {} | {}",
                entry.timestamp, entry.severity, entry.description
            )?;
        }
        file.flush()?;

        self.pending.clear();
        self.rotate_if_needed()
    }

    fn push_entry(&mut self, message: &str, severity: Severity) {
        self.pending.push(LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            severity,
            description: message.to_string(),
        });
    }

    fn rotate_if_needed(&self) -> Result<(), SoilError> {
        let log_path = &self.settings.path;
        let max_bytes = self.settings.max_log_size_kb * 1024;
        let metadata = match std::fs::metadata(log_path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(SoilError::Io(error)),
        };

        if metadata.len() <= max_bytes {
            return Ok(());
        }

        let parent = log_path.parent().unwrap_or_else(|| Path::new("."));
        let stem = log_path
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("import");
        let extension = log_path
            .extension()
            .and_then(|value| value.to_str())
            .unwrap_or("log");
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let rotated = parent.join(format!("{stem}-{stamp}.{extension}"));
        std::fs::rename(log_path, &rotated)?;
        std::fs::write(log_path, "")?;
        self.prune_rotated_logs(parent, stem, extension)
    }

    fn prune_rotated_logs(
        &self,
        parent: &Path,
        stem: &str,
        extension: &str,
    ) -> Result<(), SoilError> {
        let prefix = format!("{stem}-");
        let suffix = format!(".{extension}");
        let mut rotated = std::fs::read_dir(parent)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|value| value.to_str())
                    .map(|name| name.starts_with(&prefix) && name.ends_with(&suffix))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();

        rotated.sort();
        while rotated.len() > self.settings.retained_logs {
            let stale = rotated.remove(0);
            std::fs::remove_file(stale)?;
        }
        Ok(())
    }
}

impl EventSink for ImportLog {
    fn log_event(&mut self, message: &str, severity: Severity) {
        self.push_entry(message, severity);
        if self.pending.len() >= FLUSH_THRESHOLD {
            if let Err(error) = self.flush() {
                tracing::warn!(%error, "import log flush failed");
            }
        }
    }
}

fn resolve_settings(root: &Path, cfg: Option<&SoilConfig>) -> ImportLogSettings {
    let import_log = cfg.and_then(|value| value.import_log.as_ref());
    let relative = import_log
        .and_then(|value| value.path.as_deref())
        .unwrap_or(DEFAULT_IMPORT_LOG);
    let max_log_size_kb = import_log
        .and_then(|value| value.max_log_size_kb)
        .unwrap_or(1024)
        .max(1) as u64;
    let retained_logs = import_log
        .and_then(|value| value.retained_logs)
        .unwrap_or(3)
        .max(1) as usize;

    ImportLogSettings {
        path: resolve_path(root, relative),
        max_log_size_kb,
        retained_logs,
    }
}
