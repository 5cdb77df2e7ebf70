use crate::error::{Result, SoilError};
use crate::types::report::{ScoreMethod, ScoreRow};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Destination for scored rows, keyed by mukey.
pub trait ResultStore {
    fn existing_keys(&self) -> Result<HashSet<String>>;
    fn append_rows(&mut self, rows: &[ScoreRow]) -> Result<usize>;
}

/// Two-column CSV file: `mukey,<method column>`.
#[derive(Debug)]
pub struct CsvResultStore {
    path: PathBuf,
    method: ScoreMethod,
}

impl CsvResultStore {
    /// Opens a destination file, checking the header of an existing one.
    pub fn open(path: &Path, method: ScoreMethod) -> Result<Self> {
        let store = Self {
            path: path.to_path_buf(),
            method,
        };
        if store.has_content()? {
            let mut reader = csv::Reader::from_path(&store.path)?;
            let headers = reader.headers()?.clone();
            let expected = store.header();
            let found = headers.iter().collect::<Vec<_>>();
            if found != expected {
                return Err(SoilError::DestinationMismatch {
                    path: store.path.display().to_string(),
                    expected: expected.join(","),
                    found: found.join(","),
                });
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header(&self) -> [&'static str; 2] {
        ["mukey", self.method.column()]
    }

    fn has_content(&self) -> Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.len() > 0),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(SoilError::Io(error)),
        }
    }
}

impl ResultStore for CsvResultStore {
    fn existing_keys(&self) -> Result<HashSet<String>> {
        if !self.has_content()? {
            return Ok(HashSet::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut keys = HashSet::new();
        for record in reader.records() {
            let record = record?;
            if let Some(mukey) = record.get(0) {
                keys.insert(mukey.to_string());
            }
        }
        Ok(keys)
    }

    fn append_rows(&mut self, rows: &[ScoreRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let write_header = !self.has_content()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);
        if write_header {
            writer.write_record(self.header())?;
        }
        for row in rows {
            if row.value.method() != self.method {
                return Err(SoilError::DestinationMismatch {
                    path: self.path.display().to_string(),
                    expected: self.method.to_string(),
                    found: row.value.method().to_string(),
                });
            }
            let value = row
                .value
                .as_option()
                .map(|value| value.to_string())
                .unwrap_or_default();
            writer.write_record([row.mukey.as_str(), value.as_str()])?;
        }
        writer.flush()?;
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "rows appended");
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::ScoreValue;

    fn csr2_row(mukey: &str, value: u32) -> ScoreRow {
        ScoreRow {
            mukey: mukey.to_string(),
            value: ScoreValue::Csr2(value),
        }
    }

    #[test]
    fn new_destination_gets_header_then_rows() {
        let dir = tempfile::TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("out/csr2_IA.csv");
        let mut store = CsvResultStore::open(&path, ScoreMethod::Csr2).expect("store opens");
        assert!(store.existing_keys().expect("keys").is_empty());

        store
            .append_rows(&[csr2_row("1", 62), csr2_row("2", 5)])
            .expect("append should succeed");

        let content = std::fs::read_to_string(&path).expect("output should exist");
        assert_eq!(content, "mukey,csr2\n1,62\n2,5\n");
    }

    #[test]
    fn append_keeps_prior_rows_and_reports_keys() {
        let dir = tempfile::TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("csr2.csv");
        std::fs::write(&path, "mukey,csr2\n1,62\n").expect("seed file");

        let mut store = CsvResultStore::open(&path, ScoreMethod::Csr2).expect("store opens");
        let keys = store.existing_keys().expect("keys");
        assert!(keys.contains("1"));

        store.append_rows(&[csr2_row("2", 40)]).expect("append");
        let content = std::fs::read_to_string(&path).expect("output should exist");
        assert_eq!(content, "mukey,csr2\n1,62\n2,40\n");
    }

    #[test]
    fn null_pi_is_written_as_empty_cell() {
        let dir = tempfile::TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("pi.csv");
        let mut store = CsvResultStore::open(&path, ScoreMethod::Pi).expect("store opens");
        store
            .append_rows(&[ScoreRow {
                mukey: "9".to_string(),
                value: ScoreValue::Pi(None),
            }])
            .expect("append");

        let content = std::fs::read_to_string(&path).expect("output should exist");
        assert_eq!(content, "mukey,pi\n9,\n");
    }

    #[test]
    fn header_for_another_method_is_rejected() {
        let dir = tempfile::TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("mixed.csv");
        std::fs::write(&path, "mukey,pi\n1,120\n").expect("seed file");

        let err = CsvResultStore::open(&path, ScoreMethod::Csr2).expect_err("should mismatch");
        assert!(matches!(err, SoilError::DestinationMismatch { .. }));
    }

    #[test]
    fn empty_append_does_not_create_file() {
        let dir = tempfile::TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("none.csv");
        let mut store = CsvResultStore::open(&path, ScoreMethod::Csr2).expect("store opens");
        assert_eq!(store.append_rows(&[]).expect("append"), 0);
        assert!(!path.exists());
    }
}
