use super::{Layer, LayerSource, Table};
use crate::error::{Result, SoilError};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};

/// A dataset exported as one CSV file per layer, e.g. `gSSURGO_IA/component.csv`.
#[derive(Debug, Clone)]
pub struct DirectoryLayerSource {
    root: PathBuf,
}

impl DirectoryLayerSource {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(SoilError::PathNotFound(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layer_path(&self, layer: Layer) -> PathBuf {
        self.root.join(format!("{}.csv", layer.name()))
    }
}

impl LayerSource for DirectoryLayerSource {
    fn fetch_layer(&self, layer: Layer) -> Result<Table> {
        let path = self.layer_path(layer);
        if !path.exists() {
            if layer.is_required() {
                return Err(SoilError::LayerNotFound(path.display().to_string()));
            }
            tracing::debug!(layer = %layer, "optional layer missing, using empty table");
            return Ok(Table::default());
        }

        let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(&path)?;
        let headers = reader.headers()?.clone();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()?;
        if rows.is_empty() {
            tracing::debug!(layer = %layer, "layer is empty");
        }
        Ok(Table::new(headers, rows))
    }

    fn describe(&self) -> String {
        self.root
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.root.display().to_string())
    }
}
