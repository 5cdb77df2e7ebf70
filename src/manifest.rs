use crate::dataset::{DirectoryLayerSource, Layer};
use crate::error::Result;
use crate::types::report::{BatchReport, ScoreMethod};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct LayerDigest {
    pub layer: String,
    pub file: String,
    pub sha256: String,
}

/// Provenance for one scoring run, written next to the result file.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub version: String,
    pub generated_at: String,
    pub method: ScoreMethod,
    pub dataset: String,
    pub layers: Vec<LayerDigest>,
    pub scored: usize,
    pub skipped_existing: usize,
    pub failures: usize,
}

impl RunManifest {
    pub fn new(source: &DirectoryLayerSource, report: &BatchReport) -> Result<Self> {
        let mut layers = Vec::new();
        for layer in Layer::ALL {
            let path = source.layer_path(layer);
            if !path.exists() {
                continue;
            }
            let bytes = fs::read(&path)?;
            layers.push(LayerDigest {
                layer: layer.name().to_string(),
                file: path.display().to_string(),
                sha256: sha256_hex(&bytes),
            });
        }

        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            method: report.method,
            dataset: report.dataset.clone(),
            layers,
            scored: report.scored,
            skipped_existing: report.skipped_existing,
            failures: report.failures.len(),
        })
    }
}

pub fn manifest_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".manifest.json");
    PathBuf::from(name)
}

pub fn write_manifest(destination: &Path, manifest: &RunManifest) -> Result<PathBuf> {
    let out_path = manifest_path(destination);
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&out_path, json)?;
    Ok(out_path)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}
