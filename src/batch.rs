use crate::types::config::SoilConfig;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DATASET_PREFIX: &str = "gSSURGO_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDataset {
    pub state: String,
    pub path: PathBuf,
}

/// State code from a dataset directory name such as `gSSURGO_IA` or
/// `gSSURGO_IA.gdb`.
pub fn state_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let state = stem.strip_prefix(DATASET_PREFIX)?;
    if state.is_empty() || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(state.to_ascii_uppercase())
}

/// Finds every state dataset directory under `root`, ordered by path.
pub fn discover(root: &Path, cfg: &SoilConfig) -> Vec<StateDataset> {
    let mut found = WalkDir::new(root)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let path = entry.path();
            let state = state_from_path(path)?;
            if !cfg.is_known_state(&state) {
                tracing::debug!(path = %path.display(), %state, "unknown state code, skipped");
                return None;
            }
            Some(StateDataset {
                state,
                path: path.to_path_buf(),
            })
        })
        .collect::<Vec<_>>();
    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}
