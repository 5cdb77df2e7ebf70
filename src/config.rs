use crate::error::{Result, SoilError};
use crate::types::config::SoilConfig;
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;

pub const DEFAULT_CONFIG_FILE: &str = "soilrate.toml";
pub const DEFAULT_LOCAL_FILE: &str = ".soilrate/local.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/soilrate/config.toml";

pub fn load_config(root: &Path) -> Result<Option<SoilConfig>> {
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_with_global(root, global.as_deref())
}

/// Where a config layer came from; later layers override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigLayer {
    Global,
    Project,
    Local,
}

impl ConfigLayer {
    fn label(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
            Self::Local => "local",
        }
    }
}

pub(crate) fn load_config_with_global(
    root: &Path,
    global_path: Option<&Path>,
) -> Result<Option<SoilConfig>> {
    let project_path = root.join(DEFAULT_CONFIG_FILE);
    if !project_path.exists() {
        return Ok(None);
    }

    let layers = [
        (ConfigLayer::Global, global_path.map(Path::to_path_buf)),
        (ConfigLayer::Project, Some(project_path)),
        (ConfigLayer::Local, Some(root.join(DEFAULT_LOCAL_FILE))),
    ];

    let mut merged = Value::Table(Map::new());
    for (layer, path) in layers {
        let Some(path) = path.filter(|path| path.exists()) else {
            continue;
        };
        let value = read_layer(layer, &path)?;
        overlay(&mut merged, value);
        tracing::debug!(layer = layer.label(), path = %path.display(), "config layer merged");
    }

    let cfg = decode(merged, "merged config")?;
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Resolves a configured path against the directory the config was loaded from.
pub fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        candidate
    } else {
        root.join(candidate)
    }
}

/// Parses one layer and type-checks it on its own, so a bad value is
/// reported against the file that holds it. Cross-field rules run on the
/// merged result.
fn read_layer(layer: ConfigLayer, path: &Path) -> Result<Value> {
    let source = format!("{} config {}", layer.label(), path.display());
    let content = std::fs::read_to_string(path)?;
    let value: Value =
        toml::from_str(&content).map_err(|e| SoilError::ConfigParse(format!("{source}: {e}")))?;
    if !value.is_table() {
        return Err(SoilError::ConfigParse(format!("{source}: expected a table")));
    }
    decode(value.clone(), &source)?;
    Ok(value)
}

fn decode(value: Value, source: &str) -> Result<SoilConfig> {
    value
        .try_into()
        .map_err(|e: toml::de::Error| SoilError::ConfigParse(format!("{source}: {e}")))
}

/// Tables merge key by key; any other value replaces what was there.
fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Table(base), Value::Table(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
