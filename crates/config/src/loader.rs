use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    error::{Error, Result},
    schema::{MarketsmithConfig, SourceOfTruth},
    validate::check_source_of_truth,
};

/// Standard settings file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "marketsmith.toml",
    "marketsmith.yaml",
    "marketsmith.yml",
    "marketsmith.json",
];

/// Load pipeline settings from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<MarketsmithConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let ext = extension(path);

    match ext.as_str() {
        "toml" => Ok(toml::from_str(&raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&raw)?),
        "json" => Ok(serde_json::from_str(&raw)?),
        _ => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext,
        }),
    }
}

/// Discover and load settings from standard locations.
///
/// Search order:
/// 1. `<project_root>/marketsmith.{toml,yaml,yml,json}`
/// 2. `~/.config/marketsmith/marketsmith.{toml,yaml,yml,json}`
///
/// Returns the defaults if no settings file exists. A file that exists but
/// fails to parse is an error: the pipeline writes files, so it must not
/// silently fall back to a layout the user did not ask for.
pub fn discover_and_load(project_root: &Path) -> Result<MarketsmithConfig> {
    match find_config_file(project_root) {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            load_config(&path)
        },
        None => {
            debug!("no settings file found, using defaults");
            Ok(MarketsmithConfig::default())
        },
    }
}

/// Find the first settings file in standard locations.
pub fn find_config_file(project_root: &Path) -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = project_root.join(name);
        if p.is_file() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Returns the user-global settings directory (`~/.config/marketsmith/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "marketsmith").map(|d| d.config_dir().to_path_buf())
}

/// Pick the first existing source-of-truth candidate.
///
/// Relative candidates are resolved against `project_root`. When none
/// exists, the error lists every resolved location that was tried.
pub fn locate_source_of_truth(project_root: &Path, candidates: &[PathBuf]) -> Result<PathBuf> {
    let resolved: Vec<PathBuf> = candidates
        .iter()
        .map(|c| {
            if c.is_absolute() {
                c.clone()
            } else {
                project_root.join(c)
            }
        })
        .collect();

    if let Some(found) = resolved.iter().find(|p| p.is_file()) {
        debug!(path = %found.display(), "source of truth located");
        return Ok(found.clone());
    }
    Err(Error::missing_input("source of truth (VARIABLES.yaml)", resolved))
}

/// Read and check the source of truth.
///
/// The raw document is checked for required keys under
/// `marketplaces.<marketplace_key>` before typed deserialization, so a
/// malformed file reports every missing key at once. Only that record is
/// decoded; sibling marketplaces are dropped unread.
pub fn load_source_of_truth(path: &Path, marketplace_key: &str) -> Result<SourceOfTruth> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let doc = parse_value(&raw, path)?;

    let result = check_source_of_truth(&doc, marketplace_key);
    if result.has_errors() {
        return Err(Error::malformed(path, result.error_messages()));
    }

    let source: SourceOfTruth = serde_json::from_value(select_marketplace(doc, marketplace_key))
        .map_err(|e| Error::malformed(path, vec![e.to_string()]))?;
    debug!(
        path = %path.display(),
        marketplace = marketplace_key,
        plugins = source.marketplaces.get(marketplace_key).map_or(0, |r| r.plugins.len()),
        "source of truth loaded"
    );
    Ok(source)
}

fn select_marketplace(mut doc: serde_json::Value, key: &str) -> serde_json::Value {
    if let Some(serde_json::Value::Object(marketplaces)) = doc.get_mut("marketplaces") {
        marketplaces.retain(|name, _| name == key);
    }
    doc
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml")
        .to_ascii_lowercase()
}

fn parse_value(raw: &str, path: &Path) -> Result<serde_json::Value> {
    let ext = extension(path);

    match ext.as_str() {
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext,
        }),
    }
}
