//! Discovery of command-definition files and hook scripts.
//!
//! Discovery feeds the grouper and splitter; it never fails a pass. A
//! missing directory yields nothing and unreadable entries are skipped with
//! a warning.

use std::path::{Path, PathBuf};

use {marketsmith_config::PathsConfig, tracing::warn};

use crate::path::PathNormalizer;

/// One discovered asset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// File name without extension; the command identifier.
    pub stem: String,
    /// Root-relative `./` reference written into descriptors.
    pub reference: String,
}

/// Producer of the asset lists consumed by grouping and splitting.
pub trait AssetSource {
    /// Command-definition files, sorted by file name.
    fn commands(&self) -> Vec<AssetFile>;
    /// Hook scripts, sorted by file name.
    fn hook_scripts(&self) -> Vec<AssetFile>;
}

/// Scans the configured command and hook directories.
pub struct FsAssetSource {
    normalizer: PathNormalizer,
    commands_dir: PathBuf,
    command_extension: String,
    hooks_dir: PathBuf,
    hook_extension: String,
}

impl FsAssetSource {
    pub fn new(root: &Path, paths: &PathsConfig) -> Self {
        Self {
            normalizer: PathNormalizer::new(root),
            commands_dir: root.join(&paths.commands_dir),
            command_extension: paths.command_extension.clone(),
            hooks_dir: root.join(&paths.hooks_dir),
            hook_extension: paths.hook_extension.clone(),
        }
    }

    fn scan(&self, dir: &Path, extension: &str) -> Vec<AssetFile> {
        if !dir.is_dir() {
            return Vec::new();
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), %e, "failed to read asset directory");
                return Vec::new();
            },
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some(extension))
            .collect();
        files.sort();

        files
            .into_iter()
            .filter_map(|path| {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    warn!(path = %path.display(), "skipping asset with non-UTF-8 name");
                    return None;
                };
                Some(AssetFile {
                    stem: stem.to_string(),
                    reference: self.normalizer.reference_for(&path),
                })
            })
            .collect()
    }
}

impl AssetSource for FsAssetSource {
    fn commands(&self) -> Vec<AssetFile> {
        self.scan(&self.commands_dir, &self.command_extension)
    }

    fn hook_scripts(&self) -> Vec<AssetFile> {
        self.scan(&self.hooks_dir, &self.hook_extension)
    }
}

/// Fixed asset lists, for callers that already know their inputs.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    pub commands: Vec<AssetFile>,
    pub hook_scripts: Vec<AssetFile>,
}

impl StaticAssets {
    /// Build command entries from `./`-style references.
    pub fn with_commands<'a>(mut self, references: impl IntoIterator<Item = &'a str>) -> Self {
        self.commands = references.into_iter().map(asset_from_reference).collect();
        self
    }

    pub fn with_hook_scripts<'a>(mut self, references: impl IntoIterator<Item = &'a str>) -> Self {
        self.hook_scripts = references.into_iter().map(asset_from_reference).collect();
        self
    }
}

impl AssetSource for StaticAssets {
    fn commands(&self) -> Vec<AssetFile> {
        self.commands.clone()
    }

    fn hook_scripts(&self) -> Vec<AssetFile> {
        self.hook_scripts.clone()
    }
}

fn asset_from_reference(reference: &str) -> AssetFile {
    let stem = Path::new(reference)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(reference)
        .to_string();
    AssetFile {
        stem,
        reference: reference.to_string(),
    }
}
