//! Filesystem orchestration of the passes.
//!
//! Every pass follows the same discipline: locate and parse inputs, compute
//! the complete output set in memory, check it, then back up and write.
//! Any failure before the write step leaves the filesystem untouched.

use std::path::{Path, PathBuf};

use {
    chrono::{DateTime, Local},
    marketsmith_config::{
        MarketsmithConfig, discover_and_load, load_config, load_source_of_truth,
        locate_source_of_truth,
    },
    tracing::{info, warn},
};

use crate::{
    backup::backup,
    discover::FsAssetSource,
    error::{Error, Result},
    group::{GroupContext, group},
    path::{PathNormalizer, UnresolvedPath},
    project::project,
    report::{PassKind, PassOutput, PassReport},
    split::{SplitContext, split},
    store::{DescriptorStore, render},
    types::MarketplaceDescriptor,
    validate::check_descriptor,
};

/// Per-run switches.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compute and render outputs without backing up or writing.
    pub dry_run: bool,
    /// Fail with [`Error::UnresolvablePath`] instead of passing unresolved
    /// paths through.
    pub strict_paths: bool,
    /// Clock for timestamps and backup names.
    pub now: DateTime<Local>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            strict_paths: false,
            now: Local::now(),
        }
    }
}

/// A project root plus its pipeline settings.
pub struct Workspace {
    root: PathBuf,
    config: MarketsmithConfig,
}

impl Workspace {
    /// The root is canonicalized when possible so absolute asset paths can
    /// be matched against it.
    pub fn new(root: &Path, config: MarketsmithConfig) -> Self {
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self { root, config }
    }

    /// Load settings from `config_path`, or discover them for `root`.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => load_config(path)?,
            None => discover_and_load(root)?,
        };
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &MarketsmithConfig {
        &self.config
    }

    pub fn marketplace_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.marketplace_dir)
    }

    /// The flat (and reorganized) descriptor.
    pub fn marketplace_path(&self) -> PathBuf {
        self.marketplace_dir().join(&self.config.paths.marketplace_file)
    }

    pub fn normalizer(&self) -> PathNormalizer {
        PathNormalizer::new(&self.root)
    }

    pub fn assets(&self) -> FsAssetSource {
        FsAssetSource::new(&self.root, &self.config.paths)
    }

    /// Every `*.json` file in the marketplace directory, sorted.
    pub fn descriptor_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.marketplace_dir();
        if !dir.is_dir() {
            return Err(Error::missing_input("marketplace directory", vec![dir]));
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        files.sort();
        Ok(files)
    }

    /// ConfigProjector: source of truth → flat descriptor.
    ///
    /// `variables` overrides the configured candidate list.
    pub fn sync(&self, variables: Option<&Path>, opts: &RunOptions) -> Result<PassReport> {
        let source_path = match variables {
            Some(path) => {
                let path = self.resolve(path);
                if !path.is_file() {
                    return Err(Error::missing_input("source of truth (VARIABLES.yaml)", vec![path]));
                }
                path
            },
            None => locate_source_of_truth(&self.root, &self.config.paths.variables)?,
        };
        let settings = &self.config.projector;
        let source = load_source_of_truth(&source_path, &settings.marketplace_key)?;
        let descriptor = project(&source, settings, opts.now)?;
        ensure_valid(&descriptor, "flat descriptor")?;

        let mut report = PassReport::new(PassKind::Sync, &source_path, opts.dry_run);
        commit(&mut report, vec![(self.marketplace_path(), descriptor)], true, opts)?;
        Ok(report)
    }

    /// ComponentGrouper: flat descriptor → bundles, rewritten in place.
    pub fn reorganize(&self, opts: &RunOptions) -> Result<PassReport> {
        let target = self.marketplace_path();
        let source = DescriptorStore::new(target.clone()).load()?;

        let assets = self.assets();
        let normalizer = self.normalizer();
        let outcome = group(
            &source,
            &GroupContext {
                settings: &self.config.grouping,
                hooks: &self.config.hooks,
                assets: &assets,
                normalizer: &normalizer,
            },
            opts.now,
        );
        check_unresolved(&outcome.unresolved, opts)?;
        ensure_valid(&outcome.descriptor, "grouped descriptor")?;

        let mut report = PassReport::new(PassKind::Reorganize, &target, opts.dry_run);
        report.unresolved = outcome.unresolved;
        commit(&mut report, vec![(target, outcome.descriptor)], true, opts)?;
        Ok(report)
    }

    /// ComponentSplitter: flat descriptor → one file per component type.
    /// The input file is never modified.
    pub fn split(&self, opts: &RunOptions) -> Result<PassReport> {
        let input = self.marketplace_path();
        let source = DescriptorStore::new(input.clone()).load()?;

        let assets = self.assets();
        let normalizer = self.normalizer();
        let outcome = split(&source, &SplitContext {
            settings: &self.config.split,
            hooks: &self.config.hooks,
            assets: &assets,
            normalizer: &normalizer,
        });
        check_unresolved(&outcome.unresolved, opts)?;

        let dir = self.marketplace_dir();
        let mut outputs: Vec<(PathBuf, MarketplaceDescriptor)> =
            Vec::with_capacity(outcome.partitions.len());
        for partition in outcome.partitions {
            ensure_valid(&partition.descriptor, &format!("{} partition", partition.component))?;
            let path = dir.join(&partition.file);
            if path == input {
                return Err(Error::message(format!(
                    "{} partition would overwrite the input descriptor {}",
                    partition.component,
                    input.display()
                )));
            }
            if outputs.iter().any(|(taken, _)| *taken == path) {
                return Err(Error::message(format!(
                    "{} partition shares its output file {} with another partition",
                    partition.component,
                    path.display()
                )));
            }
            outputs.push((path, partition.descriptor));
        }

        let mut report = PassReport::new(PassKind::Split, &input, opts.dry_run);
        report.unresolved = outcome.unresolved;
        commit(&mut report, outputs, false, opts)?;
        Ok(report)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn ensure_valid(descriptor: &MarketplaceDescriptor, origin: &str) -> Result<()> {
    let result = check_descriptor(descriptor);
    if result.has_errors() {
        return Err(Error::malformed(format!("computed {origin}"), result.error_messages()));
    }
    Ok(())
}

fn check_unresolved(unresolved: &[UnresolvedPath], opts: &RunOptions) -> Result<()> {
    if opts.strict_paths && !unresolved.is_empty() {
        return Err(Error::UnresolvablePath {
            paths: unresolved.iter().map(ToString::to_string).collect(),
        });
    }
    Ok(())
}

/// Render every output, then back up and write each one in turn.
fn commit(
    report: &mut PassReport,
    outputs: Vec<(PathBuf, MarketplaceDescriptor)>,
    with_backup: bool,
    opts: &RunOptions,
) -> Result<()> {
    let rendered = outputs
        .iter()
        .map(|(_, d)| render(d))
        .collect::<Result<Vec<_>>>()?;

    for ((path, descriptor), text) in outputs.into_iter().zip(rendered) {
        let mut output = PassOutput {
            path: path.clone(),
            name: descriptor.name.clone(),
            plugins: descriptor.plugins.len(),
            backup: None,
            rendered: None,
        };

        if opts.dry_run {
            output.rendered = Some(text);
        } else {
            if with_backup {
                output.backup = backup(&path, opts.now)?;
            }
            DescriptorStore::new(path).save(&descriptor)?;
        }
        report.add_output(output);
    }

    for unresolved in &report.unresolved {
        warn!(plugin = %unresolved.plugin, path = %unresolved.path, "path left unresolved");
    }
    info!(
        pass = %report.pass,
        outputs = report.outputs.len(),
        plugins = report.total_plugins(),
        dry_run = report.dry_run,
        "pass complete"
    );
    Ok(())
}
