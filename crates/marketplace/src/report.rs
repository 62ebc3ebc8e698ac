//! Pass reports: what a run read, wrote, backed up, and could not resolve.

use std::path::{Path, PathBuf};

use crate::path::UnresolvedPath;

/// The transformation a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Sync,
    Reorganize,
    Split,
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Reorganize => write!(f, "reorganize"),
            Self::Split => write!(f, "split"),
        }
    }
}

/// One descriptor produced by a pass.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub path: PathBuf,
    /// Descriptor `name`.
    pub name: String,
    pub plugins: usize,
    /// Backup taken before the file was replaced.
    pub backup: Option<PathBuf>,
    /// Persisted form; kept only on dry runs, where nothing is written.
    pub rendered: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass: PassKind,
    pub dry_run: bool,
    /// File the pass read its input from.
    pub input: PathBuf,
    pub outputs: Vec<PassOutput>,
    pub unresolved: Vec<UnresolvedPath>,
}

impl PassReport {
    pub fn new(pass: PassKind, input: &Path, dry_run: bool) -> Self {
        Self {
            pass,
            dry_run,
            input: input.to_path_buf(),
            outputs: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn add_output(&mut self, output: PassOutput) {
        self.outputs.push(output);
    }

    /// Plugins across every output descriptor.
    pub fn total_plugins(&self) -> usize {
        self.outputs.iter().map(|o| o.plugins).sum()
    }

    pub fn backups(&self) -> impl Iterator<Item = &Path> {
        self.outputs.iter().filter_map(|o| o.backup.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn output(name: &str, plugins: usize, backup: Option<&str>) -> PassOutput {
        PassOutput {
            path: PathBuf::from(format!("{name}.json")),
            name: name.into(),
            plugins,
            backup: backup.map(PathBuf::from),
            rendered: None,
        }
    }

    #[test]
    fn totals_and_backups() {
        let mut report = PassReport::new(PassKind::Split, Path::new("marketplace.json"), false);
        report.add_output(output("agents", 9, None));
        report.add_output(output("commands", 3, Some("commands.json.backup.20260301_120000")));
        assert_eq!(report.total_plugins(), 12);
        assert_eq!(report.backups().count(), 1);
        assert_eq!(report.pass.to_string(), "split");
    }
}
