use std::path::{Path, PathBuf};

use {marketsmith_common::FromMessage, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    /// A required input file is absent. Nothing has been written.
    #[error("{what} not found; looked in:{}", list_paths(.searched))]
    MissingInput {
        what: String,
        searched: Vec<PathBuf>,
    },

    /// Input present but unusable, or computed output failed schema checks.
    /// Nothing has been written.
    #[error("malformed {origin}:{}", list_items(.problems))]
    MalformedInput {
        origin: String,
        problems: Vec<String>,
    },

    /// Asset paths that could not be made project-relative (strict mode only).
    #[error("unresolvable asset paths:{}", list_items(.paths))]
    UnresolvablePath { paths: Vec<String> },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] marketsmith_config::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn missing_input(what: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        Self::MissingInput {
            what: what.into(),
            searched,
        }
    }

    #[must_use]
    pub fn malformed(origin: impl Into<String>, problems: Vec<String>) -> Self {
        Self::MalformedInput {
            origin: origin.into(),
            problems,
        }
    }

    #[must_use]
    pub fn write_failure(path: &Path, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.to_path_buf(),
            source,
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("\n  - {}", p.display()))
        .collect()
}

fn list_items(items: &[String]) -> String {
    items.iter().map(|i| format!("\n  - {i}")).collect()
}

pub type Result<T> = std::result::Result<T, Error>;

marketsmith_common::impl_context!();
