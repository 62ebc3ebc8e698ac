use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input file exists in none of the searched locations.
    #[error("{what} not found; looked in:{}", list_paths(.searched))]
    MissingInput {
        what: String,
        searched: Vec<PathBuf>,
    },

    /// The file exists but lacks required keys or has the wrong shape.
    #[error("malformed {}:{}", .path.display(), list_problems(.problems))]
    MalformedInput {
        path: PathBuf,
        problems: Vec<String>,
    },

    #[error("unsupported file format: .{extension} ({})", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
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
    pub fn malformed(path: &Path, problems: Vec<String>) -> Self {
        Self::MalformedInput {
            path: path.to_path_buf(),
            problems,
        }
    }

    #[must_use]
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("\n  - {}", p.display()))
        .collect()
}

fn list_problems(problems: &[String]) -> String {
    problems.iter().map(|p| format!("\n  - {p}")).collect()
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_names_every_location() {
        let err = Error::missing_input(
            "VARIABLES.yaml",
            vec![
                PathBuf::from("/a/.ai/VARIABLES.yaml"),
                PathBuf::from("/b/.ai/VARIABLES.yaml"),
            ],
        );
        assert_eq!(
            err.to_string(),
            "VARIABLES.yaml not found; looked in:\n  - /a/.ai/VARIABLES.yaml\n  - /b/.ai/VARIABLES.yaml"
        );
    }

    #[test]
    fn malformed_lists_problems() {
        let err = Error::malformed(Path::new("v.yaml"), vec![
            "missing key `owner.github`".into(),
            "missing key `marketplaces.framework.version`".into(),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("malformed v.yaml:"));
        assert!(text.contains("owner.github"));
        assert!(text.contains("marketplaces.framework.version"));
    }
}
