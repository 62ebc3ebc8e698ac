//! Canonical `./`-prefixed asset references.
//!
//! Descriptors written on one machine may carry absolute paths from that
//! checkout. [`PathNormalizer`] rewrites them relative to the project root so
//! the same descriptor resolves everywhere.

use std::path::{Component, Path, PathBuf};

/// Directory segment that marks the start of a plugin asset path.
const PLUGINS_SEGMENT: &str = "plugins";

/// Outcome of normalizing one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedPath {
    /// Already relative; returned unchanged.
    Relative(String),
    /// Absolute input rewritten to a `./` reference.
    Rewritten(String),
    /// Absolute, outside the project root and without a `plugins` segment.
    /// Carries the input unchanged.
    Unresolved(String),
}

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Relative(p) | Self::Rewritten(p) | Self::Unresolved(p) => p,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Self::Relative(p) | Self::Rewritten(p) | Self::Unresolved(p) => p,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

/// A path a pass had to leave as-is, with the plugin that referenced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPath {
    pub plugin: String,
    pub path: String,
}

impl std::fmt::Display for UnresolvedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.path, self.plugin)
    }
}

/// Rewrites asset paths relative to a project root.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    root: PathBuf,
}

impl PathNormalizer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Normalize `input`. Never fails; the worst case is
    /// [`NormalizedPath::Unresolved`] holding the input.
    ///
    /// Policy, first match wins:
    /// 1. relative input is returned unchanged;
    /// 2. an absolute path with a `plugins` segment becomes
    ///    `./plugins/<rest>` (checkouts rooted elsewhere);
    /// 3. an absolute path under the root becomes `./<relative>`;
    /// 4. anything else is unresolved.
    pub fn normalize(&self, input: &str) -> NormalizedPath {
        let path = Path::new(input);
        if !path.has_root() {
            return NormalizedPath::Relative(input.to_string());
        }

        let segments: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        if let Some(idx) = segments.iter().position(|s| *s == PLUGINS_SEGMENT) {
            return NormalizedPath::Rewritten(dot_relative(&segments[idx..]));
        }

        if let Ok(rel) = path.strip_prefix(&self.root) {
            return NormalizedPath::Rewritten(dot_relative(&relative_segments(rel)));
        }

        NormalizedPath::Unresolved(input.to_string())
    }

    /// `./`-prefixed reference for a file found on disk under the root.
    /// Paths outside the root are rendered as-is.
    pub fn reference_for(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => dot_relative(&relative_segments(rel)),
            Err(_) => path.display().to_string(),
        }
    }
}

fn relative_segments(rel: &Path) -> Vec<&str> {
    rel.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .filter_map(|c| c.as_os_str().to_str())
        .collect()
}

fn dot_relative(segments: &[&str]) -> String {
    if segments.is_empty() {
        ".".to_string()
    } else {
        format!("./{}", segments.join("/"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    fn normalizer() -> PathNormalizer {
        PathNormalizer::new("/home/user/project")
    }

    #[rstest]
    #[case::plugin_asset(
        "/home/user/project/plugins/foo-agent/agents/foo.md",
        NormalizedPath::Rewritten("./plugins/foo-agent/agents/foo.md".into())
    )]
    #[case::other_checkout(
        "/srv/ci/checkout/plugins/ceo-agent",
        NormalizedPath::Rewritten("./plugins/ceo-agent".into())
    )]
    #[case::already_relative(
        "./plugins/foo-agent",
        NormalizedPath::Relative("./plugins/foo-agent".into())
    )]
    #[case::bare_relative("plugins/foo", NormalizedPath::Relative("plugins/foo".into()))]
    #[case::under_root(
        "/home/user/project/config/hooks/session-start.sh",
        NormalizedPath::Rewritten("./config/hooks/session-start.sh".into())
    )]
    #[case::outside_root(
        "/opt/shared/agents/foo.md",
        NormalizedPath::Unresolved("/opt/shared/agents/foo.md".into())
    )]
    fn normalize(#[case] input: &str, #[case] expected: NormalizedPath) {
        assert_eq!(normalizer().normalize(input), expected);
    }

    #[test]
    fn plugins_segment_must_be_whole() {
        let out = normalizer().normalize("/opt/myplugins/x.md");
        assert!(out.is_unresolved());
        assert_eq!(out.as_str(), "/opt/myplugins/x.md");
    }

    #[test]
    fn reference_for_file_under_root() {
        let n = normalizer();
        assert_eq!(
            n.reference_for(Path::new("/home/user/project/.claude/commands/role-ceo.md")),
            "./.claude/commands/role-ceo.md"
        );
        assert_eq!(n.reference_for(Path::new("/elsewhere/x.md")), "/elsewhere/x.md");
    }
}
