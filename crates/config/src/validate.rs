//! Required-key validation for the source of truth, plus the diagnostic
//! types shared with descriptor validation.
//!
//! The raw document is checked before typed deserialization so that every
//! missing or mistyped key is reported at once, by dotted path.

use std::path::PathBuf;

use serde_json::Value;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "missing-key", "type-error", "duplicate", "path", "hook"
    pub category: &'static str,
    /// Dotted path, e.g. "marketplaces.framework.plugins[2].type"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn error(category: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            path: path.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "`{}`: {}", self.path, self.message)
        }
    }
}

/// Result of validating one document.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub source_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Error diagnostics rendered as one line each.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(ToString::to_string)
            .collect()
    }
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Closest present key to a missing one, for "did you mean" hints.
fn suggest<'a>(needle: &str, candidates: impl Iterator<Item = &'a String>) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= 2 && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((candidate.as_str(), d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Source-of-truth checks ──────────────────────────────────────────────────

const OWNER_KEYS: &[&str] = &["name", "github"];
const MARKETPLACE_KEYS: &[&str] = &["name", "version", "description", "github_repo", "plugins"];
const PLUGIN_KEYS: &[&str] = &["name", "description", "category", "type"];

/// Check that the raw source-of-truth document carries every required key.
///
/// `marketplace_key` selects the record under `marketplaces` to check.
#[must_use]
pub fn check_source_of_truth(doc: &Value, marketplace_key: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let Some(root) = doc.as_object() else {
        diagnostics.push(Diagnostic::error(
            "type-error",
            "",
            "document root must be a mapping",
        ));
        return ValidationResult {
            diagnostics,
            source_path: None,
        };
    };

    if let Some(owner) = require_object(root, "owner", "", &mut diagnostics) {
        require_strings(owner, OWNER_KEYS, "owner", &mut diagnostics);
    }

    let marketplaces = require_object(root, "marketplaces", "", &mut diagnostics);
    let record = marketplaces
        .and_then(|m| require_object(m, marketplace_key, "marketplaces", &mut diagnostics));

    if let Some(record) = record {
        let prefix = format!("marketplaces.{marketplace_key}");
        require_strings(
            record,
            &MARKETPLACE_KEYS[..MARKETPLACE_KEYS.len() - 1],
            &prefix,
            &mut diagnostics,
        );
        match record.get("plugins") {
            None => missing(record, "plugins", &prefix, &mut diagnostics),
            Some(Value::Array(plugins)) => {
                for (i, plugin) in plugins.iter().enumerate() {
                    let path = format!("{prefix}.plugins[{i}]");
                    match plugin.as_object() {
                        Some(obj) => require_strings(obj, PLUGIN_KEYS, &path, &mut diagnostics),
                        None => diagnostics.push(Diagnostic::error(
                            "type-error",
                            path,
                            "expected a mapping",
                        )),
                    }
                }
            },
            Some(_) => diagnostics.push(Diagnostic::error(
                "type-error",
                format!("{prefix}.plugins"),
                "expected a sequence",
            )),
        }
    }

    ValidationResult {
        diagnostics,
        source_path: None,
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn missing(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let message = match suggest(key, obj.keys()) {
        Some(s) => format!("missing required key (found \"{s}\", did you mean \"{key}\"?)"),
        None => "missing required key".to_string(),
    };
    diagnostics.push(Diagnostic::error("missing-key", join(prefix, key), message));
}

fn require_object<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &str,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<&'a serde_json::Map<String, Value>> {
    match obj.get(key) {
        None => {
            missing(obj, key, prefix, diagnostics);
            None
        },
        Some(Value::Object(inner)) => Some(inner),
        Some(_) => {
            diagnostics.push(Diagnostic::error(
                "type-error",
                join(prefix, key),
                "expected a mapping",
            ));
            None
        },
    }
}

fn require_strings(
    obj: &serde_json::Map<String, Value>,
    keys: &[&str],
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for key in keys {
        match obj.get(*key) {
            None | Some(Value::Null) => missing(obj, key, prefix, diagnostics),
            Some(Value::String(_)) => {},
            Some(other) => diagnostics.push(Diagnostic::error(
                "type-error",
                join(prefix, key),
                format!("expected a string, found {other} (quote the value)"),
            )),
        }
    }
}
