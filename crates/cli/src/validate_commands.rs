//! `marketsmith validate`: schema checks over descriptor files.

use std::path::PathBuf;

use {
    anyhow::{Result, bail},
    marketsmith_config::{Severity, ValidationResult},
    marketsmith_marketplace::{Workspace, validate::validate_file},
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn label(severity: Severity) -> (&'static str, &'static str) {
    match severity {
        Severity::Error => ("fail", RED),
        Severity::Warning => ("warn", YELLOW),
    }
}

pub fn handle_validate(workspace: &Workspace, files: Vec<PathBuf>) -> Result<()> {
    let files = if files.is_empty() {
        workspace.descriptor_files()?
    } else {
        files
    };
    if files.is_empty() {
        eprintln!(
            "No descriptor files found in {}",
            workspace.marketplace_dir().display()
        );
        return Ok(());
    }

    let mut errors = 0usize;
    let mut warnings = 0usize;
    for file in &files {
        let result = validate_file(file)?;
        print_result(&result);
        errors += result.count(Severity::Error);
        warnings += result.count(Severity::Warning);
    }

    eprintln!(
        "{BOLD}Summary:{RESET} {} file(s), {errors} error(s), {warnings} warning(s)",
        files.len()
    );
    if errors > 0 {
        bail!("{errors} validation error(s)");
    }
    Ok(())
}

fn print_result(result: &ValidationResult) {
    let name = result
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    eprintln!("{BOLD}{name}{RESET}");

    if result.diagnostics.is_empty() {
        eprintln!("  [{GREEN}ok{RESET}]  no problems");
    }
    for diagnostic in &result.diagnostics {
        let (label, color) = label(diagnostic.severity);
        eprintln!("  [{color}{label}{RESET}]  {diagnostic}");
    }
    eprintln!();
}
