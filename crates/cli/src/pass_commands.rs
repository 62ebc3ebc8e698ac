//! `sync`, `reorganize` and `split`: run one pass and print its report.

use std::path::Path;

use {
    anyhow::Result,
    marketsmith_marketplace::{RunOptions, Workspace, report::PassReport},
};

pub fn handle_sync(workspace: &Workspace, variables: Option<&Path>, dry_run: bool) -> Result<()> {
    let opts = RunOptions {
        dry_run,
        ..RunOptions::default()
    };
    let report = workspace.sync(variables, &opts)?;
    print_report(&report);
    if !report.dry_run {
        eprintln!("Edit the source of truth and re-run `marketsmith sync` to change this descriptor.");
    }
    Ok(())
}

pub fn handle_reorganize(workspace: &Workspace, dry_run: bool) -> Result<()> {
    let opts = RunOptions {
        dry_run,
        ..RunOptions::default()
    };
    let report = workspace.reorganize(&opts)?;
    print_report(&report);
    Ok(())
}

pub fn handle_split(workspace: &Workspace, dry_run: bool, strict_paths: bool) -> Result<()> {
    let opts = RunOptions {
        dry_run,
        strict_paths,
        ..RunOptions::default()
    };
    let report = workspace.split(&opts)?;
    print_report(&report);
    if !report.dry_run {
        eprintln!("The input descriptor {} was left unchanged.", report.input.display());
    }
    Ok(())
}

/// Descriptors go to stdout on dry runs; everything else goes to stderr.
fn print_report(report: &PassReport) {
    eprintln!("marketsmith {}: read {}", report.pass, report.input.display());

    for output in &report.outputs {
        if let Some(rendered) = &output.rendered {
            eprintln!(
                "  would write {} ({} plugins)",
                output.path.display(),
                output.plugins
            );
            print!("{rendered}");
            continue;
        }
        if let Some(backup) = &output.backup {
            eprintln!("  backed up → {}", backup.display());
        }
        eprintln!(
            "  ✓ {} ({} plugins) → {}",
            output.name,
            output.plugins,
            output.path.display()
        );
    }

    for unresolved in &report.unresolved {
        eprintln!("  ! left unresolved: {unresolved}");
    }

    if report.dry_run {
        eprintln!("Dry run: nothing was backed up or written.");
    } else {
        eprintln!(
            "{} descriptor(s), {} plugin(s) written.",
            report.outputs.len(),
            report.total_plugins()
        );
    }
}
