//! Schema checks on descriptors, for computed output and for files on disk.

use std::{collections::HashMap, path::Path, str::FromStr};

use {
    marketsmith_common::HookEvent,
    marketsmith_config::{Diagnostic, ValidationResult},
};

use crate::{
    error::Result,
    types::{HookMap, MarketplaceDescriptor, PluginDescriptor, SourceKind},
};

/// Check one descriptor.
///
/// Errors: duplicate or empty plugin names, plugins without a source, empty
/// hook binding lists, bindings without actions, command actions without a
/// command. Warnings: absolute asset paths, unknown lifecycle events.
#[must_use]
pub fn check_descriptor(descriptor: &MarketplaceDescriptor) -> ValidationResult {
    let mut diagnostics = Vec::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (i, plugin) in descriptor.plugins.iter().enumerate() {
        let at = format!("plugins[{i}]");

        if plugin.name.is_empty() {
            diagnostics.push(Diagnostic::error(
                "missing-key",
                format!("{at}.name"),
                "empty plugin name",
            ));
        } else if let Some(first) = first_seen.get(plugin.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                "duplicate",
                format!("{at}.name"),
                format!("duplicate plugin name \"{}\" (first at plugins[{first}])", plugin.name),
            ));
        } else {
            first_seen.insert(&plugin.name, i);
        }

        check_source(plugin, &at, &mut diagnostics);
        for (field, paths) in [("agents", &plugin.agents), ("commands", &plugin.commands)] {
            for (j, path) in paths.iter().flatten().enumerate() {
                check_asset_path(path, &format!("{at}.{field}[{j}]"), &mut diagnostics);
            }
        }
        if let Some(hooks) = &plugin.hooks {
            check_hooks(hooks, &format!("{at}.hooks"), &mut diagnostics);
        }
    }

    ValidationResult {
        diagnostics,
        source_path: None,
    }
}

/// Read and check a descriptor file. A file that does not parse yields a
/// single error diagnostic; only I/O failures are returned as `Err`.
pub fn validate_file(path: &Path) -> Result<ValidationResult> {
    let data = std::fs::read_to_string(path)?;
    let mut result = match serde_json::from_str::<MarketplaceDescriptor>(&data) {
        Ok(descriptor) => check_descriptor(&descriptor),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::error("type-error", "", e.to_string())],
            source_path: None,
        },
    };
    result.source_path = Some(path.to_path_buf());
    Ok(result)
}

fn check_source(plugin: &PluginDescriptor, at: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Some(source) = &plugin.source else {
        diagnostics.push(Diagnostic::error(
            "missing-key",
            format!("{at}.source"),
            "plugin has no source",
        ));
        return;
    };
    match source.kind() {
        SourceKind::Other(_) => {},
        SourceKind::Bare | SourceKind::File if source.path().is_empty() => {
            diagnostics.push(Diagnostic::error(
                "path",
                format!("{at}.source"),
                "empty source path",
            ));
        },
        SourceKind::Bare | SourceKind::File => {
            check_asset_path(source.path(), &format!("{at}.source"), diagnostics);
        },
    }
}

fn check_asset_path(path: &str, at: &str, diagnostics: &mut Vec<Diagnostic>) {
    if Path::new(path).has_root() {
        diagnostics.push(Diagnostic::warning(
            "path",
            at,
            format!("absolute path \"{path}\" will not resolve in other checkouts"),
        ));
    }
}

fn check_hooks(hooks: &HookMap, at: &str, diagnostics: &mut Vec<Diagnostic>) {
    if hooks.is_empty() {
        diagnostics.push(Diagnostic::warning("hook", at, "empty hooks map"));
    }
    for (event, bindings) in hooks.iter() {
        let at = format!("{at}.{event}");
        if HookEvent::from_str(event).is_err() {
            diagnostics.push(Diagnostic::warning(
                "hook",
                at.as_str(),
                format!("unknown lifecycle event \"{event}\""),
            ));
        }
        if bindings.is_empty() {
            diagnostics.push(Diagnostic::error("hook", at.as_str(), "empty binding list"));
        }
        for (j, binding) in bindings.iter().enumerate() {
            let at = format!("{at}[{j}]");
            if binding.hooks.is_empty() {
                diagnostics.push(Diagnostic::error(
                    "hook",
                    format!("{at}.hooks"),
                    "binding has no actions",
                ));
            }
            for (k, action) in binding.hooks.iter().enumerate() {
                let at = format!("{at}.hooks[{k}]");
                if action.kind != "command" {
                    continue;
                }
                match action.command.as_deref() {
                    None | Some("") => diagnostics.push(Diagnostic::error(
                        "hook",
                        format!("{at}.command"),
                        "command action without a command",
                    )),
                    Some(command) => {
                        check_asset_path(command, &format!("{at}.command"), diagnostics);
                    },
                }
            }
        }
    }
}
