//! ComponentGrouper: regroup a flat descriptor into component-based bundles.
//!
//! Bundle membership comes from the `[grouping]` table rather than from the
//! flat plugin list. Command bundles prefer live discovery and fall back to
//! the table's list only when discovery finds nothing; hook bundles embed
//! the `[hooks]` lifecycle template.

use {
    chrono::{DateTime, Local},
    marketsmith_config::{BundleConfig, BundleMembers, GroupingConfig, HooksConfig},
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::{
    discover::AssetSource,
    hooks::hook_map_from_template,
    path::{PathNormalizer, UnresolvedPath},
    project::format_timestamp,
    types::{
        GENERATED_AT_KEY, MarketplaceDescriptor, PluginDescriptor, PluginSource, merge_metadata,
    },
};

/// Inputs of one grouping run besides the flat descriptor.
pub struct GroupContext<'a> {
    pub settings: &'a GroupingConfig,
    pub hooks: &'a HooksConfig,
    pub assets: &'a dyn AssetSource,
    pub normalizer: &'a PathNormalizer,
}

/// Result of [`group`].
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub descriptor: MarketplaceDescriptor,
    /// Bundle member paths left unchanged by normalization.
    pub unresolved: Vec<UnresolvedPath>,
}

pub fn group(
    source: &MarketplaceDescriptor,
    ctx: &GroupContext<'_>,
    now: DateTime<Local>,
) -> GroupOutcome {
    let mut unresolved = Vec::new();

    let discovered_commands: Vec<String> = ctx
        .assets
        .commands()
        .into_iter()
        .map(|a| a.reference)
        .collect();
    let hook_map = hook_map_from_template(ctx.hooks);
    check_hook_scripts(ctx);

    let plugins = ctx
        .settings
        .bundles
        .iter()
        .map(|bundle| {
            let mut plugin = bundle_shell(bundle);
            match &bundle.members {
                BundleMembers::None => {},
                BundleMembers::Agents(paths) => {
                    warn_missing_members(source, bundle, paths);
                    plugin.agents = Some(normalize_all(
                        &bundle.name,
                        paths,
                        ctx.normalizer,
                        &mut unresolved,
                    ));
                },
                BundleMembers::Commands(fallback) => {
                    let commands = if discovered_commands.is_empty() {
                        debug!(bundle = %bundle.name, "no commands discovered, using fallback list");
                        normalize_all(&bundle.name, fallback, ctx.normalizer, &mut unresolved)
                    } else {
                        discovered_commands.clone()
                    };
                    plugin.commands = Some(commands);
                },
                BundleMembers::Hooks => plugin.hooks = hook_map.clone(),
            }
            plugin
        })
        .collect::<Vec<_>>();

    let metadata = merge_metadata(&source.metadata, [
        (GENERATED_AT_KEY, Value::from(format_timestamp(now))),
        ("structure", Value::from(ctx.settings.structure.clone())),
        ("note", Value::from(ctx.settings.note.clone())),
    ]);

    debug!(
        source_plugins = source.plugins.len(),
        bundles = plugins.len(),
        "grouped descriptor"
    );

    GroupOutcome {
        descriptor: MarketplaceDescriptor {
            name: ctx.settings.name.clone(),
            version: source.version.clone(),
            owner: source.owner.clone(),
            description: ctx.settings.description.clone(),
            plugins,
            metadata,
        },
        unresolved,
    }
}

fn bundle_shell(bundle: &BundleConfig) -> PluginDescriptor {
    PluginDescriptor {
        description: bundle.description.clone(),
        version: Some(bundle.version.clone()),
        category: Some(bundle.category.clone()),
        keywords: bundle.keywords.clone(),
        strict: Some(bundle.strict),
        ..PluginDescriptor::new(&bundle.name, PluginSource::bare(&bundle.source))
    }
}

fn normalize_all(
    plugin: &str,
    paths: &[String],
    normalizer: &PathNormalizer,
    unresolved: &mut Vec<UnresolvedPath>,
) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            let normalized = normalizer.normalize(p);
            if normalized.is_unresolved() {
                warn!(plugin, path = %p, "bundle member path outside project root");
                unresolved.push(UnresolvedPath {
                    plugin: plugin.to_string(),
                    path: p.clone(),
                });
            }
            normalized.into_string()
        })
        .collect()
}

/// Agent paths of the form `./plugins/<name>/...` should name a plugin of the
/// flat descriptor. A miss is reported but does not stop the pass.
fn warn_missing_members(source: &MarketplaceDescriptor, bundle: &BundleConfig, paths: &[String]) {
    if source.plugins.is_empty() {
        return;
    }
    for path in paths {
        let Some(owner) = path
            .trim_start_matches("./")
            .strip_prefix("plugins/")
            .and_then(|rest| rest.split('/').next())
        else {
            continue;
        };
        if source.find_plugin(owner).is_none() {
            warn!(
                bundle = %bundle.name,
                plugin = owner,
                "bundle member not present in source descriptor"
            );
        }
    }
}

/// Template commands should point at scripts that exist when any were found.
fn check_hook_scripts(ctx: &GroupContext<'_>) {
    let scripts = ctx.assets.hook_scripts();
    if scripts.is_empty() {
        return;
    }
    for entry in &ctx.hooks.bindings {
        if !scripts.iter().any(|s| s.reference == entry.command) {
            warn!(
                event = %entry.event,
                command = %entry.command,
                "hook template command not found among discovered scripts"
            );
        }
    }
}
