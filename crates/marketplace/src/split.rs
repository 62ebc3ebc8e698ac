//! ComponentSplitter: partition a flat descriptor by component type.
//!
//! Agents and utilities are selected from the flat plugin list by name.
//! Commands and hooks ignore the flat list and are synthesized from
//! discovered files. The integration-server partition is reserved and
//! always empty.

use std::collections::{BTreeMap, HashSet};

use {
    marketsmith_config::{HooksConfig, PartitionConfig, SplitConfig},
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::{
    discover::{AssetFile, AssetSource},
    hooks::hook_map_from_template,
    path::{PathNormalizer, UnresolvedPath},
    types::{MarketplaceDescriptor, PluginDescriptor, PluginSource, merge_metadata},
};

/// Plugins claimed by the agents partition unless `[split.agents]` overrides.
pub const DEFAULT_AGENT_MEMBERS: &[&str] = &[
    "backend-agent",
    "frontend-agent",
    "integration-agent",
    "testing-agent",
    "ceo-agent",
    "documentation-agent",
    "devops-agent",
    "qa-automation-agent",
    "ux-product-agent",
];

/// Plugins claimed by the utilities partition unless `[split.utilities]` overrides.
pub const DEFAULT_UTILITY_MEMBERS: &[&str] = &["context-management"];

/// Group key for command files without a usable prefix.
pub const MISC_GROUP: &str = "misc";

/// Axis along which the splitter partitions plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Agents,
    Commands,
    Hooks,
    McpServers,
    Utilities,
}

impl ComponentType {
    /// Partitions in output order.
    pub const ALL: [Self; 5] = [
        Self::Agents,
        Self::Commands,
        Self::Hooks,
        Self::McpServers,
        Self::Utilities,
    ];

    /// Value written to `metadata.component_type`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Commands => "commands",
            Self::Hooks => "hooks",
            Self::McpServers => "mcpServers",
            Self::Utilities => "utilities",
        }
    }

    fn default_name(self) -> &'static str {
        match self {
            Self::Agents => "ClaudeDevFramework-Agents",
            Self::Commands => "ClaudeDevFramework-Commands",
            Self::Hooks => "ClaudeDevFramework-Hooks",
            Self::McpServers => "ClaudeDevFramework-MCP",
            Self::Utilities => "ClaudeDevFramework-Utilities",
        }
    }

    fn default_description(self) -> &'static str {
        match self {
            Self::Agents => "Specialized AI agent workers for parallel software development",
            Self::Commands => "Sprint management and workflow automation slash commands",
            Self::Hooks => "Automated validation, testing, and workflow hooks",
            Self::McpServers => "Model Context Protocol servers for external tool integration",
            Self::Utilities => "Development utilities and helper plugins for enhanced productivity",
        }
    }

    fn default_category(self) -> &'static str {
        match self {
            Self::Agents => "development",
            Self::Commands => "productivity",
            Self::Hooks => "automation",
            Self::McpServers => "integration",
            Self::Utilities => "utilities",
        }
    }

    fn default_file(self) -> &'static str {
        match self {
            Self::Agents => "agents-marketplace.json",
            Self::Commands => "commands-marketplace.json",
            Self::Hooks => "hooks-marketplace.json",
            Self::McpServers => "mcp-marketplace.json",
            Self::Utilities => "utilities-marketplace.json",
        }
    }

    fn overrides(self, settings: &SplitConfig) -> &PartitionConfig {
        match self {
            Self::Agents => &settings.agents,
            Self::Commands => &settings.commands,
            Self::Hooks => &settings.hooks,
            Self::McpServers => &settings.mcp,
            Self::Utilities => &settings.utilities,
        }
    }

    /// Output file name, honoring `[split.<partition>].file`.
    pub fn file_name(self, settings: &SplitConfig) -> String {
        self.overrides(settings)
            .file
            .clone()
            .unwrap_or_else(|| self.default_file().to_string())
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One output descriptor of the split.
#[derive(Debug, Clone)]
pub struct Partition {
    pub component: ComponentType,
    /// File name inside the marketplace directory.
    pub file: String,
    pub descriptor: MarketplaceDescriptor,
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// Always one per [`ComponentType`], in [`ComponentType::ALL`] order.
    pub partitions: Vec<Partition>,
    pub unresolved: Vec<UnresolvedPath>,
}

impl SplitOutcome {
    pub fn partition(&self, component: ComponentType) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.component == component)
    }
}

pub struct SplitContext<'a> {
    pub settings: &'a SplitConfig,
    pub hooks: &'a HooksConfig,
    pub assets: &'a dyn AssetSource,
    pub normalizer: &'a PathNormalizer,
}

pub fn split(source: &MarketplaceDescriptor, ctx: &SplitContext<'_>) -> SplitOutcome {
    let mut unresolved = Vec::new();
    let mut claimed: HashSet<String> = HashSet::new();

    let partitions = ComponentType::ALL
        .into_iter()
        .map(|component| {
            let plugins = match component {
                ComponentType::Agents | ComponentType::Utilities => select_members(
                    source,
                    component,
                    ctx,
                    &mut claimed,
                    &mut unresolved,
                ),
                ComponentType::Commands => command_plugins(source, ctx),
                ComponentType::Hooks => hook_plugins(source, ctx),
                ComponentType::McpServers => Vec::new(),
            };
            debug!(%component, plugins = plugins.len(), "partition computed");
            Partition {
                component,
                file: component.file_name(ctx.settings),
                descriptor: shell(source, component, ctx.settings, plugins),
            }
        })
        .collect();

    SplitOutcome {
        partitions,
        unresolved,
    }
}

/// Group key of a command file: the text before the first hyphen, or
/// [`MISC_GROUP`] when there is no hyphen or nothing precedes it.
pub fn command_group(stem: &str) -> &str {
    match stem.split_once('-') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => MISC_GROUP,
    }
}

/// Upper-case the first letter of every word and lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

fn shell(
    source: &MarketplaceDescriptor,
    component: ComponentType,
    settings: &SplitConfig,
    plugins: Vec<PluginDescriptor>,
) -> MarketplaceDescriptor {
    let overrides = component.overrides(settings);
    let category = overrides
        .category
        .clone()
        .unwrap_or_else(|| component.default_category().to_string());

    MarketplaceDescriptor {
        name: overrides
            .name
            .clone()
            .unwrap_or_else(|| component.default_name().to_string()),
        version: source.version.clone(),
        owner: source.owner.clone(),
        description: overrides
            .description
            .clone()
            .unwrap_or_else(|| component.default_description().to_string()),
        plugins,
        metadata: merge_metadata(&source.metadata, [
            ("component_type", Value::from(component.tag())),
            ("category", Value::from(category)),
        ]),
    }
}

fn select_members(
    source: &MarketplaceDescriptor,
    component: ComponentType,
    ctx: &SplitContext<'_>,
    claimed: &mut HashSet<String>,
    unresolved: &mut Vec<UnresolvedPath>,
) -> Vec<PluginDescriptor> {
    let defaults = match component {
        ComponentType::Agents => DEFAULT_AGENT_MEMBERS,
        _ => DEFAULT_UTILITY_MEMBERS,
    };
    let members: Vec<String> = match &component.overrides(ctx.settings).members {
        Some(names) => names.clone(),
        None => defaults.iter().map(|n| (*n).to_string()).collect(),
    };

    let mut selected = Vec::new();
    for plugin in &source.plugins {
        if !members.contains(&plugin.name) {
            continue;
        }
        if !claimed.insert(plugin.name.clone()) {
            warn!(
                plugin = %plugin.name,
                partition = %component,
                "plugin already claimed by an earlier partition, skipping"
            );
            continue;
        }

        let mut plugin = plugin.clone();
        if let Some(src) = plugin.source.as_mut().filter(|s| s.is_structured()) {
            let normalized = ctx.normalizer.normalize(src.path());
            if normalized.is_unresolved() {
                warn!(plugin = %plugin.name, path = %src.path(), "unresolvable source path");
                unresolved.push(UnresolvedPath {
                    plugin: plugin.name.clone(),
                    path: src.path().to_string(),
                });
            }
            src.set_path(normalized.into_string());
        }
        selected.push(plugin);
    }
    selected
}

fn command_plugins(source: &MarketplaceDescriptor, ctx: &SplitContext<'_>) -> Vec<PluginDescriptor> {
    let mut groups: BTreeMap<String, Vec<AssetFile>> = BTreeMap::new();
    for file in ctx.assets.commands() {
        groups
            .entry(command_group(&file.stem).to_string())
            .or_default()
            .push(file);
    }

    groups
        .into_iter()
        .map(|(group, files)| {
            let name = format!("{group}-commands");
            PluginDescriptor {
                description: format!("{} workflow commands", title_case(&group)),
                version: Some(source.version.clone()),
                category: Some(ctx.settings.commands_category.clone()),
                commands: Some(files.into_iter().map(|f| f.reference).collect()),
                ..PluginDescriptor::new(&name, PluginSource::file(format!("./plugins/{name}")))
            }
        })
        .collect()
}

fn hook_plugins(source: &MarketplaceDescriptor, ctx: &SplitContext<'_>) -> Vec<PluginDescriptor> {
    if ctx.assets.hook_scripts().is_empty() {
        debug!("no hook scripts discovered, hooks partition left empty");
        return Vec::new();
    }
    let Some(hooks) = hook_map_from_template(ctx.hooks) else {
        return Vec::new();
    };

    let synthesized = &ctx.settings.hooks_plugin;
    vec![PluginDescriptor {
        description: synthesized.description.clone(),
        version: Some(source.version.clone()),
        category: Some(synthesized.category.clone()),
        hooks: Some(hooks),
        ..PluginDescriptor::new(
            &synthesized.name,
            PluginSource::file(format!("./plugins/{}", synthesized.name)),
        )
    }]
}
