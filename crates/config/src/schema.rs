/// Config schema types: pipeline settings and the source-of-truth record.
///
/// Every settings field has a default reproducing the framework's stock
/// layout, so an absent `marketsmith.toml` yields a working pipeline.
use std::{collections::BTreeMap, path::PathBuf};

use {
    marketsmith_common::HookEvent,
    serde::{Deserialize, Serialize},
};

// ── Pipeline settings ───────────────────────────────────────────────────────

/// Root pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketsmithConfig {
    pub paths: PathsConfig,
    pub projector: ProjectorConfig,
    pub grouping: GroupingConfig,
    pub hooks: HooksConfig,
    pub split: SplitConfig,
}

/// Filesystem layout, relative to the project root unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding every generated descriptor.
    pub marketplace_dir: PathBuf,
    /// File name of the flat (and reorganized) descriptor.
    pub marketplace_file: String,
    /// Directory scanned for command-definition files.
    pub commands_dir: PathBuf,
    /// Directory scanned for hook scripts.
    pub hooks_dir: PathBuf,
    pub command_extension: String,
    pub hook_extension: String,
    /// Source-of-truth candidates, tried in order.
    pub variables: Vec<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            marketplace_dir: PathBuf::from(".claude-plugin"),
            marketplace_file: "marketplace.json".into(),
            commands_dir: PathBuf::from(".claude/commands"),
            hooks_dir: PathBuf::from("config/hooks"),
            command_extension: "md".into(),
            hook_extension: "sh".into(),
            variables: vec![
                PathBuf::from("../book-cataloger/.ai/VARIABLES.yaml"),
                PathBuf::from(".ai/VARIABLES.yaml"),
            ],
        }
    }
}

/// Settings for projecting the source of truth into a flat descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Key under `marketplaces` holding the record to project.
    pub marketplace_key: String,
    /// Hosting platform base URL; the owner handle is appended to it.
    pub platform_base_url: String,
    /// Token in `github_repo` replaced by `<platform_base_url>/<handle>/`.
    pub repo_placeholder: String,
    /// Repository name used for the homepage and documentation links.
    pub homepage_repo: String,
    pub license: String,
    /// Marketplace-level keywords written to `metadata.keywords`.
    pub keywords: Vec<String>,
    pub owner_note: Option<String>,
    pub structure: String,
    pub note: String,
    pub generated_from: String,
    /// Value of each plugin's `strict` flag.
    pub strict: bool,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            marketplace_key: "framework".into(),
            platform_base_url: "https://github.com".into(),
            repo_placeholder: "fda3r6sbvdgq09gse2/".into(),
            homepage_repo: "claude-dev-framework".into(),
            license: "MIT".into(),
            keywords: [
                "multi-agent",
                "ai-development",
                "claude-code",
                "parallel-development",
                "git-worktrees",
                "specialized-agents",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            owner_note: Some(
                "⚠️ Change owner.name in VARIABLES.yaml - single source of truth".into(),
            ),
            structure: "individual-plugins".into(),
            note: "Each agent plugin is independently loadable with its own configuration".into(),
            generated_from: "VARIABLES.yaml - DO NOT EDIT marketplace.json DIRECTLY".into(),
            strict: false,
        }
    }
}

/// Which component field a bundle aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleMembers {
    /// Asset-only bundle with no component fields.
    #[default]
    None,
    /// Fixed agent definition paths.
    Agents(Vec<String>),
    /// Fallback command paths, used only when discovery finds nothing.
    Commands(Vec<String>),
    /// The `[hooks]` lifecycle template.
    Hooks,
}

/// One row of the bundle table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    pub name: String,
    pub source: String,
    pub description: String,
    pub version: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub members: BundleMembers,
    #[serde(default)]
    pub strict: bool,
}

/// Settings for regrouping a flat descriptor into bundles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub name: String,
    pub description: String,
    pub structure: String,
    pub note: String,
    pub bundles: Vec<BundleConfig>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            name: "ClaudeDevFramework-Marketplace".into(),
            description: "Organized multi-agent development framework with component-based plugin architecture".into(),
            structure: "component-based".into(),
            note: "Plugins organized by function with native Claude Code component types".into(),
            bundles: default_bundles(),
        }
    }
}

fn bundle(
    name: &str,
    source: &str,
    description: &str,
    version: &str,
    category: &str,
    keywords: &[&str],
    members: BundleMembers,
) -> BundleConfig {
    BundleConfig {
        name: name.into(),
        source: source.into(),
        description: description.into(),
        version: version.into(),
        category: category.into(),
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        members,
        strict: false,
    }
}

fn paths(items: &[&str]) -> Vec<String> {
    items.iter().map(|p| (*p).to_string()).collect()
}

fn default_bundles() -> Vec<BundleConfig> {
    vec![
        bundle(
            "development-agents",
            "./plugins/development-agents",
            "Core development agents for backend, frontend, and integration work",
            "2.0.0",
            "development",
            &["backend", "frontend", "integration", "testing", "development"],
            BundleMembers::Agents(paths(&[
                "./plugins/backend-agent/agents/backend.md",
                "./plugins/frontend-agent/agents/frontend.md",
                "./plugins/integration-agent/agents/integration.md",
                "./plugins/testing-agent/agents/testing.md",
            ])),
        ),
        bundle(
            "management-agents",
            "./plugins/management-agents",
            "Strategic and operational management agents including CEO and DevOps",
            "2.0.0",
            "management",
            &["management", "strategy", "devops", "documentation"],
            BundleMembers::Agents(paths(&[
                "./plugins/ceo-agent/agents/ceo.md",
                "./plugins/documentation-agent/agents/documentation.md",
                "./plugins/devops-agent/agents/devops.md",
            ])),
        ),
        bundle(
            "quality-agents",
            "./plugins/quality-agents",
            "Quality assurance and user experience agents",
            "2.0.0",
            "quality",
            &["qa", "testing", "ux", "product", "quality"],
            BundleMembers::Agents(paths(&[
                "./plugins/qa-automation-agent/agents/qa-automation.md",
                "./plugins/ux-product-agent/agents/ux-product.md",
            ])),
        ),
        bundle(
            "sprint-commands",
            "./plugins/sprint-commands",
            "Sprint management and workflow automation commands",
            "2.0.0",
            "productivity",
            &["sprint", "workflow", "automation", "commands"],
            BundleMembers::Commands(paths(&[
                "./.claude/commands/role-ceo.md",
                "./.claude/commands/role-backend.md",
                "./.claude/commands/role-frontend.md",
                "./.claude/commands/role-testing.md",
                "./.claude/commands/supercharge-activate.md",
            ])),
        ),
        bundle(
            "workflow-hooks",
            "./plugins/workflow-hooks",
            "Automated validation, testing, and safety hooks",
            "2.0.0",
            "automation",
            &["hooks", "automation", "validation", "safety"],
            BundleMembers::Hooks,
        ),
        bundle(
            "context-utilities",
            "./plugins/context-management-plugin",
            "Context persistence and session management for graceful shutdown and easy resume",
            "1.0.0",
            "utilities",
            &["context", "session", "resume", "persistence", "recovery"],
            BundleMembers::None,
        ),
    ]
}

/// One binding in the lifecycle template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookTemplateEntry {
    pub event: HookEvent,
    pub matcher: String,
    pub command: String,
}

/// Fixed lifecycle bindings embedded by hook bundles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub bindings: Vec<HookTemplateEntry>,
}

impl Default for HooksConfig {
    fn default() -> Self {
        let entry = |event, matcher: &str, command: &str| HookTemplateEntry {
            event,
            matcher: matcher.into(),
            command: command.into(),
        };
        Self {
            bindings: vec![
                entry(HookEvent::SessionStart, "*", "./config/hooks/session-start.sh"),
                entry(HookEvent::SessionEnd, "*", "./config/hooks/session-end.sh"),
                entry(
                    HookEvent::PostToolUse,
                    "Bash(git commit:*)",
                    "./config/hooks/safety-check.sh",
                ),
            ],
        }
    }
}

/// Overrides for one split partition. Unset fields fall back to the
/// partition's built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub file: Option<String>,
    /// Plugin names claimed by the partition (agents and utilities only).
    pub members: Option<Vec<String>>,
}

/// Name and text of a plugin the splitter synthesizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedPluginConfig {
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Settings for splitting a flat descriptor by component type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub agents: PartitionConfig,
    pub commands: PartitionConfig,
    pub hooks: PartitionConfig,
    pub mcp: PartitionConfig,
    pub utilities: PartitionConfig,
    /// Category of each synthesized `<group>-commands` plugin.
    pub commands_category: String,
    pub hooks_plugin: SynthesizedPluginConfig,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            agents: PartitionConfig::default(),
            commands: PartitionConfig::default(),
            hooks: PartitionConfig::default(),
            mcp: PartitionConfig::default(),
            utilities: PartitionConfig::default(),
            commands_category: "productivity".into(),
            hooks_plugin: SynthesizedPluginConfig {
                name: "framework-hooks".into(),
                description: "Automated validation, testing, and workflow hooks".into(),
                category: "automation".into(),
            },
        }
    }
}

// ── Source of truth ─────────────────────────────────────────────────────────

/// The authored `VARIABLES.yaml` record. Keys outside this shape are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOfTruth {
    pub owner: OwnerRecord,
    /// As loaded, only the record selected by `projector.marketplace_key`.
    pub marketplaces: BTreeMap<String, MarketplaceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub name: String,
    /// Handle on the hosting platform.
    pub github: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceRecord {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Repository URL template containing the placeholder token.
    pub github_repo: String,
    pub plugins: Vec<PluginRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
}
