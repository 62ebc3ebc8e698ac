#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use {
    chrono::{DateTime, Local, TimeZone},
    marketsmith_config::MarketsmithConfig,
    marketsmith_marketplace::{
        Error, MarketplaceDescriptor, PluginDescriptor, PluginSource, RunOptions, Workspace,
        backup::backup_path,
        split::{DEFAULT_AGENT_MEMBERS, DEFAULT_UTILITY_MEMBERS},
        store::DescriptorStore,
        validate::validate_file,
    },
};

const VARIABLES: &str = r#"
owner:
  name: Ada Lovelace
  github: ada
marketplaces:
  framework:
    name: ClaudeDevFramework
    version: "2.1.0"
    description: Multi-agent development framework
    github_repo: fda3r6sbvdgq09gse2/claude-dev-framework
    plugins:
      - name: backend-agent
        description: Backend specialist
        category: development
        type: agent
      - name: frontend-agent
        description: Frontend specialist
        category: development
        type: agent
      - name: ceo-agent
        description: Strategic direction
        category: management
        type: agent
      - name: context-management
        description: Session persistence
        category: utilities
        type: utility
      - name: release-notes
        description: Changelog drafting
        category: documentation
        type: tool
"#;

fn clock(second: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 3, 1, 12, 0, second).unwrap()
}

fn opts(second: u32) -> RunOptions {
    RunOptions {
        now: clock(second),
        ..RunOptions::default()
    }
}

struct Project {
    _tmp: tempfile::TempDir,
    workspace: Workspace,
}

impl Project {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, ".ai/VARIABLES.yaml", VARIABLES);
        for name in [
            "role-ceo.md",
            "role-backend.md",
            "supercharge-activate.md",
            "notes.md",
        ] {
            write(root, &format!(".claude/commands/{name}"), "# command\n");
        }
        for name in ["session-start.sh", "session-end.sh", "safety-check.sh"] {
            write(root, &format!("config/hooks/{name}"), "#!/bin/sh\n");
        }
        let workspace = Workspace::new(root, MarketsmithConfig::default());
        Self {
            _tmp: tmp,
            workspace,
        }
    }

    fn empty() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(tmp.path(), MarketsmithConfig::default());
        Self {
            _tmp: tmp,
            workspace,
        }
    }

    fn flat_path(&self) -> PathBuf {
        self.workspace.marketplace_path()
    }

    fn load(&self, file: &str) -> MarketplaceDescriptor {
        DescriptorStore::new(self.workspace.marketplace_dir().join(file))
            .load()
            .unwrap()
    }

    fn marketplace_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.workspace.marketplace_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

// ── sync ────────────────────────────────────────────────────────────────────

#[test]
fn sync_projects_every_plugin_once() {
    let project = Project::new();
    let report = project.workspace.sync(None, &opts(0)).unwrap();
    assert_eq!(report.total_plugins(), 5);
    assert!(report.input.ends_with(".ai/VARIABLES.yaml"));

    let flat = project.load("marketplace.json");
    for name in [
        "backend-agent",
        "frontend-agent",
        "ceo-agent",
        "context-management",
        "release-notes",
    ] {
        let matches: Vec<&PluginDescriptor> =
            flat.plugins.iter().filter(|p| p.name == name).collect();
        assert_eq!(matches.len(), 1, "{name}");
        assert_eq!(
            matches[0].source.as_ref().unwrap().path(),
            format!("./plugins/{name}")
        );
    }
    assert_eq!(
        flat.owner.repository.as_deref(),
        Some("https://github.com/ada/claude-dev-framework")
    );
}

#[test]
fn sync_is_idempotent_apart_from_timestamp() {
    let project = Project::new();
    project.workspace.sync(None, &opts(0)).unwrap();
    let first_bytes = std::fs::read(project.flat_path()).unwrap();
    let first = project.load("marketplace.json");

    let report = project.workspace.sync(None, &opts(5)).unwrap();
    let second = project.load("marketplace.json");

    assert_ne!(first.generated_at(), second.generated_at());
    assert_eq!(
        first.without_generation_timestamp(),
        second.without_generation_timestamp()
    );

    let backup = report.outputs[0].backup.clone().unwrap();
    assert_eq!(backup, backup_path(&project.flat_path(), clock(5)));
    assert_eq!(std::fs::read(backup).unwrap(), first_bytes);
}

#[test]
fn sync_without_source_of_truth_writes_nothing() {
    let project = Project::empty();
    let err = project.workspace.sync(None, &opts(0)).unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, Error::Config(_)), "{err:?}");
    assert!(message.contains("book-cataloger/.ai/VARIABLES.yaml"));
    assert!(message.contains(".ai/VARIABLES.yaml"));
    assert!(!project.workspace.marketplace_dir().exists());
}

#[test]
fn sync_with_malformed_source_writes_nothing() {
    let project = Project::empty();
    write(
        project.workspace.root(),
        ".ai/VARIABLES.yaml",
        "owner:\n  name: Ada\nmarketplaces:\n  framework:\n    name: X\n",
    );
    let err = project.workspace.sync(None, &opts(0)).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("owner.github"));
    assert!(message.contains("marketplaces.framework.github_repo"));
    assert!(!project.workspace.marketplace_dir().exists());
}

#[test]
fn sync_ignores_partial_sibling_marketplace() {
    let project = Project::empty();
    let with_sibling = format!("{VARIABLES}  project:\n    name: BookCataloger\n    plugins: []\n");
    write(project.workspace.root(), ".ai/VARIABLES.yaml", &with_sibling);

    let report = project.workspace.sync(None, &opts(0)).unwrap();
    assert_eq!(report.total_plugins(), 5);
    assert_eq!(project.load("marketplace.json").name, "ClaudeDevFramework");
}

#[test]
fn dry_run_renders_without_writing() {
    let project = Project::new();
    let dry = RunOptions {
        dry_run: true,
        ..opts(0)
    };
    let report = project.workspace.sync(None, &dry).unwrap();
    let rendered = report.outputs[0].rendered.as_deref().unwrap();
    assert!(rendered.contains("\"backend-agent\""));
    assert!(rendered.ends_with("}\n"));
    assert!(!project.flat_path().exists());
}

// ── reorganize ──────────────────────────────────────────────────────────────

#[test]
fn reorganize_backs_up_exact_previous_bytes() {
    let project = Project::new();
    project.workspace.sync(None, &opts(0)).unwrap();
    let before = std::fs::read(project.flat_path()).unwrap();

    let report = project.workspace.reorganize(&opts(30)).unwrap();

    let backup = report.outputs[0].backup.clone().unwrap();
    assert_eq!(std::fs::read(&backup).unwrap(), before);

    let grouped = project.load("marketplace.json");
    assert_eq!(grouped.name, "ClaudeDevFramework-Marketplace");
    assert_eq!(grouped.plugins.len(), 6);
    assert_eq!(grouped.metadata["structure"], "component-based");
    assert_eq!(grouped.metadata["license"], "MIT");

    let sprint = grouped.find_plugin("sprint-commands").unwrap();
    assert_eq!(sprint.commands.as_ref().unwrap(), &vec![
        "./.claude/commands/notes.md".to_string(),
        "./.claude/commands/role-backend.md".to_string(),
        "./.claude/commands/role-ceo.md".to_string(),
        "./.claude/commands/supercharge-activate.md".to_string(),
    ]);
}

#[test]
fn reorganize_requires_flat_descriptor() {
    let project = Project::new();
    let err = project.workspace.reorganize(&opts(0)).unwrap_err();
    let Error::MissingInput { searched, .. } = &err else {
        panic!("expected MissingInput, got {err:?}");
    };
    assert_eq!(searched, &vec![project.flat_path()]);
}

// ── split ───────────────────────────────────────────────────────────────────

#[test]
fn split_writes_five_partitions_and_leaves_input_alone() {
    let project = Project::new();
    project.workspace.sync(None, &opts(0)).unwrap();
    let before = std::fs::read(project.flat_path()).unwrap();

    let report = project.workspace.split(&opts(10)).unwrap();
    assert_eq!(report.outputs.len(), 5);
    assert_eq!(report.backups().count(), 0);
    assert_eq!(std::fs::read(project.flat_path()).unwrap(), before);

    assert_eq!(project.marketplace_entries(), vec![
        "agents-marketplace.json",
        "commands-marketplace.json",
        "hooks-marketplace.json",
        "marketplace.json",
        "mcp-marketplace.json",
        "utilities-marketplace.json",
    ]);
}

#[test]
fn split_groups_commands_by_prefix() {
    let project = Project::new();
    project.workspace.sync(None, &opts(0)).unwrap();
    project.workspace.split(&opts(10)).unwrap();

    let commands = project.load("commands-marketplace.json");
    let groups: Vec<(&str, usize)> = commands
        .plugins
        .iter()
        .map(|p| (p.name.as_str(), p.commands.as_ref().unwrap().len()))
        .collect();
    assert_eq!(groups, vec![
        ("misc-commands", 1),
        ("role-commands", 2),
        ("supercharge-commands", 1),
    ]);
    assert_eq!(commands.metadata["component_type"], "commands");
}

#[test]
fn split_partitions_are_complete_and_disjoint() {
    let project = Project::new();
    project.workspace.sync(None, &opts(0)).unwrap();
    project.workspace.split(&opts(10)).unwrap();

    let flat = project.load("marketplace.json");
    let listed: HashSet<&str> = DEFAULT_AGENT_MEMBERS
        .iter()
        .chain(DEFAULT_UTILITY_MEMBERS)
        .copied()
        .collect();
    let expected: HashSet<String> = flat
        .plugin_names()
        .filter(|n| listed.contains(n))
        .map(String::from)
        .collect();

    let mut seen: Vec<String> = Vec::new();
    for file in [
        "agents-marketplace.json",
        "utilities-marketplace.json",
        "mcp-marketplace.json",
    ] {
        seen.extend(project.load(file).plugin_names().map(String::from));
    }
    let unique: HashSet<String> = seen.iter().cloned().collect();
    assert_eq!(unique.len(), seen.len(), "plugin in two partitions: {seen:?}");
    assert_eq!(unique, expected);
    assert!(!unique.contains("release-notes"));

    let hooks = project.load("hooks-marketplace.json");
    assert_eq!(hooks.plugin_names().collect::<Vec<_>>(), vec!["framework-hooks"]);
}

#[test]
fn split_strict_paths_fails_before_writing() {
    let project = Project::new();
    let mut agent = PluginDescriptor::new(
        "backend-agent",
        PluginSource::file("/opt/elsewhere/backend-agent"),
    );
    agent.description = "Backend specialist".into();
    let flat = MarketplaceDescriptor {
        name: "ClaudeDevFramework".into(),
        version: "2.1.0".into(),
        plugins: vec![agent],
        ..MarketplaceDescriptor::default()
    };
    DescriptorStore::new(project.flat_path()).save(&flat).unwrap();

    let strict = RunOptions {
        strict_paths: true,
        ..opts(0)
    };
    let err = project.workspace.split(&strict).unwrap_err();
    assert!(matches!(err, Error::UnresolvablePath { .. }), "{err:?}");
    assert_eq!(project.marketplace_entries(), vec!["marketplace.json"]);

    let report = project.workspace.split(&opts(0)).unwrap();
    assert_eq!(report.unresolved.len(), 1);
    let agents = project.load("agents-marketplace.json");
    assert_eq!(
        agents.plugins[0].source.as_ref().unwrap().path(),
        "/opt/elsewhere/backend-agent"
    );
}

// ── validation ──────────────────────────────────────────────────────────────

#[test]
fn every_emitted_descriptor_is_schema_valid() {
    let project = Project::new();
    project.workspace.sync(None, &opts(0)).unwrap();
    project.workspace.split(&opts(1)).unwrap();
    project.workspace.reorganize(&opts(2)).unwrap();

    let files = project.workspace.descriptor_files().unwrap();
    assert_eq!(files.len(), 6);
    for file in files {
        let result = validate_file(&file).unwrap();
        assert!(!result.has_errors(), "{}: {:?}", file.display(), result.diagnostics);
    }
}

#[test]
fn duplicate_plugin_in_source_is_rejected_before_write() {
    let project = Project::empty();
    let duplicated = VARIABLES.replace("name: frontend-agent", "name: backend-agent");
    write(project.workspace.root(), ".ai/VARIABLES.yaml", &duplicated);

    let err = project.workspace.sync(None, &opts(0)).unwrap_err();
    let Error::MalformedInput { problems, .. } = &err else {
        panic!("expected MalformedInput, got {err:?}");
    };
    assert!(problems[0].contains("duplicate plugin name \"backend-agent\""));
    assert!(!project.workspace.marketplace_dir().exists());
}
