use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
};

pub use serde_json::{Map, Value};

/// Metadata key holding the generation timestamp of a descriptor.
pub const GENERATED_AT_KEY: &str = "reorganized";

// ── Marketplace descriptor ───────────────────────────────────────────────────

/// Top-level descriptor file (`marketplace.json` and its derived siblings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceDescriptor {
    pub name: String,
    pub version: String,
    pub owner: Owner,
    #[serde(default)]
    pub description: String,
    /// Display order is meaningful; names are unique within one descriptor.
    #[serde(default)]
    pub plugins: Vec<PluginDescriptor>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl MarketplaceDescriptor {
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.name.as_str())
    }

    pub fn find_plugin(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.name == name)
    }

    /// Names that occur more than once, each reported once, in order of
    /// their first repeat.
    pub fn duplicate_plugin_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dups: Vec<String> = Vec::new();
        for name in self.plugin_names() {
            if !seen.insert(name) && !dups.iter().any(|d| d == name) {
                dups.push(name.to_string());
            }
        }
        dups
    }

    pub fn generated_at(&self) -> Option<&str> {
        self.metadata.get(GENERATED_AT_KEY).and_then(Value::as_str)
    }

    /// Copy with the generation timestamp removed, for run-to-run comparison.
    #[must_use]
    pub fn without_generation_timestamp(&self) -> Self {
        let mut copy = self.clone();
        copy.metadata.remove(GENERATED_AT_KEY);
        copy
    }
}

/// Merge `overrides` into a copy of `base`. Existing keys keep their
/// position and take the new value; new keys are appended.
pub fn merge_metadata<'a>(
    base: &Map<String, Value>,
    overrides: impl IntoIterator<Item = (&'a str, Value)>,
) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.to_string(), value);
    }
    merged
}

/// Marketplace owner. Unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    /// Handle on the hosting platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(rename = "_note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Plugin descriptor ────────────────────────────────────────────────────────

/// One installable unit or bundle.
///
/// Any subset of the component fields may be present; a plugin with none of
/// them is an asset-only bundle. Keys not modelled here (e.g. `mcpServers`)
/// are kept in `extra` so passes that copy plugins never drop data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PluginSource>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HookMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, source: PluginSource) -> Self {
        Self {
            name: name.into(),
            source: Some(source),
            ..Self::default()
        }
    }

    /// Whether the plugin carries any of `agents`, `commands` or `hooks`.
    pub fn has_components(&self) -> bool {
        self.agents.is_some() || self.commands.is_some() || self.hooks.is_some()
    }
}

// ── Plugin source ────────────────────────────────────────────────────────────

/// How a plugin's `source` was written on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Legacy bare string: `"source": "./plugins/x"`.
    Bare,
    /// Structured: `"source": {"source": "file", "path": "./plugins/x"}`.
    File,
    /// Structured with another kind (e.g. `github`); carried through as-is.
    Other(String),
}

/// Canonical in-memory plugin source.
///
/// Both on-disk shapes load into this one type so every pass reads
/// [`path`](Self::path) uniformly; serialization writes back the shape the
/// value was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSource", into = "RawSource")]
pub struct PluginSource {
    kind: SourceKind,
    path: String,
    extra: Map<String, Value>,
}

impl PluginSource {
    /// Structured `{source: "file", path}` reference.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::File,
            path: path.into(),
            extra: Map::new(),
        }
    }

    /// Legacy bare-string reference.
    pub fn bare(path: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Bare,
            path: path.into(),
            extra: Map::new(),
        }
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self.kind, SourceKind::Bare)
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }
}

#[derive(Serialize, Deserialize)]
struct StructuredSource {
    source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    path: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSource {
    Bare(String),
    Structured(StructuredSource),
}

impl From<RawSource> for PluginSource {
    fn from(raw: RawSource) -> Self {
        match raw {
            RawSource::Bare(path) => Self::bare(path),
            RawSource::Structured(s) => Self {
                kind: if s.source == "file" {
                    SourceKind::File
                } else {
                    SourceKind::Other(s.source)
                },
                path: s.path,
                extra: s.extra,
            },
        }
    }
}

impl From<PluginSource> for RawSource {
    fn from(source: PluginSource) -> Self {
        let kind = match source.kind {
            SourceKind::Bare => return Self::Bare(source.path),
            SourceKind::File => "file".to_string(),
            SourceKind::Other(kind) => kind,
        };
        Self::Structured(StructuredSource {
            source: kind,
            path: source.path,
            extra: source.extra,
        })
    }
}

// ── Hooks ────────────────────────────────────────────────────────────────────

/// One action run when a binding fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HookAction {
    /// `{"type": "command", "command": <path>}`.
    pub fn command(path: impl Into<String>) -> Self {
        Self {
            kind: "command".into(),
            command: Some(path.into()),
            extra: Map::new(),
        }
    }
}

/// A matcher plus the actions it triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookBinding {
    #[serde(default)]
    pub matcher: String,
    pub hooks: Vec<HookAction>,
}

/// Lifecycle event name → bindings, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookMap {
    entries: Vec<(String, Vec<HookBinding>)>,
}

impl HookMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding under `event`, creating the event entry if needed.
    pub fn push(&mut self, event: impl Into<String>, binding: HookBinding) {
        let event = event.into();
        match self.entries.iter_mut().find(|(e, _)| *e == event) {
            Some((_, bindings)) => bindings.push(binding),
            None => self.entries.push((event, vec![binding])),
        }
    }

    /// Replace the bindings of `event`, keeping its position if present.
    pub fn insert(&mut self, event: impl Into<String>, bindings: Vec<HookBinding>) {
        let event = event.into();
        match self.entries.iter_mut().find(|(e, _)| *e == event) {
            Some((_, existing)) => *existing = bindings,
            None => self.entries.push((event, bindings)),
        }
    }

    pub fn get(&self, event: &str) -> Option<&[HookBinding]> {
        self.entries
            .iter()
            .find(|(e, _)| e == event)
            .map(|(_, b)| b.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HookBinding])> {
        self.entries.iter().map(|(e, b)| (e.as_str(), b.as_slice()))
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(e, _)| e.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for HookMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(e, b)| (e, b)))
    }
}

impl<'de> Deserialize<'de> for HookMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HookMapVisitor;

        impl<'de> Visitor<'de> for HookMapVisitor {
            type Value = HookMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from lifecycle event to hook bindings")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<HookMap, A::Error> {
                let mut map = HookMap::new();
                while let Some((event, bindings)) =
                    access.next_entry::<String, Vec<HookBinding>>()?
                {
                    map.insert(event, bindings);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(HookMapVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn source_accepts_both_shapes() {
        let bare: PluginSource = serde_json::from_value(json!("./plugins/ceo-agent")).unwrap();
        assert_eq!(bare.kind(), &SourceKind::Bare);
        assert_eq!(bare.path(), "./plugins/ceo-agent");

        let structured: PluginSource =
            serde_json::from_value(json!({"source": "file", "path": "./plugins/ceo-agent"}))
                .unwrap();
        assert_eq!(structured.kind(), &SourceKind::File);
        assert_eq!(structured.path(), bare.path());
    }

    #[test]
    fn source_writes_back_its_shape() {
        assert_eq!(
            serde_json::to_value(PluginSource::bare("./plugins/a")).unwrap(),
            json!("./plugins/a")
        );
        assert_eq!(
            serde_json::to_value(PluginSource::file("./plugins/a")).unwrap(),
            json!({"source": "file", "path": "./plugins/a"})
        );
    }

    #[test]
    fn foreign_source_kind_is_carried_through() {
        let raw = json!({"source": "github", "repo": "ada/tools"});
        let source: PluginSource = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(source.kind(), &SourceKind::Other("github".into()));
        assert!(source.path().is_empty());
        assert_eq!(serde_json::to_value(&source).unwrap(), raw);
    }

    #[test]
    fn hook_map_keeps_event_order() {
        let raw = json!({
            "SessionStart": [{"matcher": "*", "hooks": [{"type": "command", "command": "./a.sh"}]}],
            "PostToolUse": [{"matcher": "Bash", "hooks": [{"type": "command", "command": "./b.sh"}]}],
            "SessionEnd": [{"matcher": "*", "hooks": [{"type": "command", "command": "./c.sh"}]}]
        });
        let map: HookMap = serde_json::from_value(raw).unwrap();
        assert_eq!(map.events().collect::<Vec<_>>(), vec![
            "SessionStart",
            "PostToolUse",
            "SessionEnd"
        ]);
        let text = serde_json::to_string(&map).unwrap();
        let start = text.find("SessionStart").unwrap();
        let post = text.find("PostToolUse").unwrap();
        let end = text.find("SessionEnd").unwrap();
        assert!(start < post && post < end);
    }

    #[test]
    fn hook_map_push_groups_by_event() {
        let mut map = HookMap::new();
        let binding = |cmd: &str| HookBinding {
            matcher: "*".into(),
            hooks: vec![HookAction::command(cmd)],
        };
        map.push("SessionStart", binding("./a.sh"));
        map.push("SessionEnd", binding("./b.sh"));
        map.push("SessionStart", binding("./c.sh"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("SessionStart").unwrap().len(), 2);
    }

    #[test]
    fn plugin_keeps_unknown_keys_and_field_order() {
        let raw = json!({
            "name": "integration-kit",
            "source": "./plugins/integration-kit",
            "description": "Tools",
            "mcpServers": {"github": {"command": "gh-mcp"}},
            "keywords": ["integration"]
        });
        let plugin: PluginDescriptor = serde_json::from_value(raw).unwrap();
        assert!(plugin.extra.contains_key("mcpServers"));
        assert!(!plugin.has_components());

        let text = serde_json::to_string(&plugin).unwrap();
        assert!(text.starts_with(r#"{"name":"integration-kit","source":"./plugins/integration-kit""#));
        assert!(text.contains("mcpServers"));
    }

    #[test]
    fn duplicate_names_reported_once() {
        let mut desc = MarketplaceDescriptor::default();
        for name in ["a", "b", "a", "a", "b"] {
            desc.plugins
                .push(PluginDescriptor::new(name, PluginSource::bare("./x")));
        }
        assert_eq!(desc.duplicate_plugin_names(), vec!["a", "b"]);
    }

    #[test]
    fn merge_metadata_overwrites_in_place() {
        let base: Map<String, Value> = serde_json::from_value(json!({
            "homepage": "h",
            "reorganized": "old",
            "license": "MIT"
        }))
        .unwrap();
        let merged = merge_metadata(&base, [
            (GENERATED_AT_KEY, json!("new")),
            ("structure", json!("component-based")),
        ]);
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["homepage", "reorganized", "license", "structure"]);
        assert_eq!(merged[GENERATED_AT_KEY], json!("new"));
    }
}
