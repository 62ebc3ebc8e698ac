use {marketsmith_config::HooksConfig, tracing::warn};

use crate::types::{HookAction, HookBinding, HookMap};

/// Build the lifecycle hook map embedded by hook bundles.
///
/// Entries sharing an event are grouped under it in first-appearance order.
/// Returns `None` for an empty template so no empty `hooks` map is emitted.
pub fn hook_map_from_template(template: &HooksConfig) -> Option<HookMap> {
    if template.bindings.is_empty() {
        warn!("hook template is empty; hook bundles will carry no hooks");
        return None;
    }

    let mut map = HookMap::new();
    for entry in &template.bindings {
        map.push(entry.event.to_string(), HookBinding {
            matcher: entry.matcher.clone(),
            hooks: vec![HookAction::command(entry.command.clone())],
        });
    }
    Some(map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        marketsmith_common::HookEvent,
        marketsmith_config::HookTemplateEntry,
        serde_json::json,
    };

    #[test]
    fn default_template_shape() {
        let map = hook_map_from_template(&HooksConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            json!({
                "SessionStart": [{
                    "matcher": "*",
                    "hooks": [{"type": "command", "command": "./config/hooks/session-start.sh"}]
                }],
                "SessionEnd": [{
                    "matcher": "*",
                    "hooks": [{"type": "command", "command": "./config/hooks/session-end.sh"}]
                }],
                "PostToolUse": [{
                    "matcher": "Bash(git commit:*)",
                    "hooks": [{"type": "command", "command": "./config/hooks/safety-check.sh"}]
                }]
            })
        );
    }

    #[test]
    fn shared_events_are_grouped() {
        let entry = |event, command: &str| HookTemplateEntry {
            event,
            matcher: "*".into(),
            command: command.into(),
        };
        let template = HooksConfig {
            bindings: vec![
                entry(HookEvent::SessionStart, "./a.sh"),
                entry(HookEvent::Stop, "./b.sh"),
                entry(HookEvent::SessionStart, "./c.sh"),
            ],
        };
        let map = hook_map_from_template(&template).unwrap();
        assert_eq!(map.events().collect::<Vec<_>>(), vec!["SessionStart", "Stop"]);
        assert_eq!(map.get("SessionStart").unwrap().len(), 2);
    }

    #[test]
    fn empty_template_yields_none() {
        assert!(hook_map_from_template(&HooksConfig { bindings: vec![] }).is_none());
    }
}
