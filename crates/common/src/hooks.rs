//! Lifecycle events a plugin host dispatches to hook bindings.
//!
//! Descriptor files key their `hooks` maps by these names. The marketplace
//! crate keeps the keys as strings so that foreign descriptors still load;
//! this enum is the known vocabulary used by templates and validation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// ── HookEvent ───────────────────────────────────────────────────────────────

/// Lifecycle events that hook bindings can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Notification,
    UserPromptSubmit,
    Stop,
    SubagentStop,
    PreCompact,
    SessionStart,
    SessionEnd,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl HookEvent {
    /// All variants, for iteration.
    pub const ALL: &'static [HookEvent] = &[
        Self::PreToolUse,
        Self::PostToolUse,
        Self::Notification,
        Self::UserPromptSubmit,
        Self::Stop,
        Self::SubagentStop,
        Self::PreCompact,
        Self::SessionStart,
        Self::SessionEnd,
    ];
}

/// Returned when a string names no known [`HookEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHookEvent(pub String);

impl fmt::Display for UnknownHookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown hook event '{}'", self.0)
    }
}

impl std::error::Error for UnknownHookEvent {}

impl FromStr for HookEvent {
    type Err = UnknownHookEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.to_string() == s)
            .ok_or_else(|| UnknownHookEvent(s.to_string()))
    }
}
