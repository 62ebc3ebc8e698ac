//! Shared error plumbing and lifecycle types used across all marketsmith crates.

pub mod error;
pub mod hooks;

pub use {error::FromMessage, hooks::HookEvent};
