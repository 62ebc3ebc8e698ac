//! Marketplace transformation pipeline.
//!
//! A marketplace descriptor (`.claude-plugin/marketplace.json`) tells a plugin
//! host which installable units exist and where their assets live. The
//! passes in this crate derive every descriptor from the authored source of
//! truth or from each other:
//!
//! - [`project`]: source of truth → flat descriptor, one plugin per unit
//! - [`group`]: flat descriptor → component-based bundles
//! - [`split`]: flat descriptor → one descriptor per component type
//!
//! [`pipeline`] wires each pass to the filesystem with the
//! read → compute → backup → write discipline.

pub mod backup;
pub mod discover;
pub mod error;
pub mod group;
pub mod hooks;
pub mod path;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod split;
pub mod store;
pub mod types;
pub mod validate;

pub use {
    error::{Error, Result},
    pipeline::{RunOptions, Workspace},
    types::{
        HookAction, HookBinding, HookMap, MarketplaceDescriptor, Owner, PluginDescriptor,
        PluginSource, SourceKind,
    },
};
