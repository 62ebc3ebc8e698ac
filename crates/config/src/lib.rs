//! Configuration for the marketplace pipeline.
//!
//! Two inputs are loaded here:
//! - pipeline settings: `marketsmith.toml`, `marketsmith.yaml` or
//!   `marketsmith.json`, searched in the project root then
//!   `~/.config/marketsmith/`; every key has a default.
//! - the source of truth: the authored `VARIABLES.yaml` record from which
//!   the flat marketplace descriptor is projected.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        config_dir, discover_and_load, find_config_file, load_config, load_source_of_truth,
        locate_source_of_truth,
    },
    schema::{
        BundleConfig, BundleMembers, GroupingConfig, HookTemplateEntry, HooksConfig,
        MarketplaceRecord, MarketsmithConfig, OwnerRecord, PartitionConfig, PathsConfig,
        PluginRecord, ProjectorConfig, SourceOfTruth, SplitConfig, SynthesizedPluginConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
