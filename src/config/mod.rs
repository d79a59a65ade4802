// src/config/mod.rs

//! Configuration loading and validation for wipeguard.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: turning a `RawConfigFile` into a checked `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_raw_or_default};
pub use model::{
    ConfigFile, DisksSection, FactoryResetJobSection, JobsSection, JournalSection,
    RawConfigFile, ServerSection, WipeJobSection,
};
