//! Configuration management
//!
//! Process configuration for the node: node id, derived listen address,
//! and the optional mining address supplied by the CLI.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
