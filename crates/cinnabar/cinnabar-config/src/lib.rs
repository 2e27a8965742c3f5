//! `cinnabar-config`: TOML configuration for the transient search.

pub mod config;

pub use config::{AlgorithmParams, ConfigError, SearchConfig};
