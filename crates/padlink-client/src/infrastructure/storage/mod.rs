//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration, supplies defaults on
//! first run, and writes changed preferences (such as the input mode) back to
//! disk.

pub mod config;
