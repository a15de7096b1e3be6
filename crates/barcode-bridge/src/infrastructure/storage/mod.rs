//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module locates, reads, validates and writes the bridge's
//! TOML configuration file, and supplies defaults when no file exists yet.

pub mod config;
