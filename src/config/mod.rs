//! Configuration: YAML schema, multi-source loader, and the built-in
//! trusted source table.

pub mod loader;
pub mod schema;

/// Built-in trusted source table, used when no override path is configured.
pub const DEFAULT_TRUSTED_SOURCES_YAML: &str = include_str!("trusted_sources.yaml");
