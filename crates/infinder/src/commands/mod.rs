//! CLI command implementations

pub mod config;
pub mod fetch;
pub mod version;

use anyhow::{Context, Result};
use camino::Utf8Path;
use infinder_core::{HierarchicalConfigLoader, RuntimeConfig};

/// Load the runtime config, from `--config` when given
pub(crate) fn load_runtime_config(path: Option<&Utf8Path>) -> Result<RuntimeConfig> {
    let loader = HierarchicalConfigLoader::new().context("Failed to create config loader")?;
    let config = match path {
        Some(path) => loader.load_runtime_config_from(path)?,
        None => loader.load_runtime_config()?,
    };
    Ok(config)
}
