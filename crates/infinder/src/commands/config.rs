//! Config command

use anyhow::{Context, Result};
use camino::Utf8Path;
use infinder_core::HierarchicalConfigLoader;

use crate::cli::{ConfigCommands, ConfigShowArgs};

pub fn run(cmd: ConfigCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, config_path),
        ConfigCommands::Path => path(config_path),
    }
}

fn show(args: ConfigShowArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_runtime_config(config_path)?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&config)?
    } else {
        serde_yaml_ng::to_string(&config).context("Failed to render config as YAML")?
    };
    println!("{}", rendered.trim_end());

    Ok(())
}

fn path(config_path: Option<&Utf8Path>) -> Result<()> {
    match config_path {
        Some(path) => println!("{}", path),
        None => {
            let loader = HierarchicalConfigLoader::new()?;
            println!("{}", loader.config_file());
        }
    }
    Ok(())
}
