use std::path::Path;

use acdps::Config;
use anyhow::{Context, Result};

/// Defaults, or the given file merged over them.
pub fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_json_file(path),
        None => Ok(Config::default()),
    }
}

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ConfigArgs) -> Result<()> {
    let config = load(args.config.as_deref())?;
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?;
    println!("{json}");
    Ok(())
}
