//! # Config Commands
//!
//! Local only: no session, no backend, no store.

use std::path::{Path, PathBuf};

use crate::cli::ConfigCommand;
use crate::config::{AppConfig, ConfigError};
use crate::error::{CommandError, CommandResult, ErrorCode};

/// Effective configuration as TOML.
pub fn show(config: &AppConfig) -> CommandResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| CommandError::internal(format!("cannot render configuration: {}", e)))
}

/// Writes the effective configuration to `path` (or the default location).
pub fn init(config: &AppConfig, path: Option<&Path>, force: bool) -> CommandResult<PathBuf> {
    let target = path
        .map(Path::to_path_buf)
        .or_else(AppConfig::default_config_path)
        .ok_or(ConfigError::NoConfigDir)?;

    if target.exists() && !force {
        return Err(CommandError::new(
            ErrorCode::Conflict,
            format!("{} already exists (use --force to overwrite)", target.display()),
        ));
    }

    Ok(config.save(Some(&target))?)
}

pub fn run(config: &AppConfig, path: Option<&Path>, command: ConfigCommand) -> CommandResult<()> {
    match command {
        ConfigCommand::Show => print!("{}", show(config)?),
        ConfigCommand::Init { force } => {
            let written = init(config, path, force)?;
            println!("Configuration written to {}", written.display());
        }
    }
    Ok(())
}
