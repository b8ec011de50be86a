//! `convergectl config`

use std::path::Path;

use anyhow::Result;
use converge_core::ConvergenceConfig;

use crate::cli::ConfigCommands;

pub fn run(
    command: &ConfigCommands,
    config: &ConvergenceConfig,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Path => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => ConvergenceConfig::config_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
