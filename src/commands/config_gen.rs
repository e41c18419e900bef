use std::path::{Path, PathBuf};
use tracing::debug;

use super::CommandError;
use crate::config::{Config, ConfigError};

/// Write the configuration file, adding defaults for any missing settings,
/// and return the path written.
pub fn run(config_path: Option<&Path>) -> Result<PathBuf, CommandError> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path().ok_or(ConfigError::MissingOption("--config"))?,
    };

    let config = if path.exists() {
        Config::load_from(&path)?
    } else {
        debug!(path = %path.display(), "no existing config, starting from defaults");
        Config::default()
    };
    config.write_to(&path)?;

    // re-read to make sure what we wrote parses
    Config::load_from(&path)?;
    println!("wrote {:?}", path.display().to_string());
    Ok(path)
}
