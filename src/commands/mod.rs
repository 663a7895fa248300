//! Subcommand handlers

pub mod completions;
pub mod config;
pub mod convert;
pub mod inspect;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};

use usbreplay::Config;

/// Load the config from `--config`, or the default location.
///
/// An explicit path must exist; the default location may be missing.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Config::load_from(path)
        }
        None => Config::load(),
    }
}

/// Open a capture for reading; `-` means stdin.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let file =
        File::open(path).with_context(|| format!("Failed to open capture: {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
