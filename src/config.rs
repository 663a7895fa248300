//! Configuration management for usbreplay

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::render::OutputFormat;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// How generated calls are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format when `--format` is not given
    #[serde(default)]
    pub format: OutputFormat,
    /// JavaScript variable holding the `USBDevice`
    #[serde(default = "default_device")]
    pub device: String,
    /// Indentation for control transfer parameter objects
    #[serde(default = "default_indent")]
    pub indent: String,
    /// Continuation attached to every inbound call
    #[serde(default = "default_log_response")]
    pub log_response: String,
    /// Text written before the first call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    /// Text written after the last call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postamble: Option<String>,
}

/// How the capture file is read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Ignore packets from interfaces that aren't usbmon
    #[serde(default = "default_true")]
    pub skip_foreign_link_types: bool,
}

fn default_device() -> String {
    "device".to_string()
}

fn default_indent() -> String {
    "    ".to_string()
}

fn default_log_response() -> String {
    "resp => console.log(resp)".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            device: default_device(),
            indent: default_indent(),
            log_response: default_log_response(),
            preamble: None,
            postamble: None,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            skip_foreign_link_types: true,
        }
    }
}

impl Config {
    /// Default config file path: `<config dir>/usbreplay/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("usbreplay").join("config.toml"))
    }

    /// Load the config from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the config from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse a config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
