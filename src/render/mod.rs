//! Rendering of transfer events
//!
//! A [`Renderer`] turns [`TransferEvent`]s into output text, one event at a
//! time, so the converter can stream without holding the capture in memory.
//!
//! - [`JsRenderer`] writes a WebUSB promise chain
//! - [`JsonRenderer`] writes one JSON object per event (JSON Lines)

mod js;
mod json;

pub use js::{byte_array, JsRenderer};
pub use json::JsonRenderer;

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::config::OutputConfig;
use crate::transfer::TransferEvent;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// WebUSB JavaScript promise chain
    #[default]
    Js,
    /// JSON Lines, one transfer per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Js => write!(f, "js"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Renderer trait for output formats
pub trait Renderer {
    /// Text written before the first event.
    fn preamble(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    /// Render a single event.
    fn event(&mut self, event: &TransferEvent, out: &mut dyn Write) -> io::Result<()>;

    /// Text written after the last event.
    fn postamble(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

/// Create a renderer for the given format
pub fn renderer(format: OutputFormat, config: &OutputConfig) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Js => Box::new(JsRenderer::new(config)),
        OutputFormat::Json => Box::new(JsonRenderer::new()),
    }
}

/// Render a full sequence of events into a string.
pub fn render_to_string(
    renderer: &mut dyn Renderer,
    events: &[TransferEvent],
) -> io::Result<String> {
    let mut buffer = Vec::new();
    renderer.preamble(&mut buffer)?;
    for event in events {
        renderer.event(event, &mut buffer)?;
    }
    renderer.postamble(&mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
