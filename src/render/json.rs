//! JSON Lines output.

use std::io::{self, Write};

use crate::transfer::TransferEvent;

use super::Renderer;

/// Writes each event as one compact JSON object per line.
#[derive(Debug, Clone, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for JsonRenderer {
    fn event(&mut self, event: &TransferEvent, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *out, event)?;
        out.write_all(b"\n")
    }
}
