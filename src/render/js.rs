//! WebUSB promise chain output.

use std::io::{self, Write};

use crate::config::OutputConfig;
use crate::transfer::{ControlRequest, TransferEvent};

use super::Renderer;

/// Format bytes as a JavaScript array literal: `[0xAA, 0xBB]`.
pub fn byte_array(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 6);
    s.push('[');
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        s.push_str(&format!("0x{:02X}", b));
    }
    s.push(']');
    s
}

/// Renders each event as a `.then(...)` link of a WebUSB promise chain.
///
/// Inbound calls get a second link that hands the result to the configured
/// log continuation.
#[derive(Debug, Clone)]
pub struct JsRenderer {
    device: String,
    indent: String,
    log_response: String,
    preamble: Option<String>,
    postamble: Option<String>,
}

impl JsRenderer {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            device: config.device.clone(),
            indent: config.indent.clone(),
            log_response: config.log_response.clone(),
            preamble: config.preamble.clone(),
            postamble: config.postamble.clone(),
        }
    }

    /// The call text for one event, including the trailing log link for
    /// inbound transfers. Always ends with a newline.
    pub fn call(&self, event: &TransferEvent) -> String {
        let mut s = match event {
            TransferEvent::ControlTransferOut { setup, data, .. } => format!(
                ".then(() => {}.controlTransferOut({}, Uint8Array.from({})))\n",
                self.device,
                self.control_params(setup),
                byte_array(data)
            ),
            TransferEvent::ControlTransferIn { setup, length, .. } => format!(
                ".then(() => {}.controlTransferIn({}, {}))\n",
                self.device,
                self.control_params(setup),
                length
            ),
            TransferEvent::TransferOut { endpoint, data } => format!(
                ".then(() => {}.transferOut(0x{:02X}, Uint8Array.from({})))\n",
                self.device,
                endpoint,
                byte_array(data)
            ),
            TransferEvent::TransferIn { endpoint, length } => format!(
                ".then(() => {}.transferIn(0x{:02X}, {}))\n",
                self.device, endpoint, length
            ),
        };

        if matches!(
            event,
            TransferEvent::ControlTransferIn { .. } | TransferEvent::TransferIn { .. }
        ) {
            s.push_str(&format!(".then({})\n", self.log_response));
        }

        s
    }

    fn control_params(&self, setup: &ControlRequest) -> String {
        let i = &self.indent;
        format!(
            "{{\n{i}requestType: '{}',\n{i}recipient: '{}',\n{i}request: 0x{:02X},\n{i}value: 0x{:04X},\n{i}index: 0x{:04X}}}",
            setup.request_type.as_str(),
            setup.recipient.as_str(),
            setup.request,
            setup.value,
            setup.index,
        )
    }
}

fn write_block(out: &mut dyn Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

impl Renderer for JsRenderer {
    fn preamble(&mut self, out: &mut dyn Write) -> io::Result<()> {
        match &self.preamble {
            Some(text) => write_block(out, text),
            None => Ok(()),
        }
    }

    fn event(&mut self, event: &TransferEvent, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(self.call(event).as_bytes())
    }

    fn postamble(&mut self, out: &mut dyn Write) -> io::Result<()> {
        match &self.postamble {
            Some(text) => write_block(out, text),
            None => Ok(()),
        }
    }
}
