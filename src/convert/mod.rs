//! Capture-to-script conversion pipeline
//!
//! One pass over the capture, block by block:
//!
//! 1. [`CaptureReader`] yields blocks in file order
//! 2. [`Block::payload`] keeps only usbmon records
//! 3. [`transfer::reconstruct`] decodes the record and applies the phase filter
//! 4. a [`Renderer`] writes the event before the next block is read
//!
//! The first capture or decode error stops the run; anything already
//! rendered stays written.

mod inspect;
mod stats;

pub use inspect::{inspect, Action, Inspector, RecordHeader, RecordSummary};
pub use stats::ConversionStats;

use std::io::{self, Read, Write};

use tracing::{debug, info, warn};

use crate::capture::{Block, CaptureError, CaptureReader, Payload};
use crate::config::{Config, OutputConfig};
use crate::render::{self, OutputFormat, Renderer};
use crate::transfer::{self, Outcome};
use crate::urb::DecodeError;

/// Errors that stop a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Record #{index} (block at offset {offset}): {kind}: {source}", kind = .source.kind())]
    Record {
        /// 0-based index among the capture's USB records
        index: usize,
        /// Byte offset of the block holding the record
        offset: u64,
        source: DecodeError,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] io::Error),
}

/// Converts captures to replay scripts using one output configuration.
#[derive(Debug, Clone)]
pub struct Converter {
    format: OutputFormat,
    output: OutputConfig,
    skip_foreign_link_types: bool,
}

impl Converter {
    pub fn new(config: &Config) -> Self {
        Self {
            format: config.output.format,
            output: config.output.clone(),
            skip_foreign_link_types: config.capture.skip_foreign_link_types,
        }
    }

    /// Override the configured output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Convert a whole capture, writing the rendered calls to `out`.
    ///
    /// `out` is flushed whether or not the conversion succeeds.
    pub fn run<R: Read, W: Write>(
        &self,
        input: R,
        out: &mut W,
    ) -> Result<ConversionStats, ConvertError> {
        let mut renderer = render::renderer(self.format, &self.output);
        let result = self.run_with(input, out, renderer.as_mut());
        out.flush()?;
        result
    }

    fn run_with<R: Read, W: Write>(
        &self,
        input: R,
        out: &mut W,
        renderer: &mut dyn Renderer,
    ) -> Result<ConversionStats, ConvertError> {
        let blocks = CaptureReader::new(input)?;
        debug!("reading {:?} capture", blocks.format());

        let mut stats = ConversionStats::default();
        renderer.preamble(out)?;

        for block in blocks {
            let block = block?;
            stats.blocks += 1;

            let Some(raw) = self.usb_record(&block, &mut stats) else {
                continue;
            };

            let index = stats.records;
            stats.records += 1;

            let outcome = transfer::reconstruct(raw).map_err(|source| ConvertError::Record {
                index,
                offset: block.offset,
                source,
            })?;

            match outcome {
                Outcome::Emit(event) => {
                    stats.record_event(&event);
                    renderer.event(&event, out)?;
                }
                Outcome::SkipPhase => stats.skipped_phase += 1,
                Outcome::Unsupported { transfer_type } => {
                    debug!(
                        "record #{} has unsupported transfer type {:#04x}",
                        index, transfer_type
                    );
                    stats.unsupported += 1;
                }
            }
        }

        renderer.postamble(out)?;
        info!("{}", stats.summary());

        Ok(stats)
    }

    fn usb_record<'a>(&self, block: &'a Block, stats: &mut ConversionStats) -> Option<&'a [u8]> {
        match block.payload() {
            Payload::Usb(data) => Some(data),
            Payload::Foreign { link_type, data } => {
                if self.skip_foreign_link_types {
                    warn!(
                        "skipping packet at offset {} with non-usbmon link type {}",
                        block.offset, link_type
                    );
                    stats.foreign += 1;
                    None
                } else {
                    Some(data)
                }
            }
            Payload::NotApplicable => None,
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
