//! Per-record classification for diagnosing captures.
//!
//! Unlike [`Converter::run`](super::Converter::run), inspection keeps going
//! past records that fail to decode and reports each failure on its row.

use std::io::Read;

use crate::capture::{CaptureError, CaptureReader, Payload};
use crate::config::CaptureConfig;
use crate::transfer::{self, TransferEvent};
use crate::urb::{self, Decoded, DecodeError, Direction, Phase, TransferKind};

/// Header fields of a decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub id: u64,
    pub phase: Phase,
    pub kind: TransferKind,
    pub direction: Direction,
    pub endpoint: u8,
    pub device: u8,
    pub bus: u16,
    pub status: i32,
}

/// What conversion would do with a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Emit(TransferEvent),
    SkipPhase,
    Unsupported { transfer_type: u8 },
    Invalid(DecodeError),
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Emit(_) => "emit",
            Action::SkipPhase => "skip",
            Action::Unsupported { .. } => "unsupported",
            Action::Invalid(_) => "error",
        }
    }
}

/// One row of an inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    /// 0-based index among USB records, as used in conversion errors
    pub index: usize,
    /// Byte offset of the block holding the record
    pub offset: u64,
    /// Record length including the usbmon header
    pub length: usize,
    /// `None` when the record is unsupported or failed to decode
    pub header: Option<RecordHeader>,
    pub action: Action,
}

impl RecordSummary {
    /// Classify one raw usbmon record.
    pub fn classify(index: usize, offset: u64, raw: &[u8]) -> Self {
        let (header, action) = match urb::decode(raw) {
            Err(e) => (None, Action::Invalid(e)),
            Ok(Decoded::Unsupported { transfer_type }) => {
                (None, Action::Unsupported { transfer_type })
            }
            Ok(Decoded::Record(record)) => {
                let header = RecordHeader {
                    id: record.id,
                    phase: record.phase,
                    kind: record.transfer.kind(),
                    direction: record.direction,
                    endpoint: record.endpoint,
                    device: record.device,
                    bus: record.bus,
                    status: record.status,
                };
                let action = match transfer::event_for(&record) {
                    Some(event) => Action::Emit(event),
                    None => Action::SkipPhase,
                };
                (Some(header), action)
            }
        };

        Self {
            index,
            offset,
            length: raw.len(),
            header,
            action,
        }
    }
}

/// Iterator over the USB records of a capture.
pub struct Inspector<R: Read> {
    blocks: CaptureReader<R>,
    skip_foreign_link_types: bool,
    records: usize,
}

impl<R: Read> Inspector<R> {
    pub fn new(input: R, config: &CaptureConfig) -> Result<Self, CaptureError> {
        Ok(Self {
            blocks: CaptureReader::new(input)?,
            skip_foreign_link_types: config.skip_foreign_link_types,
            records: 0,
        })
    }
}

impl<R: Read> Iterator for Inspector<R> {
    type Item = Result<RecordSummary, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = match self.blocks.next()? {
                Ok(block) => block,
                Err(e) => return Some(Err(e)),
            };

            let raw = match block.payload() {
                Payload::Usb(data) => data,
                Payload::Foreign { data, .. } if !self.skip_foreign_link_types => data,
                _ => continue,
            };

            let index = self.records;
            self.records += 1;
            return Some(Ok(RecordSummary::classify(index, block.offset, raw)));
        }
    }
}

/// Start inspecting a capture.
pub fn inspect<R: Read>(input: R, config: &CaptureConfig) -> Result<Inspector<R>, CaptureError> {
    Inspector::new(input, config)
}
