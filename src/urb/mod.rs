//! usbmon record decoding
//!
//! Linux usbmon captures (`LINKTYPE_USB_LINUX_MMAPPED`) prefix every packet
//! with a fixed 64-byte header. All multi-byte fields are little-endian.
//!
//! ```text
//! Offset  Size  Field
//! 0       8     URB id
//! 8       1     event type ('S' submit, 'C' complete)
//! 9       1     transfer type (0=iso, 1=int, 2=ctrl, 3=bulk)
//! 10      1     endpoint (bit 7 = direction, bits 6..0 = number)
//! 11      1     device number
//! 12      2     bus number
//! 14      1     setup flag
//! 15      1     data flag
//! 16      12    timestamp (seconds, microseconds)
//! 28      4     status
//! 32      4     URB length
//! 36      4     captured data length
//! 40      8     setup packet (control transfers)
//! 48      16    interval, start frame, transfer flags, iso descriptors
//! 64      ..    data
//! ```
//!
//! Only control and bulk transfers are decoded; other transfer types come back
//! as [`Decoded::Unsupported`] rather than an error.

mod error;
mod setup;

pub use error::{DecodeError, ErrorKind};
pub use setup::{Recipient, RequestType, SetupPacket};

use serde::Serialize;

/// Size of the fixed usbmon header; data starts here.
pub const HEADER_LEN: usize = 64;

/// Bytes needed to read the phase, transfer type and endpoint.
const CLASSIFY_LEN: usize = 11;

const OFFSET_PHASE: usize = 8;
const OFFSET_TRANSFER_TYPE: usize = 9;
const OFFSET_ENDPOINT: usize = 10;
const OFFSET_SETUP: usize = 40;

/// Which of the two capture checkpoints a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Request handed to the host controller ('S')
    Submit,
    /// Request finished ('C')
    Complete,
}

impl Phase {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'S' => Some(Self::Submit),
            b'C' => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Direction of a transfer, relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Host to device
    Out,
    /// Device to host
    In,
}

impl Direction {
    const IN_BIT: u8 = 0b1000_0000;

    pub fn from_endpoint(endpoint: u8) -> Self {
        if endpoint & Self::IN_BIT == 0 {
            Self::Out
        } else {
            Self::In
        }
    }
}

/// Transfer types this tool can replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Control,
    Bulk,
}

impl TransferKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x02 => Some(Self::Control),
            0x03 => Some(Self::Bulk),
            _ => None,
        }
    }
}

/// Transfer-type specific part of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Control(SetupPacket),
    Bulk,
}

impl Transfer {
    pub fn kind(&self) -> TransferKind {
        match self {
            Self::Control(_) => TransferKind::Control,
            Self::Bulk => TransferKind::Bulk,
        }
    }
}

/// A classified usbmon record, borrowing its data from the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrbRecord<'a> {
    /// URB id, shared by the submit and complete records of one transfer
    pub id: u64,
    pub phase: Phase,
    pub transfer: Transfer,
    pub direction: Direction,
    /// Endpoint number without the direction bit
    pub endpoint: u8,
    pub device: u8,
    pub bus: u16,
    pub status: i32,
    /// Everything after the 64-byte header
    pub data: &'a [u8],
}

/// Result of decoding one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<'a> {
    Record(UrbRecord<'a>),
    /// Interrupt, isochronous or unknown transfer type
    Unsupported { transfer_type: u8 },
}

/// Decode one raw usbmon record.
///
/// Check order: enough bytes to classify, transfer type, full header
/// present, phase byte, then (control only) the setup packet bit fields.
pub fn decode(raw: &[u8]) -> Result<Decoded<'_>, DecodeError> {
    if raw.len() < CLASSIFY_LEN {
        return Err(DecodeError::Truncated {
            needed: CLASSIFY_LEN,
            actual: raw.len(),
        });
    }

    let transfer_type = raw[OFFSET_TRANSFER_TYPE];
    let Some(kind) = TransferKind::from_byte(transfer_type) else {
        return Ok(Decoded::Unsupported { transfer_type });
    };

    if raw.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            needed: HEADER_LEN,
            actual: raw.len(),
        });
    }

    let phase_byte = raw[OFFSET_PHASE];
    let phase = Phase::from_byte(phase_byte).ok_or(DecodeError::InvalidPhase(phase_byte))?;

    let endpoint_byte = raw[OFFSET_ENDPOINT];

    let transfer = match kind {
        TransferKind::Control => {
            let mut bytes = [0u8; SetupPacket::LEN];
            bytes.copy_from_slice(&raw[OFFSET_SETUP..OFFSET_SETUP + SetupPacket::LEN]);
            Transfer::Control(SetupPacket::parse(&bytes)?)
        }
        TransferKind::Bulk => Transfer::Bulk,
    };

    Ok(Decoded::Record(UrbRecord {
        id: u64::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]),
        phase,
        transfer,
        direction: Direction::from_endpoint(endpoint_byte),
        endpoint: endpoint_byte & !Direction::IN_BIT,
        device: raw[11],
        bus: u16::from_le_bytes([raw[12], raw[13]]),
        status: i32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        data: &raw[HEADER_LEN..],
    }))
}
