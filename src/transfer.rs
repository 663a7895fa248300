//! Transfer reconstruction
//!
//! Every logical transfer shows up twice in a usbmon capture: once when it is
//! submitted and once when it completes. Only one of the two carries what a
//! replay needs, and which one depends on direction alone:
//!
//! - OUT: the bytes to send are known at submission; the completion is dropped.
//! - IN: the received length is only known at completion; the submission is dropped.
//!
//! No submit/complete pairing by URB id is needed.

use serde::Serialize;

use crate::urb::{self, Decoded, DecodeError, Direction, Phase, Transfer, UrbRecord};
use crate::urb::{Recipient, RequestType, SetupPacket};

/// Parameters of a control transfer, shaped like WebUSB's
/// `USBControlTransferParameters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequest {
    pub request_type: RequestType,
    pub recipient: Recipient,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

impl From<&SetupPacket> for ControlRequest {
    fn from(setup: &SetupPacket) -> Self {
        Self {
            request_type: setup.request_type,
            recipient: setup.recipient,
            request: setup.request,
            value: setup.value,
            index: setup.index,
        }
    }
}

/// One reconstructed transfer, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum TransferEvent {
    #[serde(rename_all = "camelCase")]
    ControlTransferOut {
        endpoint: u8,
        setup: ControlRequest,
        data: Vec<u8>,
    },
    #[serde(rename_all = "camelCase")]
    ControlTransferIn {
        endpoint: u8,
        setup: ControlRequest,
        length: u16,
    },
    #[serde(rename_all = "camelCase")]
    TransferOut { endpoint: u8, data: Vec<u8> },
    #[serde(rename_all = "camelCase")]
    TransferIn { endpoint: u8, length: usize },
}

impl TransferEvent {
    pub fn direction(&self) -> Direction {
        match self {
            Self::ControlTransferOut { .. } | Self::TransferOut { .. } => Direction::Out,
            Self::ControlTransferIn { .. } | Self::TransferIn { .. } => Direction::In,
        }
    }

    /// Bytes sent (OUT) or expected (IN) by this transfer.
    pub fn byte_count(&self) -> usize {
        match self {
            Self::ControlTransferOut { data, .. } | Self::TransferOut { data, .. } => data.len(),
            Self::ControlTransferIn { length, .. } => usize::from(*length),
            Self::TransferIn { length, .. } => *length,
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record is the authoritative phase of its transfer
    Emit(TransferEvent),
    /// The record is the other phase of a transfer and carries nothing new
    SkipPhase,
    /// Transfer type this tool doesn't replay
    Unsupported { transfer_type: u8 },
}

/// Whether `phase` is the phase that carries a transfer's replay data.
pub fn is_authoritative(direction: Direction, phase: Phase) -> bool {
    matches!(
        (direction, phase),
        (Direction::Out, Phase::Submit) | (Direction::In, Phase::Complete)
    )
}

/// Decode a raw usbmon record and decide whether it produces an event.
pub fn reconstruct(raw: &[u8]) -> Result<Outcome, DecodeError> {
    match urb::decode(raw)? {
        Decoded::Unsupported { transfer_type } => Ok(Outcome::Unsupported { transfer_type }),
        Decoded::Record(record) => Ok(match event_for(&record) {
            Some(event) => Outcome::Emit(event),
            None => Outcome::SkipPhase,
        }),
    }
}

/// Build the event for an already decoded record, or `None` when the record
/// is the non-authoritative phase.
pub fn event_for(record: &UrbRecord<'_>) -> Option<TransferEvent> {
    if !is_authoritative(record.direction, record.phase) {
        return None;
    }

    let endpoint = record.endpoint;
    let event = match &record.transfer {
        Transfer::Control(setup) => match record.direction {
            Direction::Out => TransferEvent::ControlTransferOut {
                endpoint,
                setup: ControlRequest::from(setup),
                data: record.data.to_vec(),
            },
            // The completion record reports the realized length in the
            // wLength slot.
            Direction::In => TransferEvent::ControlTransferIn {
                endpoint,
                setup: ControlRequest::from(setup),
                length: setup.length,
            },
        },
        Transfer::Bulk => match record.direction {
            Direction::Out => TransferEvent::TransferOut {
                endpoint,
                data: record.data.to_vec(),
            },
            Direction::In => TransferEvent::TransferIn {
                endpoint,
                length: record.data.len(),
            },
        },
    };

    Some(event)
}
