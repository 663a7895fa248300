//! Capture container errors.

use std::io;

use pcap_parser::PcapError;

/// Errors that can occur while reading blocks from a capture file.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to read capture: {0}")]
    Io(#[from] io::Error),

    #[error("Capture is empty")]
    Empty,

    #[error("Unrecognized capture format (magic {0:02X?}); expected pcapng or pcap")]
    UnknownFormat([u8; 4]),

    #[error("Capture ends in the middle of the block at offset {offset}")]
    Truncated { offset: u64 },

    #[error("Corrupt block at offset {offset}: {reason}")]
    CorruptBlock { offset: u64, reason: String },
}

impl CaptureError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptBlock {
            offset,
            reason: reason.into(),
        }
    }

    /// Map a container parser error for the block at `offset`.
    pub(crate) fn from_parser(offset: u64, err: &PcapError<&[u8]>) -> Self {
        match err {
            PcapError::ReadError => Self::Io(io::Error::new(
                io::ErrorKind::Other,
                "read error in capture parser",
            )),
            PcapError::Eof | PcapError::Incomplete(_) => Self::Truncated { offset },
            PcapError::NomError(_, kind) | PcapError::OwnedNomError(_, kind) => {
                Self::corrupt(offset, format!("unparsable block ({:?})", kind))
            }
            other => Self::corrupt(offset, format!("{:?}", other)),
        }
    }
}
