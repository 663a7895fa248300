//! Record decoding errors.

/// Errors that can occur while decoding a single usbmon record.
///
/// Each variant carries the raw byte(s) that caused it so the offending
/// record can be found in the capture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("record is {actual} bytes, need at least {needed}")]
    Truncated { needed: usize, actual: usize },

    #[error("unknown phase byte 0x{0:02X} (expected 'S' or 'C')")]
    InvalidPhase(u8),

    #[error("request type {bits} in bmRequestType 0x{raw:02X} has no replay mapping (expected standard or class)")]
    UnmappedRequestType { raw: u8, bits: u8 },

    #[error("recipient {bits} in bmRequestType 0x{raw:02X} has no replay mapping (expected device or interface)")]
    UnmappedRecipient { raw: u8, bits: u8 },
}

/// Coarse classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The record itself is damaged: too short or an unknown phase byte.
    MalformedRecord,
    /// A setup-packet bit field holds a value with no replay equivalent.
    UnmappedField,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MalformedRecord => write!(f, "malformed record"),
            ErrorKind::UnmappedField => write!(f, "unmapped field"),
        }
    }
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Truncated { .. } | Self::InvalidPhase(_) => ErrorKind::MalformedRecord,
            Self::UnmappedRequestType { .. } | Self::UnmappedRecipient { .. } => {
                ErrorKind::UnmappedField
            }
        }
    }
}
