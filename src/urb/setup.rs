//! Control transfer setup packet.

use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Request type, bits 6..5 of `bmRequestType`.
///
/// Only the values a WebUSB `controlTransfer*` call can express are mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Standard,
    Class,
}

impl RequestType {
    const MASK: u8 = 0b0110_0000;
    const SHIFT: u32 = 5;

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Standard),
            1 => Some(Self::Class),
            _ => None,
        }
    }

    /// Name as used by the WebUSB API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Class => "class",
        }
    }
}

/// Recipient, bits 4..0 of `bmRequestType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    Device,
    Interface,
}

impl Recipient {
    const MASK: u8 = 0b0001_1111;

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Device),
            1 => Some(Self::Interface),
            _ => None,
        }
    }

    /// Name as used by the WebUSB API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Interface => "interface",
        }
    }
}

/// Decoded 8-byte setup packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupPacket {
    pub request_type: RequestType,
    pub recipient: Recipient,
    /// `bRequest`
    pub request: u8,
    /// `wValue`
    pub value: u16,
    /// `wIndex`
    pub index: u16,
    /// `wLength` on submission; on completion records the same slot holds
    /// the realized length.
    pub length: u16,
}

impl SetupPacket {
    pub const LEN: usize = 8;

    /// Parse the setup packet bytes.
    ///
    /// Fails when the request type or recipient has no WebUSB mapping
    /// (vendor/reserved types, endpoint/other recipients).
    pub fn parse(raw: &[u8; Self::LEN]) -> Result<Self, DecodeError> {
        let bm_request_type = raw[0];

        let type_bits = (bm_request_type & RequestType::MASK) >> RequestType::SHIFT;
        let request_type =
            RequestType::from_bits(type_bits).ok_or(DecodeError::UnmappedRequestType {
                raw: bm_request_type,
                bits: type_bits,
            })?;

        let recipient_bits = bm_request_type & Recipient::MASK;
        let recipient =
            Recipient::from_bits(recipient_bits).ok_or(DecodeError::UnmappedRecipient {
                raw: bm_request_type,
                bits: recipient_bits,
            })?;

        Ok(Self {
            request_type,
            recipient,
            request: raw[1],
            value: u16::from_le_bytes([raw[2], raw[3]]),
            index: u16::from_le_bytes([raw[4], raw[5]]),
            length: u16::from_le_bytes([raw[6], raw[7]]),
        })
    }
}
