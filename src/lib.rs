//! usbreplay - turn usbmon captures into WebUSB replay scripts
//!
//! A capture of Linux usbmon traffic (pcapng or pcap, link type 220) is read
//! once, front to back. Each control or bulk transfer appears twice in such a
//! capture, at submission and at completion; exactly one of the two is turned
//! into a WebUSB call, chosen by the transfer's direction.
//!
//! # Module Structure
//!
//! - [`capture`] - container block reading and payload extraction
//! - [`urb`] - usbmon record header and setup packet decoding
//! - [`transfer`] - phase filtering and transfer events
//! - [`render`] - JavaScript and JSON output
//! - [`convert`] - the streaming pipeline and record inspection
//! - [`config`] - TOML configuration
//! - [`cli`] - command line definitions

pub mod capture;
pub mod cli;
pub mod config;
pub mod convert;
pub mod render;
pub mod transfer;
pub mod urb;

pub use config::Config;
pub use convert::{ConversionStats, ConvertError, Converter};
pub use transfer::TransferEvent;
