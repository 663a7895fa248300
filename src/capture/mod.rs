//! Capture file reading
//!
//! Container parsing is done by `pcap_parser`; this module adapts its blocks
//! into owned [`Block`]s tagged with their byte offset, tracks the link type
//! of each interface, and exposes the raw packet bytes of data-carrying
//! blocks. Nothing here knows about USB beyond the usbmon link type used to
//! filter packets.

mod error;

pub use error::CaptureError;

use std::io::{self, Cursor, Read};

use humansize::{format_size, BINARY};
use pcap_parser::pcapng::Block as NgBlock;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned, PcapError, PcapNGReader};
use tracing::{debug, trace};

/// `LINKTYPE_USB_LINUX_MMAPPED`: usbmon records with the 64-byte header.
pub const LINKTYPE_USB_LINUX_MMAPPED: u16 = 220;

/// Section header block type, identical in both byte orders.
const PCAPNG_MAGIC: [u8; 4] = [0x0A, 0x0D, 0x0D, 0x0A];

/// Classic pcap magics as they appear on disk: microsecond and nanosecond,
/// little and big endian.
const PCAP_MAGICS: [[u8; 4]; 4] = [
    [0xD4, 0xC3, 0xB2, 0xA1],
    [0x4D, 0x3C, 0xB2, 0xA1],
    [0xA1, 0xB2, 0xC3, 0xD4],
    [0xA1, 0xB2, 0x3C, 0x4D],
];

/// Bytes read up front so the parser sees the whole file header in its
/// first read, even from a pipe.
const PREFIX_LEN: u64 = 4096;

const INITIAL_BUFFER_LEN: usize = 256 * 1024;

/// Largest block accepted before giving up on growing the read buffer.
const MAX_BUFFER_LEN: usize = 64 * 1024 * 1024;

/// One block of a capture file, tagged with its byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub offset: u64,
    pub kind: BlockKind,
}

/// Block contents the converter cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    SectionHeader,
    /// pcapng interface description, or the global header of a pcap file
    InterfaceDescription { link_type: u16, snap_len: u32 },
    InterfaceStatistics,
    /// A captured packet
    Packet {
        interface_id: Option<u32>,
        /// Link type of the packet's interface, if it was declared
        link_type: Option<u16>,
        data: Vec<u8>,
    },
    /// Name resolution, custom, or unknown blocks
    Other,
}

/// What a block carries, as seen by the payload extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// A usbmon record (or a packet whose interface is unknown)
    Usb(&'a [u8]),
    /// A packet captured on a non-usbmon interface
    Foreign { link_type: u16, data: &'a [u8] },
    /// Header, statistics or other non-data block
    NotApplicable,
}

impl Block {
    pub fn payload(&self) -> Payload<'_> {
        match &self.kind {
            BlockKind::Packet {
                link_type: Some(link_type),
                data,
                ..
            } if *link_type != LINKTYPE_USB_LINUX_MMAPPED => Payload::Foreign {
                link_type: *link_type,
                data,
            },
            BlockKind::Packet { data, .. } => Payload::Usb(data),
            _ => Payload::NotApplicable,
        }
    }
}

/// Container format of a capture file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Pcapng,
    Pcap,
}

type Source<R> = io::Chain<Cursor<Vec<u8>>, R>;

enum Parser<R: Read> {
    Pcapng(PcapNGReader<Source<R>>),
    Pcap(LegacyPcapReader<Source<R>>),
}

/// Offsets and interface table carried across blocks.
#[derive(Debug)]
struct ReadState {
    offset: u64,
    /// Link type per interface id, reset at every section
    interfaces: Vec<u16>,
    /// `Incomplete` results since the last block
    stalls: u32,
    buffer_len: usize,
    failed: bool,
}

enum Step {
    Block(usize, BlockKind),
    Eof,
    Incomplete,
    Failed(CaptureError),
}

/// Streams blocks from a capture, detecting the container from its magic.
pub struct CaptureReader<R: Read> {
    parser: Parser<R>,
    state: ReadState,
}

impl<R: Read> CaptureReader<R> {
    pub fn new(mut reader: R) -> Result<Self, CaptureError> {
        let mut prefix = Vec::new();
        (&mut reader).take(PREFIX_LEN).read_to_end(&mut prefix)?;

        let magic: [u8; 4] = match prefix.get(..4) {
            Some(bytes) => [bytes[0], bytes[1], bytes[2], bytes[3]],
            None if prefix.is_empty() => return Err(CaptureError::Empty),
            None => return Err(CaptureError::Truncated { offset: 0 }),
        };

        let source = Cursor::new(prefix).chain(reader);
        let parser = if magic == PCAPNG_MAGIC {
            PcapNGReader::new(INITIAL_BUFFER_LEN, source)
                .map(Parser::Pcapng)
                .map_err(|e| CaptureError::from_parser(0, &e))?
        } else if PCAP_MAGICS.contains(&magic) {
            LegacyPcapReader::new(INITIAL_BUFFER_LEN, source)
                .map(Parser::Pcap)
                .map_err(|e| CaptureError::from_parser(0, &e))?
        } else {
            return Err(CaptureError::UnknownFormat(magic));
        };

        Ok(Self {
            parser,
            state: ReadState {
                offset: 0,
                interfaces: Vec::new(),
                stalls: 0,
                buffer_len: INITIAL_BUFFER_LEN,
                failed: false,
            },
        })
    }

    pub fn format(&self) -> CaptureFormat {
        match self.parser {
            Parser::Pcapng(_) => CaptureFormat::Pcapng,
            Parser::Pcap(_) => CaptureFormat::Pcap,
        }
    }

    /// Read the next block, or `None` at a clean end of file.
    pub fn next_block(&mut self) -> Result<Option<Block>, CaptureError> {
        match &mut self.parser {
            Parser::Pcapng(parser) => self.state.pull(parser),
            Parser::Pcap(parser) => self.state.pull(parser),
        }
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<Block, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.failed {
            return None;
        }
        match self.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => None,
            Err(e) => {
                self.state.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl ReadState {
    fn pull<P: PcapReaderIterator>(
        &mut self,
        parser: &mut P,
    ) -> Result<Option<Block>, CaptureError> {
        loop {
            let offset = self.offset;
            let step = match parser.next() {
                Ok((len, block)) => Step::Block(len, self.block_kind(&block)),
                Err(PcapError::Eof) => Step::Eof,
                Err(PcapError::Incomplete(_)) => Step::Incomplete,
                Err(e) => Step::Failed(CaptureError::from_parser(offset, &e)),
            };

            match step {
                Step::Block(len, kind) => {
                    parser.consume(len);
                    self.offset += len as u64;
                    self.stalls = 0;
                    trace!("block at offset {} ({} bytes)", offset, len);
                    return Ok(Some(Block { offset, kind }));
                }
                Step::Eof => return Ok(None),
                Step::Failed(e) => return Err(e),
                Step::Incomplete => {
                    // Already refilled once and the input is gone
                    if self.stalls > 0 && parser.reader_exhausted() {
                        return Err(CaptureError::Truncated { offset });
                    }
                    parser
                        .refill()
                        .map_err(|e| CaptureError::from_parser(offset, &e))?;
                    self.stalls += 1;
                    if self.stalls > 1 && !parser.reader_exhausted() {
                        self.grow(parser, offset)?;
                    }
                }
            }
        }
    }

    /// The block at `offset` does not fit in the read buffer.
    fn grow<P: PcapReaderIterator>(
        &mut self,
        parser: &mut P,
        offset: u64,
    ) -> Result<(), CaptureError> {
        let wanted = self.buffer_len * 2;
        if wanted > MAX_BUFFER_LEN || !parser.grow(wanted) {
            return Err(CaptureError::corrupt(
                offset,
                format!(
                    "block is larger than {}",
                    format_size(self.buffer_len as u64, BINARY)
                ),
            ));
        }
        debug!(
            "read buffer grown to {} for block at offset {}",
            format_size(wanted as u64, BINARY),
            offset
        );
        self.buffer_len = wanted;
        Ok(())
    }

    fn block_kind(&mut self, block: &PcapBlockOwned<'_>) -> BlockKind {
        match block {
            PcapBlockOwned::LegacyHeader(header) => {
                // Upper 16 bits of the network field carry FCS information
                let link_type = (header.network.0 & 0xFFFF) as u16;
                debug!("pcap capture with link type {}", link_type);
                self.interfaces = vec![link_type];
                BlockKind::InterfaceDescription {
                    link_type,
                    snap_len: header.snaplen,
                }
            }
            PcapBlockOwned::Legacy(packet) => BlockKind::Packet {
                interface_id: None,
                link_type: self.interfaces.first().copied(),
                data: packet.data.to_vec(),
            },
            PcapBlockOwned::NG(NgBlock::SectionHeader(_)) => {
                // Interface ids are scoped to their section
                self.interfaces.clear();
                BlockKind::SectionHeader
            }
            PcapBlockOwned::NG(NgBlock::InterfaceDescription(idb)) => {
                let link_type = (idb.linktype.0 & 0xFFFF) as u16;
                debug!(
                    "interface {} has link type {}",
                    self.interfaces.len(),
                    link_type
                );
                self.interfaces.push(link_type);
                BlockKind::InterfaceDescription {
                    link_type,
                    snap_len: idb.snaplen,
                }
            }
            PcapBlockOwned::NG(NgBlock::EnhancedPacket(epb)) => {
                self.packet(epb.if_id, clamp(epb.data, epb.caplen))
            }
            PcapBlockOwned::NG(NgBlock::SimplePacket(spb)) => {
                self.packet(0, clamp(spb.data, spb.origlen))
            }
            PcapBlockOwned::NG(NgBlock::InterfaceStatistics(_)) => BlockKind::InterfaceStatistics,
            PcapBlockOwned::NG(_) => BlockKind::Other,
        }
    }

    fn packet(&self, interface_id: u32, data: &[u8]) -> BlockKind {
        BlockKind::Packet {
            interface_id: Some(interface_id),
            link_type: self.interfaces.get(interface_id as usize).copied(),
            data: data.to_vec(),
        }
    }
}

/// Packet bytes without the block's 32-bit padding.
fn clamp(data: &[u8], captured: u32) -> &[u8] {
    &data[..data.len().min(captured as usize)]
}
