//! Conversion statistics.

use humansize::{format_size, BINARY};

use crate::transfer::TransferEvent;
use crate::urb::Direction;

/// Counters collected over one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Blocks read from the capture, of any kind
    pub blocks: usize,
    /// usbmon records seen
    pub records: usize,
    /// Calls written
    pub emitted: usize,
    /// Records dropped because the other phase carries the transfer
    pub skipped_phase: usize,
    /// Interrupt/isochronous/unknown records
    pub unsupported: usize,
    /// Packets from non-usbmon interfaces
    pub foreign: usize,
    /// Bytes the script sends to the device
    pub bytes_out: u64,
    /// Bytes the script asks the device for
    pub bytes_in: u64,
}

impl ConversionStats {
    pub(crate) fn record_event(&mut self, event: &TransferEvent) {
        self.emitted += 1;
        let count = event.byte_count() as u64;
        match event.direction() {
            Direction::Out => self.bytes_out += count,
            Direction::In => self.bytes_in += count,
        }
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "{} transfers from {} records ({} other-phase, {} unsupported); {} out, {} in",
            self.emitted,
            self.records,
            self.skipped_phase,
            self.unsupported,
            format_size(self.bytes_out, BINARY),
            format_size(self.bytes_in, BINARY),
        );
        if self.foreign > 0 {
            s.push_str(&format!("; {} non-usbmon packets skipped", self.foreign));
        }
        s
    }
}
