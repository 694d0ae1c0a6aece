//! Raw trackpoint report and the single-slot hand-off between the bus ISR
//! and the pointing task.
//!
//! Layout (3 bytes, as sent by the trackpoint):
//! ```text
//! Byte 0: Button / Z-tap bitfield (bit 0 = tap)
//! Byte 1: X displacement (signed)
//! Byte 2: Y displacement (signed, positive = up)
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::REPORT_SIZE;

/// One motion report as received from the trackpoint.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawReport([u8; REPORT_SIZE]);

impl RawReport {
    pub const ZERO: Self = Self([0; REPORT_SIZE]);

    pub const fn new(bytes: [u8; REPORT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a report from signed fields.
    pub const fn from_motion(status: u8, dx: i8, dy: i8) -> Self {
        Self([status, dx as u8, dy as u8])
    }

    pub const fn bytes(&self) -> [u8; REPORT_SIZE] {
        self.0
    }

    /// Status byte (buttons and tap).
    pub const fn status(&self) -> u8 {
        self.0[0]
    }

    /// Z-tap bit, reported as mouse button 1.
    pub const fn tap(&self) -> u8 {
        self.0[0] & 0x01
    }

    pub const fn dx(&self) -> i8 {
        self.0[1] as i8
    }

    pub const fn dy(&self) -> i8 {
        self.0[2] as i8
    }

    pub const fn is_zero(&self) -> bool {
        self.0[0] == 0 && self.0[1] == 0 && self.0[2] == 0
    }

    /// Pack into one word so the report can be stored atomically.
    pub const fn to_word(self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], 0])
    }

    /// Inverse of [`RawReport::to_word`]; the top byte is ignored.
    pub const fn from_word(word: u32) -> Self {
        let b = word.to_le_bytes();
        Self([b[0], b[1], b[2]])
    }
}

impl From<[u8; REPORT_SIZE]> for RawReport {
    fn from(bytes: [u8; REPORT_SIZE]) -> Self {
        Self(bytes)
    }
}

/// Latest completed report.
///
/// Single producer (the ISR) and single consumer (the pointing task). The
/// producer overwrites whatever is there; a report the task has not drained
/// yet is lost. The consumer reads and clears in one atomic swap so it can
/// never observe a half-written report or drop one published between its
/// read and its clear.
pub struct ReportSlot {
    word: AtomicU32,
}

impl ReportSlot {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Publish a completed report, replacing any unconsumed one.
    pub fn publish(&self, report: RawReport) {
        self.word.store(report.to_word(), Ordering::Release);
    }

    /// Read and clear.
    pub fn take(&self) -> RawReport {
        RawReport::from_word(self.word.swap(0, Ordering::AcqRel))
    }

    /// Read without consuming.
    pub fn peek(&self) -> RawReport {
        RawReport::from_word(self.word.load(Ordering::Acquire))
    }
}

impl Default for ReportSlot {
    fn default() -> Self {
        Self::new()
    }
}
