//! Trackpoint driver for the Yoda II keyboard.
//!
//! The trackpoint is an I²C master that writes 3-byte motion reports to
//! the keyboard controller, which acts as a slave at address `0x30`. The
//! keyboard asks for a report by pulsing an open-drain request line; the
//! trackpoint then reads a short command from us and writes its report.
//!
//! - [`transaction`]: the slave state machine run from the bus ISR
//! - [`trackpoint`]: ISR-shared state, fault policy and the request path
//! - [`pointing`]: polled task turning reports into mouse/scroll reports
//! - [`ht32`]: register-level bring-up for the HT32F165x (feature `embedded`)
//!
//! Everything except [`ht32`] is hardware-agnostic and tested on the host
//! (`cargo test`). The firmware in `main.rs` builds with
//! `--features embedded`.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Protocol & shared state
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod report;
pub mod status;
pub mod transaction;

// ═══════════════════════════════════════════════════════════════════════════
// Driver
// ═══════════════════════════════════════════════════════════════════════════

pub mod hid;
pub mod pointing;
pub mod request;
pub mod trackpoint;

// ═══════════════════════════════════════════════════════════════════════════
// Hardware
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "embedded")]
pub mod ht32;

pub use config::{ButtonMap, FaultPolicy, Gain, I2cUnit, TrackpointConfig};
pub use error::Error;
pub use hid::MouseReport;
pub use pointing::{Clock, HostTransport, MatrixScan, PointingTask, ScrollMode};
pub use report::{RawReport, ReportSlot};
pub use request::RequestLine;
pub use status::{BusEvent, StatusFlags};
pub use trackpoint::{FaultIndicator, LedIndicator, NoIndicator, Trackpoint};
pub use transaction::{BusController, Outcome, TransactionState};
