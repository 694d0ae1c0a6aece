//! Unified error type for the trackpoint driver.
//!
//! No `alloc`: variants carry only fixed-size data.
//! Implements `defmt::Format` for on-target logging.

use crate::status::StatusFlags;

/// Top-level error type used across the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Bus
    /// The I²C controller raised a flag combination the state machine does
    /// not expect. Carries the full status snapshot.
    Desync(StatusFlags),

    // GPIO
    /// Driving the request line failed.
    RequestLine,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Desync(sr) => write!(f, "i2c bus desync ({:?})", sr),
            Error::RequestLine => f.write_str("request line gpio failed"),
        }
    }
}
