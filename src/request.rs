//! Trackpoint request line.
//!
//! Pulling the open-drain request line low for a short time asks the
//! trackpoint to start a bus exchange. The line idles high.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::Error;

/// Request GPIO plus the delay used to time the pulse.
pub struct RequestLine<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> RequestLine<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Drive the line low for `us` microseconds, then release it high.
    pub fn pulse(&mut self, us: u32) -> Result<(), Error> {
        self.pin.set_low().map_err(|_| Error::RequestLine)?;
        self.delay.delay_us(us);
        self.pin.set_high().map_err(|_| Error::RequestLine)
    }

    /// Release the line (idle high).
    pub fn release(&mut self) -> Result<(), Error> {
        self.pin.set_high().map_err(|_| Error::RequestLine)
    }

    pub fn free(self) -> (P, D) {
        (self.pin, self.delay)
    }
}
