//! Trackpoint driver state shared between the bus ISR and the polling loop.
//!
//! Holds the published-report slot and the transaction bookkeeping. The
//! bookkeeping sits behind a critical-section mutex because the request
//! path (thread mode) rewinds the transmit buffer the ISR shifts out of.
//!
//! Typical wiring:
//! ```ignore
//! static TRACKPOINT: Trackpoint = Trackpoint::new(TrackpointConfig::YODA_II);
//!
//! // bus ISR
//! TRACKPOINT.on_interrupt(&mut bus, &mut indicator);
//!
//! // polling loop
//! task.run_once(TRACKPOINT.slot(), &mut keyboard);
//! if request_due {
//!     TRACKPOINT.request(&mut request_line, 0)?;
//! }
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{FaultPolicy, TrackpointConfig};
use crate::error::Error;
use crate::report::ReportSlot;
use crate::request::RequestLine;
use crate::transaction::{BusController, Outcome, TransactionState};

/// Visible fault signal for bring-up boards.
pub trait FaultIndicator {
    /// Show the fault.
    fn raise(&mut self);
    /// Clear the fault display.
    fn clear(&mut self);
}

/// Board without a fault indicator.
pub struct NoIndicator;

impl FaultIndicator for NoIndicator {
    fn raise(&mut self) {}
    fn clear(&mut self) {}
}

/// LED on a GPIO, lit while a fault is shown.
pub struct LedIndicator<P: OutputPin>(pub P);

impl<P: OutputPin> FaultIndicator for LedIndicator<P> {
    fn raise(&mut self) {
        let _ = self.0.set_high();
    }

    fn clear(&mut self) {
        let _ = self.0.set_low();
    }
}

pub struct Trackpoint {
    config: TrackpointConfig,
    slot: ReportSlot,
    state: Mutex<CriticalSectionRawMutex, RefCell<TransactionState>>,
}

impl Trackpoint {
    pub const fn new(config: TrackpointConfig) -> Self {
        Self {
            config,
            slot: ReportSlot::new(),
            state: Mutex::new(RefCell::new(TransactionState::new())),
        }
    }

    pub fn config(&self) -> &TrackpointConfig {
        &self.config
    }

    /// Latest completed report, consumed by the pointing task.
    pub fn slot(&self) -> &ReportSlot {
        &self.slot
    }

    /// Copy of the transaction bookkeeping.
    pub fn transaction(&self) -> TransactionState {
        self.state.lock(|state| state.borrow().clone())
    }

    /// Run the state machine for one interrupt without applying the fault
    /// policy.
    pub fn handle_event<B: BusController>(&self, bus: &mut B) -> Result<Outcome, Error> {
        self.state
            .lock(|state| state.borrow_mut().on_interrupt(bus, &self.slot))
    }

    /// ISR body: run the state machine and apply the configured
    /// [`FaultPolicy`] to a desync.
    ///
    /// With [`FaultPolicy::Halt`] the indicator is cleared on every entry;
    /// on a desync it is raised and this never returns.
    pub fn on_interrupt<B, F>(&self, bus: &mut B, indicator: &mut F)
    where
        B: BusController,
        F: FaultIndicator,
    {
        let halt = self.config.fault_policy == FaultPolicy::Halt;
        if halt {
            indicator.clear();
        }

        if self.handle_event(bus).is_err() && halt {
            indicator.raise();
            loop {
                core::hint::spin_loop();
            }
        }
    }

    /// Solicit the next report: load the request command for the
    /// trackpoint to read, then pulse the request line.
    ///
    /// Always starts a fresh exchange, whether or not the previous one
    /// completed.
    pub fn request<P, D>(&self, line: &mut RequestLine<P, D>, param: u8) -> Result<(), Error>
    where
        P: OutputPin,
        D: DelayNs,
    {
        self.state
            .lock(|state| state.borrow_mut().load_request(param));
        line.pulse(self.config.request_pulse_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RawReport;
    use crate::request::tests::RecordingDelay;
    use crate::status::bits::*;
    use crate::status::StatusFlags;
    use crate::transaction::tests::FakeBus;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    #[derive(Default)]
    struct CountingIndicator {
        raised: u32,
        cleared: u32,
    }

    impl FaultIndicator for CountingIndicator {
        fn raise(&mut self) {
            self.raised += 1;
        }

        fn clear(&mut self) {
            self.cleared += 1;
        }
    }

    #[test]
    fn request_loads_command_and_pulses_line() {
        let tp = Trackpoint::new(TrackpointConfig::YODA_II);
        let expectations = [
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut line = RequestLine::new(pin.clone(), RecordingDelay::default());

        tp.request(&mut line, 0x21).unwrap();

        let txn = tp.transaction();
        assert_eq!(txn.tx_buffer(), [0x7E, 0x44, 0x01, 0x21]);
        assert_eq!(txn.tx_count(), 0);

        let (_, delay) = line.free();
        assert_eq!(delay.waits_us, [100]);
        pin.done();
    }

    #[test]
    fn request_resets_a_stuck_exchange() {
        let tp = Trackpoint::new(TrackpointConfig::YODA_II);
        let mut bus = FakeBus::default();
        for _ in 0..3 {
            bus.push(TXNRX | BUSBUSY | TXDE);
            tp.handle_event(&mut bus).unwrap();
        }
        assert_eq!(tp.transaction().tx_count(), 3);

        let mut pin = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut line = RequestLine::new(pin.clone(), RecordingDelay::default());
        tp.request(&mut line, 0).unwrap();
        assert_eq!(tp.transaction().tx_count(), 0);
        pin.done();
    }

    #[test]
    fn isr_publishes_into_the_slot() {
        let tp = Trackpoint::new(TrackpointConfig::YODA_II);
        let mut bus = FakeBus::default();
        let mut indicator = CountingIndicator::default();

        bus.push(BUSBUSY | ADRS);
        bus.push_byte(BUSBUSY | RXDNE, 0x00);
        bus.push_byte(BUSBUSY | RXDNE, 0x03);
        bus.push_byte(RXDNE | STO, 0xFF);
        for _ in 0..4 {
            tp.on_interrupt(&mut bus, &mut indicator);
        }

        assert_eq!(tp.slot().take(), RawReport::from_motion(0, 3, -1));
        // Production policy never touches the indicator.
        assert_eq!(indicator.cleared, 0);
        assert_eq!(indicator.raised, 0);
    }

    #[test]
    fn ignore_policy_returns_on_desync() {
        let tp = Trackpoint::new(TrackpointConfig::YODA_II);
        let mut bus = FakeBus::default();
        let mut indicator = CountingIndicator::default();

        bus.push(BUSBUSY | RXDNE | TXDE);
        tp.on_interrupt(&mut bus, &mut indicator);
        assert_eq!(indicator.raised, 0);
    }

    #[test]
    fn halt_policy_clears_indicator_on_every_entry() {
        let tp = Trackpoint::new(TrackpointConfig::HT32_TEST);
        let mut bus = FakeBus::default();
        let mut indicator = CountingIndicator::default();

        bus.push(BUSBUSY | ADRS);
        bus.push(STO);
        tp.on_interrupt(&mut bus, &mut indicator);
        tp.on_interrupt(&mut bus, &mut indicator);

        assert_eq!(indicator.cleared, 2);
        assert_eq!(indicator.raised, 0);
    }

    #[test]
    fn handle_event_surfaces_desync() {
        let tp = Trackpoint::new(TrackpointConfig::HT32_TEST);
        let mut bus = FakeBus::default();

        bus.push(TXDE);
        assert_eq!(
            tp.handle_event(&mut bus),
            Err(Error::Desync(StatusFlags::TXDE))
        );
    }
}
