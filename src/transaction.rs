//! I²C slave transaction state machine.
//!
//! Runs in the bus ISR. Each interrupt is classified into a [`BusEvent`]
//! and handled in O(1): bytes are shifted out of the command buffer while
//! the trackpoint reads from us, and shifted into the report buffer while
//! it writes to us. A report is published once three bytes have arrived
//! and the stop condition is seen.
//!
//! The ISR must not block, allocate or log.

use crate::config::{REPORT_SIZE, REQUEST_PREFIX, TX_BUFFER_SIZE};
use crate::error::Error;
use crate::report::{RawReport, ReportSlot};
use crate::status::{BusEvent, StatusFlags};

/// Register-level access to the I²C controller running in slave mode.
pub trait BusController {
    /// Sample the status register.
    fn status(&mut self) -> StatusFlags;
    /// Read the data register.
    fn read_data(&mut self) -> u8;
    /// Write the data register.
    fn write_data(&mut self, byte: u8);
    /// Write-1-clear latched status bits.
    fn clear_status(&mut self, flags: StatusFlags);
}

/// What the state machine did with one interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Bookkeeping only.
    Idle,
    /// A byte was shifted out to the trackpoint.
    Sent(u8),
    /// A byte was shifted in from the trackpoint.
    Received(u8),
    /// A complete report was published.
    Published(RawReport),
}

/// Per-transaction bookkeeping shared by the ISR and the request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionState {
    rx: [u8; REPORT_SIZE],
    rx_count: u8,
    tx: [u8; TX_BUFFER_SIZE],
    tx_count: u8,
}

impl TransactionState {
    pub const fn new() -> Self {
        Self {
            rx: [0; REPORT_SIZE],
            rx_count: 0,
            tx: [0; TX_BUFFER_SIZE],
            tx_count: 0,
        }
    }

    /// Load the command the trackpoint will read next and rewind the
    /// transmit index.
    pub fn load_request(&mut self, param: u8) {
        self.tx_count = 0;
        self.tx[..REQUEST_PREFIX.len()].copy_from_slice(&REQUEST_PREFIX);
        self.tx[TX_BUFFER_SIZE - 1] = param;
    }

    pub fn rx_count(&self) -> u8 {
        self.rx_count
    }

    pub fn tx_count(&self) -> u8 {
        self.tx_count
    }

    pub fn tx_buffer(&self) -> [u8; TX_BUFFER_SIZE] {
        self.tx
    }

    /// Report assembled so far.
    pub fn rx_report(&self) -> RawReport {
        RawReport::new(self.rx)
    }

    /// Sample the controller, classify and handle one interrupt.
    pub fn on_interrupt<B: BusController>(
        &mut self,
        bus: &mut B,
        slot: &ReportSlot,
    ) -> Result<Outcome, Error> {
        let sr = bus.status();
        self.handle(BusEvent::classify(sr), sr, bus, slot)
    }

    /// Handle an already classified event. `sr` is the snapshot it was
    /// classified from.
    pub fn handle<B: BusController>(
        &mut self,
        event: BusEvent,
        sr: StatusFlags,
        bus: &mut B,
        slot: &ReportSlot,
    ) -> Result<Outcome, Error> {
        match event {
            BusEvent::Transmit => {
                let idx = self.tx_count as usize;
                self.tx_count = self.tx_count.saturating_add(1);
                match self.tx.get(idx) {
                    Some(&byte) => {
                        bus.write_data(byte);
                        Ok(Outcome::Sent(byte))
                    }
                    None => Ok(Outcome::Idle),
                }
            }
            BusEvent::AddressMatched => {
                self.rx_count = 0;
                Ok(Outcome::Idle)
            }
            BusEvent::ByteReceived { stop } => {
                let byte = bus.read_data();
                if let Some(cell) = self.rx.get_mut(self.rx_count as usize) {
                    *cell = byte;
                }
                self.rx_count = self.rx_count.saturating_add(1);
                Ok(self
                    .publish_if_complete(stop, slot)
                    .unwrap_or(Outcome::Received(byte)))
            }
            BusEvent::NotAcknowledged { stop } => {
                let latched = sr & StatusFlags::LATCHED_ERRORS;
                if !latched.is_empty() {
                    bus.clear_status(latched);
                }
                Ok(self.publish_if_complete(stop, slot).unwrap_or(Outcome::Idle))
            }
            BusEvent::Stop => Ok(self.publish_if_complete(true, slot).unwrap_or(Outcome::Idle)),
            BusEvent::Unrecognized(sr) => Err(Error::Desync(sr)),
        }
    }

    fn publish_if_complete(&self, stop: bool, slot: &ReportSlot) -> Option<Outcome> {
        if stop && self.rx_count as usize >= REPORT_SIZE {
            let report = self.rx_report();
            slot.publish(report);
            Some(Outcome::Published(report))
        } else {
            None
        }
    }
}

impl Default for TransactionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::status::bits::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Controller double: replays status snapshots and incoming bytes,
    /// records outgoing bytes and cleared flags.
    #[derive(Default)]
    pub(crate) struct FakeBus {
        pub status: VecDeque<StatusFlags>,
        pub incoming: VecDeque<u8>,
        pub sent: Vec<u8>,
        pub cleared: Vec<StatusFlags>,
    }

    impl FakeBus {
        pub fn push(&mut self, bits: u32) -> &mut Self {
            self.status.push_back(StatusFlags::from_bits(bits));
            self
        }

        pub fn push_byte(&mut self, bits: u32, byte: u8) -> &mut Self {
            self.incoming.push_back(byte);
            self.push(bits)
        }
    }

    impl BusController for FakeBus {
        fn status(&mut self) -> StatusFlags {
            self.status.pop_front().expect("no status queued")
        }

        fn read_data(&mut self) -> u8 {
            self.incoming.pop_front().expect("no byte queued")
        }

        fn write_data(&mut self, byte: u8) {
            self.sent.push(byte);
        }

        fn clear_status(&mut self, flags: StatusFlags) {
            self.cleared.push(flags);
        }
    }

    fn receive(state: &mut TransactionState, bus: &mut FakeBus, slot: &ReportSlot, bytes: &[u8]) {
        bus.push(BUSBUSY | ADRS);
        state.on_interrupt(bus, slot).unwrap();
        for (i, &b) in bytes.iter().enumerate() {
            let bits = if i + 1 == bytes.len() {
                RXDNE | STO
            } else {
                BUSBUSY | RXDNE
            };
            bus.push_byte(bits, b);
            state.on_interrupt(bus, slot).unwrap();
        }
    }

    #[test]
    fn transmit_shifts_out_each_command_byte_once() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();
        state.load_request(0x5A);

        for i in 0..TX_BUFFER_SIZE {
            let bits = if i == 0 {
                TXNRX | BUSBUSY | TXDE | ADRS
            } else {
                TXNRX | BUSBUSY | TXDE
            };
            bus.push(bits);
            let before = state.tx_count();
            let out = state.on_interrupt(&mut bus, &slot).unwrap();

            assert_eq!(state.tx_count(), before + 1);
            assert_eq!(out, Outcome::Sent(state.tx_buffer()[i]));
        }
        assert_eq!(bus.sent, [0x7E, 0x44, 0x01, 0x5A]);
    }

    #[test]
    fn transmit_past_buffer_end_counts_but_writes_nothing() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();
        state.load_request(0);

        for _ in 0..6 {
            bus.push(TXNRX | BUSBUSY | TXDE);
            state.on_interrupt(&mut bus, &slot).unwrap();
        }
        assert_eq!(bus.sent.len(), TX_BUFFER_SIZE);
        assert_eq!(state.tx_count(), 6);
    }

    #[test]
    fn tx_count_saturates() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();
        state.load_request(0);

        for _ in 0..300 {
            bus.push(TXNRX | BUSBUSY | TXDE);
            state.on_interrupt(&mut bus, &slot).unwrap();
        }
        assert_eq!(state.tx_count(), u8::MAX);
        assert_eq!(bus.sent.len(), TX_BUFFER_SIZE);
    }

    #[test]
    fn load_request_rewinds_transmit_index() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();
        state.load_request(1);
        bus.push(TXNRX | BUSBUSY | TXDE);
        state.on_interrupt(&mut bus, &slot).unwrap();
        assert_eq!(state.tx_count(), 1);

        state.load_request(2);
        assert_eq!(state.tx_count(), 0);
        assert_eq!(state.tx_buffer(), [0x7E, 0x44, 0x01, 2]);
    }

    #[test]
    fn three_bytes_and_stop_publish_report() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        receive(&mut state, &mut bus, &slot, &[0x01, 0x05, 0xFD]);

        assert_eq!(state.rx_count(), 3);
        assert_eq!(slot.take(), RawReport::new([0x01, 0x05, 0xFD]));
    }

    #[test]
    fn no_publish_without_stop() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        bus.push(BUSBUSY | ADRS);
        state.on_interrupt(&mut bus, &slot).unwrap();
        for b in [1u8, 2, 3, 4] {
            bus.push_byte(BUSBUSY | RXDNE, b);
            assert_eq!(
                state.on_interrupt(&mut bus, &slot).unwrap(),
                Outcome::Received(b)
            );
        }
        assert!(slot.peek().is_zero());
    }

    #[test]
    fn short_transaction_is_not_published() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        receive(&mut state, &mut bus, &slot, &[0x00, 0x07]);
        assert_eq!(state.rx_count(), 2);
        assert!(slot.peek().is_zero());
    }

    #[test]
    fn overlong_transaction_publishes_first_three_bytes() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        receive(&mut state, &mut bus, &slot, &[0x00, 0x10, 0x20, 0x30, 0x40]);
        assert_eq!(state.rx_count(), 5);
        assert_eq!(slot.take(), RawReport::new([0x00, 0x10, 0x20]));
    }

    #[test]
    fn address_match_restarts_receive() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        // Two stray bytes, then a fresh transaction.
        bus.push_byte(BUSBUSY | RXDNE, 0xEE);
        state.on_interrupt(&mut bus, &slot).unwrap();
        bus.push_byte(BUSBUSY | RXDNE, 0xEE);
        state.on_interrupt(&mut bus, &slot).unwrap();

        receive(&mut state, &mut bus, &slot, &[0x00, 0x02, 0x03]);
        assert_eq!(slot.take(), RawReport::new([0x00, 0x02, 0x03]));
    }

    #[test]
    fn stop_on_its_own_edge_publishes() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        bus.push(BUSBUSY | ADRS);
        state.on_interrupt(&mut bus, &slot).unwrap();
        for b in [0x00, 0x09, 0xF7] {
            bus.push_byte(BUSBUSY | RXDNE, b);
            state.on_interrupt(&mut bus, &slot).unwrap();
        }
        assert!(slot.peek().is_zero());

        bus.push(STO);
        let out = state.on_interrupt(&mut bus, &slot).unwrap();
        assert_eq!(out, Outcome::Published(RawReport::new([0x00, 0x09, 0xF7])));
        assert_eq!(slot.take(), RawReport::new([0x00, 0x09, 0xF7]));
    }

    #[test]
    fn bare_stop_before_three_bytes_is_ignored() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        bus.push(STO);
        assert_eq!(state.on_interrupt(&mut bus, &slot).unwrap(), Outcome::Idle);
        assert!(slot.peek().is_zero());
    }

    #[test]
    fn nack_clears_only_latched_bits_that_are_set() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        bus.push(BUSBUSY | RXNACK | ARBLOS);
        assert_eq!(state.on_interrupt(&mut bus, &slot).unwrap(), Outcome::Idle);
        assert_eq!(
            bus.cleared,
            [StatusFlags::RXNACK | StatusFlags::ARBLOS]
        );
    }

    #[test]
    fn nack_with_stop_publishes_complete_report() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        bus.push(BUSBUSY | ADRS);
        state.on_interrupt(&mut bus, &slot).unwrap();
        for b in [0x01, 0x02, 0x03] {
            bus.push_byte(BUSBUSY | RXDNE, b);
            state.on_interrupt(&mut bus, &slot).unwrap();
        }

        bus.push(RXNACK | STO);
        let out = state.on_interrupt(&mut bus, &slot).unwrap();
        assert_eq!(out, Outcome::Published(RawReport::new([0x01, 0x02, 0x03])));
        assert_eq!(bus.cleared, [StatusFlags::RXNACK]);
    }

    #[test]
    fn nack_without_stop_does_not_publish() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        receive(&mut state, &mut bus, &slot, &[0x00, 0x01, 0x01]);
        slot.take();

        bus.push(BUSBUSY | RXNACK);
        state.on_interrupt(&mut bus, &slot).unwrap();
        assert!(slot.peek().is_zero());
    }

    #[test]
    fn unknown_flags_are_a_desync() {
        let mut state = TransactionState::new();
        let mut bus = FakeBus::default();
        let slot = ReportSlot::new();

        bus.push(BUSBUSY | BUSERR);
        let err = state.on_interrupt(&mut bus, &slot).unwrap_err();
        assert_eq!(err, Error::Desync(StatusFlags::from_bits(BUSBUSY | BUSERR)));
        assert!(bus.sent.is_empty());
        assert!(bus.cleared.is_empty());
    }
}
