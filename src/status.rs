//! HT32 I2C status register (`I2C_SR`) flags and bus-event classification.
//!
//! The slave ISR samples the status register once on entry and classifies
//! the masked flag bundle into a [`BusEvent`]. Only the combinations the
//! trackpoint actually produces are recognised; everything else is a
//! protocol desync.

use core::fmt;
use core::ops::{BitAnd, BitOr};

/// Raw bit positions of `I2C_SR`.
pub mod bits {
    pub const STA: u32 = 1 << 0;
    pub const STO: u32 = 1 << 1;
    pub const ADRS: u32 = 1 << 2;
    pub const GCS: u32 = 1 << 3;
    pub const ARBLOS: u32 = 1 << 8;
    pub const RXNACK: u32 = 1 << 9;
    pub const BUSERR: u32 = 1 << 10;
    pub const TOUTF: u32 = 1 << 11;
    pub const RXDNE: u32 = 1 << 16;
    pub const TXDE: u32 = 1 << 17;
    pub const RXBF: u32 = 1 << 18;
    pub const BUSBUSY: u32 = 1 << 19;
    pub const MASTER: u32 = 1 << 20;
    pub const TXNRX: u32 = 1 << 21;
}

use bits::*;

/// Snapshot of the status register.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags(u32);

impl StatusFlags {
    pub const EMPTY: Self = Self(0);
    pub const STO: Self = Self(STO);
    pub const ADRS: Self = Self(ADRS);
    pub const ARBLOS: Self = Self(ARBLOS);
    pub const RXNACK: Self = Self(RXNACK);
    pub const BUSERR: Self = Self(BUSERR);
    pub const TOUTF: Self = Self(TOUTF);
    pub const RXDNE: Self = Self(RXDNE);
    pub const TXDE: Self = Self(TXDE);
    pub const BUSBUSY: Self = Self(BUSBUSY);
    pub const TXNRX: Self = Self(TXNRX);

    /// Flags that take part in event classification.
    pub const EVENT_MASK: Self =
        Self(TXNRX | BUSBUSY | TXDE | RXDNE | BUSERR | RXNACK | ADRS | STO);

    /// Latched error bits that are cleared by writing them back.
    pub const LATCHED_ERRORS: Self = Self(TOUTF | BUSERR | RXNACK | ARBLOS);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether a stop condition was detected.
    pub const fn stop(self) -> bool {
        self.0 & STO != 0
    }
}

impl BitOr for StatusFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for StatusFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusFlags({:#010x})", self.0)
    }
}

/// Bus event decoded from a status snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Master is reading from us and the data register is empty.
    Transmit,
    /// Our address matched on a master write; a new report is starting.
    AddressMatched,
    /// A data byte is waiting, optionally together with the stop condition.
    ByteReceived { stop: bool },
    /// Master did not acknowledge, optionally together with the stop condition.
    NotAcknowledged { stop: bool },
    /// Stop condition on its own interrupt edge.
    Stop,
    /// Any other flag combination.
    Unrecognized(StatusFlags),
}

// Flag bundles the trackpoint produces, after masking.
const TX: u32 = TXNRX | BUSBUSY | TXDE;
const TX_ADDRESSED: u32 = TXNRX | BUSBUSY | TXDE | ADRS;
const RX_ADDRESSED: u32 = BUSBUSY | ADRS;
const RX_BYTE: u32 = BUSBUSY | RXDNE;
const RX_BYTE_STOP: u32 = RXDNE | STO;
const NACK: u32 = BUSBUSY | RXNACK;
const NACK_STOP: u32 = RXNACK | STO;
const STOP: u32 = STO;

impl BusEvent {
    /// Classify a status snapshot. Only [`StatusFlags::EVENT_MASK`] bits are
    /// considered.
    pub fn classify(sr: StatusFlags) -> Self {
        match (sr & StatusFlags::EVENT_MASK).bits() {
            TX_ADDRESSED | TX => BusEvent::Transmit,
            RX_ADDRESSED => BusEvent::AddressMatched,
            RX_BYTE => BusEvent::ByteReceived { stop: false },
            RX_BYTE_STOP => BusEvent::ByteReceived { stop: true },
            NACK => BusEvent::NotAcknowledged { stop: false },
            NACK_STOP => BusEvent::NotAcknowledged { stop: true },
            STOP => BusEvent::Stop,
            _ => BusEvent::Unrecognized(sr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bits::*;
    use super::*;

    fn flags(bits: u32) -> StatusFlags {
        StatusFlags::from_bits(bits)
    }

    #[test]
    fn transmit_with_and_without_address_match() {
        assert_eq!(
            BusEvent::classify(flags(TXNRX | BUSBUSY | TXDE)),
            BusEvent::Transmit
        );
        assert_eq!(
            BusEvent::classify(flags(TXNRX | BUSBUSY | TXDE | ADRS)),
            BusEvent::Transmit
        );
    }

    #[test]
    fn address_match_without_data_starts_receive() {
        assert_eq!(
            BusEvent::classify(flags(BUSBUSY | ADRS)),
            BusEvent::AddressMatched
        );
    }

    #[test]
    fn received_byte_carries_stop() {
        assert_eq!(
            BusEvent::classify(flags(BUSBUSY | RXDNE)),
            BusEvent::ByteReceived { stop: false }
        );
        assert_eq!(
            BusEvent::classify(flags(RXDNE | STO)),
            BusEvent::ByteReceived { stop: true }
        );
    }

    #[test]
    fn nack_carries_stop() {
        assert_eq!(
            BusEvent::classify(flags(BUSBUSY | RXNACK)),
            BusEvent::NotAcknowledged { stop: false }
        );
        assert_eq!(
            BusEvent::classify(flags(RXNACK | STO)),
            BusEvent::NotAcknowledged { stop: true }
        );
    }

    #[test]
    fn bare_stop() {
        assert_eq!(BusEvent::classify(flags(STO)), BusEvent::Stop);
    }

    #[test]
    fn bits_outside_the_mask_are_ignored() {
        // STA, RXBF and MASTER never take part in the decision.
        assert_eq!(
            BusEvent::classify(flags(BUSBUSY | ADRS | STA | RXBF)),
            BusEvent::AddressMatched
        );
        assert_eq!(
            BusEvent::classify(flags(STO | MASTER | GCS)),
            BusEvent::Stop
        );
    }

    #[test]
    fn unknown_combinations_are_reported_with_the_full_snapshot() {
        let sr = flags(BUSBUSY | RXDNE | TXDE | STA);
        assert_eq!(BusEvent::classify(sr), BusEvent::Unrecognized(sr));

        assert_eq!(
            BusEvent::classify(StatusFlags::EMPTY),
            BusEvent::Unrecognized(StatusFlags::EMPTY)
        );

        // Bus error is masked in but never part of a valid bundle.
        let sr = flags(BUSBUSY | BUSERR);
        assert_eq!(BusEvent::classify(sr), BusEvent::Unrecognized(sr));
    }

    #[test]
    fn stop_and_latched_errors() {
        let sr = flags(RXNACK | STO | ARBLOS);
        assert!(sr.stop());
        assert_eq!(
            sr & StatusFlags::LATCHED_ERRORS,
            StatusFlags::RXNACK | StatusFlags::ARBLOS
        );
        assert!(!flags(BUSBUSY | RXDNE).stop());
    }
}
