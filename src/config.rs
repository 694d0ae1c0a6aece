//! Protocol constants and per-board configuration.
//!
//! Everything that differs between keyboards (I²C unit, gains, how the
//! trackpoint buttons are wired, what to do on a bus desync) lives in
//! [`TrackpointConfig`], selected once at startup. Fixed protocol values
//! are plain constants.

use crate::report::RawReport;

// Trackpoint protocol

/// Bytes in one motion report.
pub const REPORT_SIZE: usize = 3;

/// Bytes in the command buffer shifted out when the trackpoint reads from us.
pub const TX_BUFFER_SIZE: usize = 4;

/// Fixed command prefix; the fourth byte is the request parameter.
pub const REQUEST_PREFIX: [u8; 3] = [0x7E, 0x44, 0x01];

/// 7-bit slave address the trackpoint writes to.
pub const OWN_ADDRESS: u8 = 0x30;

/// Request line low time (µs) for a normal report request.
pub const REQUEST_PULSE_US: u32 = 100;

/// Request line low time (µs) for the first request after power-up on the
/// test board.
pub const INIT_PULSE_US: u32 = 1000;

// I²C bus

/// Bus clock (Hz).
pub const I2C_BUS_HZ: u32 = 100_000;

/// SCL high / low share of one bus period (percent).
pub const SCL_HIGH_PERCENT: u32 = 40;
pub const SCL_LOW_PERCENT: u32 = 60;

/// Fixed controller overhead (clock cycles) subtracted from each SCL phase.
pub const SCL_COUNT_OFFSET: u32 = 6;

/// SCL high and low period counts for a controller clocked at `ahb_hz`
/// running the bus at `bus_hz`.
pub const fn scl_period_counts(ahb_hz: u32, bus_hz: u32) -> (u32, u32) {
    let per_bit = ahb_hz / bus_hz;
    (
        (per_bit * SCL_HIGH_PERCENT / 100).saturating_sub(SCL_COUNT_OFFSET),
        (per_bit * SCL_LOW_PERCENT / 100).saturating_sub(SCL_COUNT_OFFSET),
    )
}

/// NVIC priority of the I²C vector.
pub const I2C_IRQ_PRIORITY: u8 = 6;

/// I²C controller instance the trackpoint is wired to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cUnit {
    I2c0,
    I2c1,
}

/// Integer gain `numerator / denominator` applied to accumulated deltas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gain {
    pub numerator: i32,
    pub denominator: i32,
}

impl Gain {
    pub const UNITY: Self = Self::new(1, 1);

    /// Both terms must be positive; a zero term would divide by zero in
    /// [`scale`](Self::scale) or [`consumed`](Self::consumed).
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        assert!(numerator > 0 && denominator > 0, "gain terms must be positive");
        Self {
            numerator,
            denominator,
        }
    }

    /// Scale a raw value, truncating toward zero.
    pub const fn scale(&self, raw: i16) -> i32 {
        raw as i32 * self.numerator / self.denominator
    }

    /// Raw amount consumed when `scaled` output units are flushed.
    pub const fn consumed(&self, scaled: i32) -> i32 {
        scaled * self.denominator / self.numerator
    }
}

/// How the trackpoint buttons reach the firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonMap {
    /// Bits 5/7/6 of a matrix row are buttons 1/2/3; the trackpoint's
    /// Z-tap bit is OR'd into button 1.
    RowHighBits { row: u8 },
    /// Masked low bits of a matrix row are the button byte.
    RowLowBits { row: u8, mask: u8 },
}

impl ButtonMap {
    /// Matrix row that carries the buttons.
    pub const fn row(&self) -> u8 {
        match *self {
            ButtonMap::RowHighBits { row } | ButtonMap::RowLowBits { row, .. } => row,
        }
    }

    /// Mouse button bits from a matrix row and the latest raw report.
    pub const fn buttons(&self, row_bits: u8, raw: &RawReport) -> u8 {
        match *self {
            ButtonMap::RowHighBits { .. } => {
                let btn1 = (row_bits >> 5) & 1;
                let btn2 = (row_bits >> 7) & 1;
                let btn3 = (row_bits >> 6) & 1;
                btn1 | btn2 << 1 | btn3 << 2 | raw.tap()
            }
            ButtonMap::RowLowBits { mask, .. } => row_bits & mask,
        }
    }
}

/// Reaction to a status flag combination the state machine doesn't know.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultPolicy {
    /// Return from the ISR; the next request resynchronises the bus.
    Ignore,
    /// Raise the fault indicator and stop, so the bus state can be inspected.
    Halt,
}

/// Per-board trackpoint configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackpointConfig {
    pub unit: I2cUnit,
    pub own_address: u8,
    pub motion_gain: Gain,
    pub scroll_gain: Gain,
    pub buttons: ButtonMap,
    pub fault_policy: FaultPolicy,
    pub request_pulse_us: u32,
    pub irq_priority: u8,
    pub bus_hz: u32,
}

impl TrackpointConfig {
    /// Yoda II keyboard.
    pub const YODA_II: Self = Self {
        unit: I2cUnit::I2c1,
        own_address: OWN_ADDRESS,
        motion_gain: Gain::new(1, 3),
        scroll_gain: Gain::new(1, 30),
        buttons: ButtonMap::RowHighBits { row: 8 },
        fault_policy: FaultPolicy::Ignore,
        request_pulse_us: REQUEST_PULSE_US,
        irq_priority: I2C_IRQ_PRIORITY,
        bus_hz: I2C_BUS_HZ,
    };

    /// HT32 bring-up board.
    pub const HT32_TEST: Self = Self {
        unit: I2cUnit::I2c0,
        own_address: OWN_ADDRESS,
        motion_gain: Gain::UNITY,
        scroll_gain: Gain::new(1, 30),
        buttons: ButtonMap::RowLowBits { row: 13, mask: 0x3 },
        fault_policy: FaultPolicy::Halt,
        request_pulse_us: REQUEST_PULSE_US,
        irq_priority: I2C_IRQ_PRIORITY,
        bus_hz: I2C_BUS_HZ,
    };
}

impl Default for TrackpointConfig {
    fn default() -> Self {
        Self::YODA_II
    }
}
