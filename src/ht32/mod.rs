//! HT32F165x bring-up: clocks, pins, the I²C slave and its interrupt.
//!
//! Register-level on purpose; there is no HAL for this part. Only the
//! pieces the trackpoint needs are covered.

pub mod gpio;
pub mod i2c;
mod regs;

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;
use embedded_hal::delay::DelayNs;

use crate::config::{I2cUnit, TrackpointConfig, INIT_PULSE_US};
use crate::error::Error;
use crate::request::RequestLine;

pub use gpio::{Line, OutputMode, Port};
pub use i2c::I2cBus;

use regs::{ckcu, Reg};

/// AHB clock the I²C timing is derived from.
pub const AHB_HZ: u32 = 48_000_000;

/// Implemented NVIC priority bits.
const NVIC_PRIO_BITS: u8 = 4;

/// HT32F165x interrupt number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Irq(u16);

impl Irq {
    pub const I2C0: Self = Self(43);
    pub const I2C1: Self = Self(44);

    pub const fn for_unit(unit: I2cUnit) -> Self {
        match unit {
            I2cUnit::I2c0 => Self::I2C0,
            I2cUnit::I2c1 => Self::I2C1,
        }
    }
}

// SAFETY: both numbers are valid HT32F165x interrupt lines.
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0
    }
}

/// Busy-wait delay counted in core cycles.
#[derive(Clone, Copy, Debug)]
pub struct CycleDelay {
    cpu_hz: u32,
}

impl CycleDelay {
    pub const fn new(cpu_hz: u32) -> Self {
        Self { cpu_hz }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.cpu_hz as u64).div_ceil(1_000_000_000);
        cortex_m::asm::delay(cycles.min(u32::MAX as u64) as u32);
    }

    fn delay_us(&mut self, us: u32) {
        let cycles = us as u64 * (self.cpu_hz / 1_000_000) as u64;
        cortex_m::asm::delay(cycles.min(u32::MAX as u64) as u32);
    }
}

/// Supported boards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Board {
    /// Yoda II keyboard: I2C1 on PC9/PC10, request on PC11, power on PA10.
    YodaII,
    /// HT32 test board: I2C0 on PB0/PB1, request on PA15.
    TestBoard,
}

impl Board {
    pub const fn config(self) -> TrackpointConfig {
        match self {
            Board::YodaII => TrackpointConfig::YODA_II,
            Board::TestBoard => TrackpointConfig::HT32_TEST,
        }
    }

    pub const fn request_line(self) -> Line {
        match self {
            Board::YodaII => Line::new(Port::C, 11),
            Board::TestBoard => Line::new(Port::A, 15),
        }
    }

    /// Trackpoint power switch (active low).
    pub const fn power_line(self) -> Option<Line> {
        match self {
            Board::YodaII => Some(Line::new(Port::A, 10)),
            Board::TestBoard => None,
        }
    }

    /// LED used to show a bus fault.
    pub const fn fault_led(self) -> Option<Line> {
        match self {
            Board::YodaII => None,
            Board::TestBoard => Some(Line::new(Port::A, 14)),
        }
    }

    /// SCL and SDA.
    const fn i2c_lines(self) -> [Line; 2] {
        match self {
            Board::YodaII => [Line::new(Port::C, 9), Line::new(Port::C, 10)],
            Board::TestBoard => [Line::new(Port::B, 0), Line::new(Port::B, 1)],
        }
    }
}

/// Everything the firmware keeps after [`init`]. The ISR rebuilds its
/// own handles from [`Board`].
pub struct Hardware {
    pub request: RequestLine<Line, CycleDelay>,
}

fn enable_port_clocks() {
    let ports = (0..4).fold(0, |acc, i| acc | ckcu::PAEN << i);
    Reg::at(regs::CKCU_BASE, ckcu::APBCCR0).set_bits(ckcu::AFIOEN | ports);
}

/// Bring up the trackpoint interface for `board`.
///
/// On return the I²C vector is live and the trackpoint is powered; the
/// caller starts requesting reports.
pub fn init(board: Board, nvic: &mut NVIC) -> Result<Hardware, Error> {
    let config = board.config();
    let unit = config.unit;

    enable_port_clocks();
    I2cBus::power_up(unit);

    let request_pin = board.request_line();
    let mut request = RequestLine::new(request_pin, CycleDelay::new(AHB_HZ));
    match board {
        Board::YodaII => {
            // Hold the trackpoint off until the bus is ready.
            if let Some(power) = board.power_line() {
                power.set();
                power.set_output_mode(OutputMode {
                    input_enable: true,
                    ..OutputMode::OPEN_DRAIN
                });
            }
            for line in board.i2c_lines() {
                line.set_i2c_function();
            }
            request.release()?;
            request_pin.set_output_mode(OutputMode {
                open_drain: true,
                pull_up: true,
                input_enable: true,
            });
        }
        Board::TestBoard => {
            for line in board.i2c_lines() {
                line.set_i2c_function();
            }
            request_pin.set_output_mode(OutputMode {
                pull_up: true,
                ..OutputMode::OPEN_DRAIN
            });
        }
    }

    if let Some(led) = board.fault_led() {
        led.clear();
        led.set_output_mode(OutputMode {
            open_drain: false,
            pull_up: false,
            input_enable: false,
        });
    }

    let mut bus = I2cBus::new(unit);
    bus.configure_slave(&config, AHB_HZ);

    let irq = Irq::for_unit(unit);
    // SAFETY: the handler only touches state that is const-initialised.
    unsafe {
        nvic.set_priority(irq, config.irq_priority << (8 - NVIC_PRIO_BITS));
        NVIC::unmask(irq);
    }

    match board {
        Board::TestBoard => request.pulse(INIT_PULSE_US)?,
        Board::YodaII => {
            if let Some(power) = board.power_line() {
                power.clear();
            }
        }
    }

    info!(
        "trackpoint on {} at {:#x}, irq {}",
        board,
        config.own_address,
        irq.number()
    );

    Ok(Hardware { request })
}
