//! GPIO lines.
//!
//! A [`Line`] is just a port and pin number; all state lives in the port
//! registers, so lines are `Copy` and can be rebuilt wherever needed
//! (the ISR rebuilds the fault LED this way).

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use super::regs::{self, afio, gpio, Reg};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
}

impl Port {
    const fn base(self) -> usize {
        match self {
            Port::A => regs::GPIOA_BASE,
            Port::B => regs::GPIOB_BASE,
            Port::C => regs::GPIOC_BASE,
            Port::D => regs::GPIOD_BASE,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    fn reg(self, offset: usize) -> Reg {
        Reg::at(self.base(), offset)
    }
}

/// Electrical configuration of an output line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputMode {
    pub open_drain: bool,
    pub pull_up: bool,
    /// Keep the input buffer on so the line can be read back.
    pub input_enable: bool,
}

impl OutputMode {
    pub const OPEN_DRAIN: Self = Self {
        open_drain: true,
        pull_up: false,
        input_enable: false,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Line {
    port: Port,
    pin: u8,
}

impl Line {
    pub const fn new(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }

    pub const fn port(&self) -> Port {
        self.port
    }

    pub const fn pin(&self) -> u8 {
        self.pin
    }

    const fn mask(&self) -> u32 {
        1 << self.pin
    }

    pub fn set(&self) {
        self.port.reg(gpio::SRR).write(self.mask());
    }

    pub fn clear(&self) {
        self.port.reg(gpio::RR).write(self.mask());
    }

    /// Make the line a GPIO output with the given drive.
    pub fn set_output_mode(&self, mode: OutputMode) {
        let mask = self.mask();
        select(self.port.reg(gpio::ODR), mask, mode.open_drain);
        select(self.port.reg(gpio::PUR), mask, mode.pull_up);
        self.port.reg(gpio::PDR).clear_bits(mask);
        select(self.port.reg(gpio::INER), mask, mode.input_enable);
        self.port.reg(gpio::DIRCR).set_bits(mask);
    }

    /// Hand the line to the I²C controller.
    pub fn set_i2c_function(&self) {
        let reg = Reg::at(
            regs::AFIO_BASE,
            afio::GPCFGR + self.port.index() * 8 + (self.pin as usize / 8) * 4,
        );
        let shift = (self.pin as u32 % 8) * 4;
        reg.modify(|v| (v & !(0xF << shift)) | (afio::AF_I2C << shift));
    }
}

fn select(reg: Reg, mask: u32, on: bool) {
    if on {
        reg.set_bits(mask);
    } else {
        reg.clear_bits(mask);
    }
}

impl ErrorType for Line {
    type Error = Infallible;
}

impl OutputPin for Line {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.clear();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set();
        Ok(())
    }
}
