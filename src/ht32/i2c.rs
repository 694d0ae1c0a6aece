//! HT32 I²C controller in slave mode.

use super::regs::{self, ckcu, i2c, rstcu, Reg};
use crate::config::{scl_period_counts, I2cUnit, TrackpointConfig};
use crate::status::StatusFlags;
use crate::transaction::BusController;

/// Interrupts the transaction state machine handles.
const SLAVE_IRQS: u32 = i2c::IER_TXDEIE
    | i2c::IER_RXDNEIE
    | i2c::IER_BUSERRIE
    | i2c::IER_RXNACKIE
    | i2c::IER_ADRSIE
    | i2c::IER_STOIE;

/// Register handle for one I²C unit. Holds no state, so the ISR can make
/// its own.
pub struct I2cBus {
    base: usize,
}

impl I2cBus {
    pub const fn new(unit: I2cUnit) -> Self {
        let base = match unit {
            I2cUnit::I2c0 => regs::I2C0_BASE,
            I2cUnit::I2c1 => regs::I2C1_BASE,
        };
        Self { base }
    }

    fn reg(&self, offset: usize) -> Reg {
        Reg::at(self.base, offset)
    }

    /// Reset the unit and enable its clock.
    pub(crate) fn power_up(unit: I2cUnit) {
        let (rst, en) = match unit {
            I2cUnit::I2c0 => (rstcu::I2C0RST, ckcu::I2C0EN),
            I2cUnit::I2c1 => (rstcu::I2C1RST, ckcu::I2C1EN),
        };
        // The reset bit clears itself once the reset is done.
        Reg::at(regs::RSTCU_BASE, rstcu::APBPRSTR0).set_bits(rst);
        Reg::at(regs::CKCU_BASE, ckcu::APBCCR0).set_bits(en);
    }

    /// Enable the controller as an acknowledging slave and unmask the
    /// interrupts the transaction state machine needs.
    pub(crate) fn configure_slave(&mut self, config: &TrackpointConfig, ahb_hz: u32) {
        let (high, low) = scl_period_counts(ahb_hz, config.bus_hz);

        self.reg(i2c::CR).write(i2c::CR_I2CEN | i2c::CR_AA);
        self.reg(i2c::ADDR).write(config.own_address as u32);
        self.reg(i2c::SHPGR).write(high);
        self.reg(i2c::SLPGR).write(low);
        self.reg(i2c::IER).set_bits(SLAVE_IRQS);
    }
}

impl BusController for I2cBus {
    fn status(&mut self) -> StatusFlags {
        StatusFlags::from_bits(self.reg(i2c::SR).read())
    }

    fn read_data(&mut self) -> u8 {
        self.reg(i2c::DR).read() as u8
    }

    fn write_data(&mut self, byte: u8) {
        self.reg(i2c::DR).write(byte as u32);
    }

    fn clear_status(&mut self, flags: StatusFlags) {
        self.reg(i2c::SR).write(flags.bits());
    }
}
