//! Memory-mapped register access for the HT32F165x peripherals used here.

use core::ptr;

// Peripheral base addresses
pub(crate) const I2C0_BASE: usize = 0x4004_8000;
pub(crate) const I2C1_BASE: usize = 0x4004_9000;
pub(crate) const AFIO_BASE: usize = 0x4002_2000;
pub(crate) const GPIOA_BASE: usize = 0x4001_A000;
pub(crate) const GPIOB_BASE: usize = 0x4001_B000;
pub(crate) const GPIOC_BASE: usize = 0x4001_C000;
pub(crate) const GPIOD_BASE: usize = 0x4001_D000;
pub(crate) const CKCU_BASE: usize = 0x4008_8000;
pub(crate) const RSTCU_BASE: usize = 0x4008_8100;

pub(crate) mod i2c {
    pub const CR: usize = 0x00;
    pub const IER: usize = 0x04;
    pub const ADDR: usize = 0x08;
    pub const SR: usize = 0x0C;
    pub const SHPGR: usize = 0x10;
    pub const SLPGR: usize = 0x14;
    pub const DR: usize = 0x18;

    pub const CR_AA: u32 = 1 << 0;
    pub const CR_I2CEN: u32 = 1 << 3;

    pub const IER_STOIE: u32 = 1 << 1;
    pub const IER_ADRSIE: u32 = 1 << 2;
    pub const IER_RXNACKIE: u32 = 1 << 9;
    pub const IER_BUSERRIE: u32 = 1 << 10;
    pub const IER_RXDNEIE: u32 = 1 << 16;
    pub const IER_TXDEIE: u32 = 1 << 17;
}

pub(crate) mod gpio {
    pub const DIRCR: usize = 0x00;
    pub const INER: usize = 0x04;
    pub const PUR: usize = 0x08;
    pub const PDR: usize = 0x0C;
    pub const ODR: usize = 0x10;
    pub const SRR: usize = 0x24;
    pub const RR: usize = 0x28;
}

pub(crate) mod afio {
    /// Offset of GPACFGR0; each port has two 4-bit-per-pin registers.
    pub const GPCFGR: usize = 0x08;
    /// Alternate function number of the I²C pins.
    pub const AF_I2C: u32 = 7;
}

pub(crate) mod ckcu {
    pub const APBCCR0: usize = 0x2C;

    pub const I2C0EN: u32 = 1 << 0;
    pub const I2C1EN: u32 = 1 << 1;
    pub const AFIOEN: u32 = 1 << 14;
    /// GPIO port A enable; ports B..D follow.
    pub const PAEN: u32 = 1 << 16;
}

pub(crate) mod rstcu {
    pub const APBPRSTR0: usize = 0x08;

    pub const I2C0RST: u32 = 1 << 0;
    pub const I2C1RST: u32 = 1 << 1;
}

/// One 32-bit peripheral register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Reg(usize);

impl Reg {
    pub(crate) const fn at(base: usize, offset: usize) -> Self {
        Self(base + offset)
    }

    pub(crate) fn read(self) -> u32 {
        // SAFETY: only built from the fixed peripheral addresses above.
        unsafe { ptr::read_volatile(self.0 as *const u32) }
    }

    pub(crate) fn write(self, value: u32) {
        // SAFETY: see `read`.
        unsafe { ptr::write_volatile(self.0 as *mut u32, value) }
    }

    pub(crate) fn modify(self, f: impl FnOnce(u32) -> u32) {
        self.write(f(self.read()));
    }

    pub(crate) fn set_bits(self, mask: u32) {
        self.modify(|v| v | mask);
    }

    pub(crate) fn clear_bits(self, mask: u32) {
        self.modify(|v| v & !mask);
    }
}
