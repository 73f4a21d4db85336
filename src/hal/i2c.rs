//! I2C Bus Helpers
//!
//! Address type and a bus scan diagnostic over the blocking
//! `embedded-hal` I2C trait. The relay expanders are only ever touched from
//! the main loop, so the blocking API is used throughout.

use embedded_hal::i2c::I2c;

use crate::config::{BAND_EXPANDER_ADDR, FILTER_EXPANDER_ADDR};

/// I2C device address wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// Band relay expander address
    pub const BAND_EXPANDER: Self = Self(BAND_EXPANDER_ADDR);

    /// Filter relay expander address
    pub const FILTER_EXPANDER: Self = Self(FILTER_EXPANDER_ADDR);

    /// Create from 7-bit address
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// Check whether a device acknowledges its address
///
/// Issues an address-only write, the same transaction an expander probe
/// uses.
pub fn is_present<I: I2c>(bus: &mut I, addr: I2cAddress) -> bool {
    bus.write(addr.addr(), &[]).is_ok()
}

/// Scan the I2C bus for devices
///
/// Reports at most 16 responders, which is more than this board carries.
pub fn scan<I: I2c>(bus: &mut I) -> heapless::Vec<I2cAddress, 16> {
    let mut devices = heapless::Vec::new();

    for addr in 0x08..0x78 {
        let addr = I2cAddress::new(addr);
        if is_present(bus, addr) && devices.push(addr).is_err() {
            break;
        }
    }

    devices
}
