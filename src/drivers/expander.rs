//! Relay Expander Driver
//!
//! Two TCA9534-class 8-bit I2C port expanders drive the band relays and the
//! filter relays. Only a small slice of the device is used: every line is
//! configured as an output with normal polarity, then single lines are set
//! or cleared with read-modify-write cycles on the output register.
//!
//! A device that fails its startup probe is marked unreachable for the life
//! of the process (the board has no hot-plug). Writes to it become no-ops
//! so callers can keep tracking state in software.

use embedded_hal::i2c::I2c;

use crate::hal::i2c::I2cAddress;

/// TCA9534 register addresses
mod reg {
    pub const INPUT_PORT: u8 = 0;
    pub const OUTPUT_PORT: u8 = 1;
    pub const POLARITY: u8 = 2;
    pub const CONFIG: u8 = 3;
}

/// Configuration register value with every line an output
const ALL_OUTPUTS: u8 = 0x00;

/// Polarity register value with no inversion
const NORMAL_POLARITY: u8 = 0x00;

/// Output register value with every line low
const ALL_LOW: u8 = 0x00;

/// Expander on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expander {
    /// Band relays, TX relay and CW/MIC select
    Band,
    /// Filter relays and attenuator
    Filter,
}

impl Expander {
    /// Bus address of this device
    #[must_use]
    pub const fn address(self) -> I2cAddress {
        match self {
            Self::Band => I2cAddress::BAND_EXPANDER,
            Self::Filter => I2cAddress::FILTER_EXPANDER,
        }
    }
}

impl core::fmt::Display for Expander {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Band => f.write_str("band"),
            Self::Filter => f.write_str("filter"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Expander {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Band => defmt::write!(f, "band"),
            Self::Filter => defmt::write!(f, "filter"),
        }
    }
}

/// Output line level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Line driven low (relay released)
    Low,
    /// Line driven high (relay energised)
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Result of a startup probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Device acknowledged its address
    Ok,
    /// Device did not respond; writes to it are now no-ops
    Unreachable,
}

/// Output latch and input port read back from one expander
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortSnapshot {
    /// Output register
    pub output: u8,
    /// Input port (pin levels)
    pub input: u8,
}

#[cfg(feature = "embedded")]
impl defmt::Format for PortSnapshot {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "out={=u8:#x} in={=u8:#x}", self.output, self.input);
    }
}

/// Sticky per-device "unreachable" flags
///
/// Set during startup probing and never cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HardwareErrorFlags {
    band_unreachable: bool,
    filter_unreachable: bool,
}

impl HardwareErrorFlags {
    /// Whether a device has been marked unreachable
    #[must_use]
    pub const fn is_unreachable(&self, device: Expander) -> bool {
        match device {
            Expander::Band => self.band_unreachable,
            Expander::Filter => self.filter_unreachable,
        }
    }

    /// Band expander failed its probe
    #[must_use]
    pub const fn band(&self) -> bool {
        self.band_unreachable
    }

    /// Filter expander failed its probe
    #[must_use]
    pub const fn filter(&self) -> bool {
        self.filter_unreachable
    }

    fn mark(&mut self, device: Expander) {
        match device {
            Expander::Band => self.band_unreachable = true,
            Expander::Filter => self.filter_unreachable = true,
        }
    }
}

/// Driver for both relay expanders on one I2C bus
pub struct OutputDriver<I2C> {
    bus: I2C,
    flags: HardwareErrorFlags,
}

impl<I2C: I2c> OutputDriver<I2C> {
    /// Take ownership of the bus; both devices start out presumed reachable
    pub fn new(bus: I2C) -> Self {
        Self {
            bus,
            flags: HardwareErrorFlags::default(),
        }
    }

    /// Probe a device with an address-only write
    ///
    /// A failure is permanent. A device already marked unreachable is not
    /// probed again.
    pub fn probe(&mut self, device: Expander) -> ProbeStatus {
        if self.flags.is_unreachable(device) {
            return ProbeStatus::Unreachable;
        }
        if self.bus.write(device.address().addr(), &[]).is_ok() {
            debug!("{} expander found at {}", device, device.address());
            ProbeStatus::Ok
        } else {
            self.flags.mark(device);
            warn!("{} expander not responding at {}", device, device.address());
            ProbeStatus::Unreachable
        }
    }

    /// Whether writes to a device reach the hardware
    #[must_use]
    pub const fn is_reachable(&self, device: Expander) -> bool {
        !self.flags.is_unreachable(device)
    }

    /// Sticky error flags
    #[must_use]
    pub const fn flags(&self) -> HardwareErrorFlags {
        self.flags
    }

    /// Configure every line as a normal-polarity output, driven low
    ///
    /// The output latch powers up all ones, so it is cleared before the
    /// output drivers are enabled; no relay line is ever driven high here.
    pub fn configure_outputs(&mut self, device: Expander) -> Result<(), I2C::Error> {
        if !self.is_reachable(device) {
            return Ok(());
        }
        self.write_byte(device, ALL_LOW)?;
        self.write_reg(device, reg::POLARITY, NORMAL_POLARITY)?;
        self.write_reg(device, reg::CONFIG, ALL_OUTPUTS)
    }

    /// Drive one output line (read-modify-write of the output register)
    pub fn write_bit(&mut self, device: Expander, bit: u8, level: Level) -> Result<(), I2C::Error> {
        if !self.is_reachable(device) {
            return Ok(());
        }
        let mask = 1u8 << (bit & 0x07);
        let current = self.read_reg(device, reg::OUTPUT_PORT)?;
        let next = match level {
            Level::High => current | mask,
            Level::Low => current & !mask,
        };
        self.write_reg(device, reg::OUTPUT_PORT, next)
    }

    /// Drive all eight output lines at once
    pub fn write_byte(&mut self, device: Expander, value: u8) -> Result<(), I2C::Error> {
        if !self.is_reachable(device) {
            return Ok(());
        }
        self.write_reg(device, reg::OUTPUT_PORT, value)
    }

    /// Read back the output register (`None` if the device is unreachable)
    pub fn read_output(&mut self, device: Expander) -> Result<Option<u8>, I2C::Error> {
        if !self.is_reachable(device) {
            return Ok(None);
        }
        self.read_reg(device, reg::OUTPUT_PORT).map(Some)
    }

    /// Read the input port (`None` if the device is unreachable)
    pub fn read_input(&mut self, device: Expander) -> Result<Option<u8>, I2C::Error> {
        if !self.is_reachable(device) {
            return Ok(None);
        }
        self.read_reg(device, reg::INPUT_PORT).map(Some)
    }

    fn write_reg(&mut self, device: Expander, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.bus.write(device.address().addr(), &[reg, value])
    }

    fn read_reg(&mut self, device: Expander, reg: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8];
        self.bus.write_read(device.address().addr(), &[reg], &mut buf)?;
        Ok(buf[0])
    }
}
