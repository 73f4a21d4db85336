//! Shared types used across the transceiver firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

use crate::config::{band_bits, filter_bits, synth};

/// Frequency in Hertz
///
/// Unlike a band-limited type this accepts any value: whether a frequency is
/// usable is the synthesizer's decision (see [`crate::radio::synth`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Frequency(u32);

impl Frequency {
    /// Create a new Frequency from Hz
    #[must_use]
    pub const fn from_hz(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        self.0
    }

    /// Offset by a signed number of Hz, saturating at 0 and `u32::MAX`
    #[must_use]
    pub fn offset(self, delta_hz: i64) -> Self {
        let hz = i64::from(self.0).saturating_add(delta_hz).max(0);
        Self(u32::try_from(hz).unwrap_or(u32::MAX))
    }

    /// Tune by a number of encoder steps of the given size
    #[must_use]
    pub fn tune(self, steps: i32, step: TuningStep) -> Self {
        self.offset(i64::from(steps) * i64::from(step.as_hz()))
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} Hz", self.0);
    }
}

/// Tuning step size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TuningStep {
    /// 1 Hz step
    Hz1,
    /// 10 Hz step
    Hz10,
    /// 100 Hz step
    Hz100,
    /// 1 kHz step
    KHz1,
    /// 10 kHz step
    KHz10,
    /// 100 kHz step
    KHz100,
}

impl TuningStep {
    /// Get the step size in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        match self {
            Self::Hz1 => 1,
            Self::Hz10 => 10,
            Self::Hz100 => 100,
            Self::KHz1 => 1_000,
            Self::KHz10 => 10_000,
            Self::KHz100 => 100_000,
        }
    }

    /// Cycle to next larger step
    #[must_use]
    pub const fn next_larger(self) -> Self {
        match self {
            Self::Hz1 => Self::Hz10,
            Self::Hz10 => Self::Hz100,
            Self::Hz100 => Self::KHz1,
            Self::KHz1 => Self::KHz10,
            Self::KHz10 => Self::KHz100,
            Self::KHz100 => Self::Hz1, // Wrap around
        }
    }

    /// Cycle to next smaller step
    #[must_use]
    pub const fn next_smaller(self) -> Self {
        match self {
            Self::Hz1 => Self::KHz100, // Wrap around
            Self::Hz10 => Self::Hz1,
            Self::Hz100 => Self::Hz10,
            Self::KHz1 => Self::Hz100,
            Self::KHz10 => Self::KHz1,
            Self::KHz100 => Self::KHz10,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TuningStep {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} Hz", self.as_hz());
    }
}

/// Operating mode for the radio
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// Lower Sideband
    #[default]
    Lsb,
    /// Upper Sideband
    Usb,
    /// CW, lower sideband BFO
    CwLower,
    /// CW, upper sideband BFO
    CwUpper,
    /// Digital modes, lower sideband
    DigitalLower,
    /// Digital modes, upper sideband
    DigitalUpper,
}

impl Mode {
    /// Get the IF filter this mode needs
    #[must_use]
    pub const fn filter(self) -> Filter {
        match self {
            Self::Lsb | Self::Usb => Filter::Ssb,
            Self::CwLower | Self::CwUpper => Filter::Cw,
            Self::DigitalLower | Self::DigitalUpper => Filter::Digital,
        }
    }

    /// Check if this is a CW mode
    #[must_use]
    pub const fn is_cw(self) -> bool {
        matches!(self, Self::CwLower | Self::CwUpper)
    }

    /// Get the BFO frequency for this mode
    #[must_use]
    pub const fn bfo_hz(self) -> u32 {
        match self {
            Self::Lsb => synth::BFO_LSB_HZ,
            Self::Usb => synth::BFO_USB_HZ,
            Self::CwLower => synth::BFO_CWL_HZ,
            Self::CwUpper => synth::BFO_CWU_HZ,
            Self::DigitalLower => synth::BFO_DIGL_HZ,
            Self::DigitalUpper => synth::BFO_DIGU_HZ,
        }
    }

    /// Cycle to the next mode
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Lsb => Self::Usb,
            Self::Usb => Self::CwLower,
            Self::CwLower => Self::CwUpper,
            Self::CwUpper => Self::DigitalLower,
            Self::DigitalLower => Self::DigitalUpper,
            Self::DigitalUpper => Self::Lsb,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Lsb => "LSB",
            Self::Usb => "USB",
            Self::CwLower => "CWL",
            Self::CwUpper => "CWU",
            Self::DigitalLower => "DIGL",
            Self::DigitalUpper => "DIGU",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Mode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.label());
    }
}

/// Amateur radio band served by a relay on the band expander
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// 80 meters (3.5 - 3.8 MHz)
    M80,
    /// 40 meters (7.0 - 7.3 MHz)
    M40,
    /// 20 meters (14.0 - 14.35 MHz)
    M20,
    /// 15 meters (21.0 - 21.45 MHz)
    M15,
    /// 10 meters (28.0 - 29.7 MHz)
    M10,
}

impl Band {
    /// Number of bands
    pub const COUNT: usize = 5;

    /// All bands, lowest frequency first
    pub const ALL: [Self; Self::COUNT] = [Self::M80, Self::M40, Self::M20, Self::M15, Self::M10];

    /// Get the band containing a frequency (band edges inclusive)
    #[must_use]
    pub fn from_frequency(freq: Frequency) -> Option<Self> {
        let hz = freq.as_hz();
        Self::ALL
            .into_iter()
            .find(|band| hz >= band.start_hz() && hz <= band.end_hz())
    }

    /// Get the table index for this band (0-4)
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::M80 => 0,
            Self::M40 => 1,
            Self::M20 => 2,
            Self::M15 => 3,
            Self::M10 => 4,
        }
    }

    /// Get the band start frequency
    #[must_use]
    pub const fn start_hz(self) -> u32 {
        match self {
            Self::M80 => 3_500_000,
            Self::M40 => 7_000_000,
            Self::M20 => 14_000_000,
            Self::M15 => 21_000_000,
            Self::M10 => 28_000_000,
        }
    }

    /// Get the band end frequency
    #[must_use]
    pub const fn end_hz(self) -> u32 {
        match self {
            Self::M80 => 3_800_000,
            Self::M40 => 7_300_000,
            Self::M20 => 14_350_000,
            Self::M15 => 21_450_000,
            Self::M10 => 29_700_000,
        }
    }

    /// Get the wavelength in meters
    #[must_use]
    pub const fn wavelength_m(self) -> u8 {
        match self {
            Self::M80 => 80,
            Self::M40 => 40,
            Self::M20 => 20,
            Self::M15 => 15,
            Self::M10 => 10,
        }
    }

    /// Get the band expander line driving this band's relay
    #[must_use]
    pub const fn relay_bit(self) -> u8 {
        match self {
            Self::M80 => band_bits::B80,
            Self::M40 => band_bits::B40,
            Self::M20 => band_bits::B20,
            Self::M15 => band_bits::B15,
            Self::M10 => band_bits::B10,
        }
    }

    /// Get the default mode for this band
    #[must_use]
    pub const fn default_mode(self) -> Mode {
        match self {
            Self::M80 | Self::M40 => Mode::Lsb,
            Self::M20 | Self::M15 | Self::M10 => Mode::Usb,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.wavelength_m())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Band {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}m", self.wavelength_m());
    }
}

/// IF filter selection on the filter expander
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Filter {
    /// Wide SSB filter (all select lines low)
    #[default]
    Ssb,
    /// Narrow CW filter
    Cw,
    /// Digital modes filter
    Digital,
}

impl Filter {
    /// Select lines driven high for this filter
    ///
    /// The encoding is not one-hot: both narrow filters raise `NOT_SSB`
    /// alongside their own line, and SSB is every line low.
    #[must_use]
    pub const fn select_bits(self) -> &'static [u8] {
        match self {
            Self::Ssb => &[],
            Self::Cw => &[filter_bits::NOT_SSB, filter_bits::CW],
            Self::Digital => &[filter_bits::NOT_SSB, filter_bits::DIG],
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Ssb => "SSB",
            Self::Cw => "CW",
            Self::Digital => "DIG",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Filter {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.label());
    }
}

/// Transmit/Receive state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TxRxState {
    /// Receiving
    #[default]
    Rx,
    /// Transmitting
    Tx,
}

impl fmt::Display for TxRxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx => f.write_str("RX"),
            Self::Tx => f.write_str("TX"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxRxState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Rx => defmt::write!(f, "RX"),
            Self::Tx => defmt::write!(f, "TX"),
        }
    }
}
