//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the transceiver hardware.
//! Expander addresses, relay bit assignments, tone timing and startup
//! defaults are centralized here.

use crate::types::{Band, Frequency, Mode, TuningStep};

/// I2C bus frequency for the relay expanders
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// Band relay expander I2C address
pub const BAND_EXPANDER_ADDR: u8 = 0x20;

/// Filter relay expander I2C address
pub const FILTER_EXPANDER_ADDR: u8 = 0x21;

/// Default startup frequency (40m band)
pub const DEFAULT_FREQUENCY_HZ: u32 = 7_074_000;

/// Default operating mode (the startup band's usual sideband)
pub const DEFAULT_MODE: Mode = DEFAULT_BAND.default_mode();

/// Default band
pub const DEFAULT_BAND: Band = Band::M40;

/// Default tuning step
pub const DEFAULT_TUNING_STEP: TuningStep = TuningStep::Hz100;

/// Band expander bit assignments
pub mod band_bits {
    //! Output lines of the band relay expander

    /// 80m relay (B1)
    pub const B80: u8 = 6;

    /// 40m relay (B2)
    pub const B40: u8 = 3;

    /// 20m relay (B3)
    pub const B20: u8 = 2;

    /// 15m relay (B4)
    pub const B15: u8 = 1;

    /// 10m relay (B5)
    pub const B10: u8 = 0;

    /// TX relay enable
    pub const TX: u8 = 5;

    /// CW / microphone select (high mutes the microphone)
    pub const CW_MIC: u8 = 4;

    /// All band relay lines, cleared as a group before any assert
    pub const RELAYS: [u8; 5] = [B80, B40, B20, B15, B10];
}

/// Filter expander bit assignments
pub mod filter_bits {
    //! Output lines of the filter relay expander

    /// Not-SSB select (high for any narrow filter)
    pub const NOT_SSB: u8 = 0;

    /// CW filter select
    pub const CW: u8 = 1;

    /// Digital filter select
    pub const DIG: u8 = 2;

    /// Receive attenuator
    pub const ATT: u8 = 3;

    /// Filter select lines, cleared as a group before any assert
    pub const SELECT: [u8; 3] = [NOT_SSB, CW, DIG];
}

/// CW tone generation parameters
pub mod tone {
    //! PWM and tick timing for the shaped CW tone

    /// Sidetone frequency in Hz
    pub const SIDETONE_HZ: u32 = 700;

    /// Samples per sustain cycle
    pub const SAMPLES_PER_CYCLE: u32 = 16;

    /// Tick period in microseconds: 1 / (700 Hz * 16) ≈ 89 µs
    pub const TICK_PERIOD_US: u32 = 1_000_000 / (SIDETONE_HZ * SAMPLES_PER_CYCLE);

    /// PWM wrap (counter top), giving 1024 duty levels
    pub const PWM_WRAP: u16 = 1023;

    /// Mid-rail duty level (silence)
    pub const PWM_MID_RAIL: u16 = 512;

    /// Attenuation divisor applied to table samples around mid-rail
    pub const ATTENUATION: i32 = 8;
}

/// Frequency plan of the synthesizer collaborator
pub mod synth {
    //! VFO/BFO constants

    /// Centre of the CW crystal filter passband in Hz
    pub const CW_FILTER_CENTRE_HZ: u32 = 11_057_200;

    /// BFO frequency for LSB
    pub const BFO_LSB_HZ: u32 = 11_056_600;

    /// BFO frequency for USB
    pub const BFO_USB_HZ: u32 = 11_059_300;

    /// BFO frequency for CW (lower)
    pub const BFO_CWL_HZ: u32 = 11_056_500;

    /// BFO frequency for CW (upper)
    pub const BFO_CWU_HZ: u32 = 11_057_900;

    /// BFO frequency for digital (lower)
    pub const BFO_DIGL_HZ: u32 = 11_056_700;

    /// BFO frequency for digital (upper)
    pub const BFO_DIGU_HZ: u32 = 11_060_500;
}

/// Radio constructor parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadioConfig {
    /// Startup frequency
    pub frequency: Frequency,
    /// Startup tuning step
    pub tuning_step: TuningStep,
    /// Startup mode
    pub mode: Mode,
    /// Startup band (applied to the relays by `Radio::init`)
    pub band: Band,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::from_hz(DEFAULT_FREQUENCY_HZ),
            tuning_step: DEFAULT_TUNING_STEP,
            mode: DEFAULT_MODE,
            band: DEFAULT_BAND,
        }
    }
}
