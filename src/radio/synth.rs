//! Frequency Plan
//!
//! The synthesizer is a collaborator of the radio: the radio hands it a
//! dial frequency and a mode and learns whether that frequency is in one of
//! the transceiver's bands. [`FrequencyPlan`] carries the arithmetic of the
//! board's single-conversion plan:
//!
//! - BFO: fixed per mode, placed on the crystal filter skirt (LSB/USB/DIG)
//!   or beside the CW filter
//! - VFO: dial + BFO, except in CW where dial + CW filter centre puts the
//!   signal in the middle of the narrow passband
//!
//! Programming the clock chip itself happens behind this trait.

use crate::config::synth::CW_FILTER_CENTRE_HZ;
use crate::types::{Band, Frequency, Mode};

/// Synthesizer interface the radio tunes through
pub trait FrequencySynthesizer {
    /// Set mode and dial frequency; `false` if the frequency is out of band
    ///
    /// An out-of-band request leaves the VFO where it was.
    fn set_frequency(&mut self, hz: u32, mode: Mode) -> bool;
}

/// VFO/BFO targets for the current dial frequency and mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyPlan {
    mode: Mode,
    band: Option<Band>,
    dial: Frequency,
    vfo_hz: u32,
    bfo_hz: u32,
}

impl FrequencyPlan {
    /// BFO clock output runs at this multiple of the BFO (quadrature divider)
    pub const BFO_CLOCK_MULTIPLIER: u64 = 4;

    /// Create an untuned plan for a mode
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            band: None,
            dial: Frequency::from_hz(0),
            vfo_hz: 0,
            bfo_hz: mode.bfo_hz(),
        }
    }

    /// Select a mode (updates the BFO immediately)
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.bfo_hz = mode.bfo_hz();
    }

    /// Tune the VFO for a dial frequency in the current mode
    ///
    /// Returns `false` and leaves the VFO untouched when out of band.
    pub fn tune(&mut self, dial: Frequency) -> bool {
        let Some(band) = Band::from_frequency(dial) else {
            return false;
        };
        let offset = if self.mode.is_cw() {
            CW_FILTER_CENTRE_HZ
        } else {
            self.bfo_hz
        };
        self.band = Some(band);
        self.dial = dial;
        self.vfo_hz = dial.as_hz().saturating_add(offset);
        true
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Band of the last accepted dial frequency
    #[must_use]
    pub const fn band(&self) -> Option<Band> {
        self.band
    }

    /// Last accepted dial frequency
    #[must_use]
    pub const fn dial(&self) -> Frequency {
        self.dial
    }

    /// VFO target in Hz (0 until first tuned)
    #[must_use]
    pub const fn vfo_hz(&self) -> u32 {
        self.vfo_hz
    }

    /// BFO target in Hz
    #[must_use]
    pub const fn bfo_hz(&self) -> u32 {
        self.bfo_hz
    }

    /// Clock output frequency feeding the BFO divider
    #[must_use]
    pub const fn bfo_clock_hz(&self) -> u64 {
        self.bfo_hz as u64 * Self::BFO_CLOCK_MULTIPLIER
    }
}

impl Default for FrequencyPlan {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl FrequencySynthesizer for FrequencyPlan {
    fn set_frequency(&mut self, hz: u32, mode: Mode) -> bool {
        self.set_mode(mode);
        self.tune(Frequency::from_hz(hz))
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FrequencyPlan {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Plan({}, vfo={=u32} Hz, bfo={=u32} Hz)",
            self.mode,
            self.vfo_hz,
            self.bfo_hz
        );
    }
}
