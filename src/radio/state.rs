//! Radio State
//!
//! Logical state of the transceiver. Transitions are immutable: each
//! `with_*` returns the next state and the radio swaps it in before it
//! touches the hardware, so software state never lags a failed bus write.
//!
//! Band and filter are tracked twice. The *requested* value is what the
//! operator asked for; the *applied* value caches what was last driven onto
//! the relays, and a transition only issues I2C writes when the two differ.
//! The applied value is recorded only once the relay writes went through, so
//! a request that failed on the bus is retried by the next identical one.

use crate::config::RadioConfig;
use crate::types::{Band, Filter, Frequency, Mode, TuningStep, TxRxState};

/// Complete radio state (immutable)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadioState {
    /// Dial frequency
    frequency: Frequency,
    /// Operating mode
    mode: Mode,
    /// Tuning step size
    step: TuningStep,
    /// Requested band
    band: Option<Band>,
    /// Band last driven onto the relays
    applied_band: Option<Band>,
    /// Requested filter
    filter: Option<Filter>,
    /// Filter last driven onto the relays
    applied_filter: Option<Filter>,
    /// TX/RX state
    txrx: TxRxState,
    /// Tuning lock
    locked: bool,
    /// Receive attenuator
    attenuator: bool,
}

impl RadioState {
    /// Create the startup state; band and filter stay unset until applied
    #[must_use]
    pub const fn new(config: &RadioConfig) -> Self {
        Self {
            frequency: config.frequency,
            mode: config.mode,
            step: config.tuning_step,
            band: None,
            applied_band: None,
            filter: None,
            applied_filter: None,
            txrx: TxRxState::Rx,
            locked: false,
            attenuator: false,
        }
    }

    /// Get dial frequency
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Get operating mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Get tuning step
    #[must_use]
    pub const fn step(&self) -> TuningStep {
        self.step
    }

    /// Get requested band
    #[must_use]
    pub const fn band(&self) -> Option<Band> {
        self.band
    }

    /// Get the band the relays were last set to
    #[must_use]
    pub const fn applied_band(&self) -> Option<Band> {
        self.applied_band
    }

    /// Get requested filter
    #[must_use]
    pub const fn filter(&self) -> Option<Filter> {
        self.filter
    }

    /// Get the filter the relays were last set to
    #[must_use]
    pub const fn applied_filter(&self) -> Option<Filter> {
        self.applied_filter
    }

    /// Get TX/RX state
    #[must_use]
    pub const fn txrx(&self) -> TxRxState {
        self.txrx
    }

    /// Check if transmitting
    #[must_use]
    pub const fn is_transmitting(&self) -> bool {
        matches!(self.txrx, TxRxState::Tx)
    }

    /// Check if the tuning lock is on
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Check if attenuator is enabled
    #[must_use]
    pub const fn attenuator_enabled(&self) -> bool {
        self.attenuator
    }

    /// Check whether a band change needs relay writes
    #[must_use]
    pub fn band_pending(&self, band: Band) -> bool {
        self.applied_band != Some(band)
    }

    /// Check whether a filter change needs relay writes
    #[must_use]
    pub fn filter_pending(&self, filter: Filter) -> bool {
        self.applied_filter != Some(filter)
    }

    /// Set frequency (returns new state)
    #[must_use]
    pub const fn with_frequency(self, frequency: Frequency) -> Self {
        Self { frequency, ..self }
    }

    /// Set mode (returns new state)
    #[must_use]
    pub const fn with_mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    /// Set tuning step (returns new state)
    #[must_use]
    pub const fn with_step(self, step: TuningStep) -> Self {
        Self { step, ..self }
    }

    /// Cycle to next larger step (returns new state)
    #[must_use]
    pub const fn next_step(self) -> Self {
        Self {
            step: self.step.next_larger(),
            ..self
        }
    }

    /// Request a band (returns new state)
    #[must_use]
    pub const fn with_band(self, band: Band) -> Self {
        Self {
            band: Some(band),
            ..self
        }
    }

    /// Record the band as driven onto the relays (returns new state)
    #[must_use]
    pub const fn with_applied_band(self, band: Band) -> Self {
        Self {
            applied_band: Some(band),
            ..self
        }
    }

    /// Request a filter (returns new state)
    #[must_use]
    pub const fn with_filter(self, filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..self
        }
    }

    /// Record the filter as driven onto the relays (returns new state)
    #[must_use]
    pub const fn with_applied_filter(self, filter: Filter) -> Self {
        Self {
            applied_filter: Some(filter),
            ..self
        }
    }

    /// Set TX/RX state (returns new state)
    #[must_use]
    pub const fn with_txrx(self, txrx: TxRxState) -> Self {
        Self { txrx, ..self }
    }

    /// Set the tuning lock (returns new state)
    #[must_use]
    pub const fn with_lock(self, locked: bool) -> Self {
        Self { locked, ..self }
    }

    /// Set the attenuator flag (returns new state)
    #[must_use]
    pub const fn with_attenuator(self, attenuator: bool) -> Self {
        Self { attenuator, ..self }
    }
}

impl Default for RadioState {
    fn default() -> Self {
        Self::new(&RadioConfig::default())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Radio({}, {}, {}, band={}, filter={})",
            self.frequency,
            self.mode,
            self.txrx,
            self.band,
            self.filter
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_state_has_nothing_applied() {
        let state = RadioState::default();
        assert_eq!(state.band(), None);
        assert_eq!(state.applied_filter(), None);
        assert!(state.band_pending(Band::M40));
        assert!(!state.is_transmitting());
    }

    #[test]
    fn applied_band_clears_pending() {
        let requested = RadioState::default().with_band(Band::M20);
        assert_eq!(requested.band(), Some(Band::M20));
        assert!(requested.band_pending(Band::M20));

        let state = requested.with_applied_band(Band::M20);
        assert!(!state.band_pending(Band::M20));
        assert!(state.band_pending(Band::M15));
    }
}
