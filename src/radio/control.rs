//! Radio Control
//!
//! Main-loop side of the transceiver. [`Radio`] owns the logical state,
//! drives the relay expanders, the status LED and audio mute, keys the
//! sidetone and tunes through the frequency synthesizer collaborator.
//!
//! # Relay ordering
//!
//! Band and filter changes always clear every line of the group with
//! individual writes before the single assert write. A failed clear aborts
//! the change before anything is asserted, so at most one band relay is
//! energised at any point of the write trace.
//!
//! # Degraded mode
//!
//! An expander that failed its startup probe stays unreachable. Operations
//! touching it still update the logical state and return `Ok`; only the bus
//! writes are skipped.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;

use super::state::RadioState;
use super::synth::FrequencySynthesizer;
use crate::config::{band_bits, filter_bits, RadioConfig};
use crate::cw::envelope::Sidetone;
use crate::drivers::encoder::{EncoderCounters, EncoderId};
use crate::drivers::expander::{Expander, Level, OutputDriver, PortSnapshot, ProbeStatus};
use crate::error::{Error, Result};
use crate::hal::gpio::{AudioMute, LedState, StatusLed};
use crate::types::{Band, Filter, Frequency, Mode, TuningStep, TxRxState};

/// Transceiver control core
///
/// - `I2C`: bus shared by both relay expanders
/// - `O`: status LED and audio mute outputs
/// - `S`: frequency synthesizer
/// - `K`: CW sidetone generator
pub struct Radio<'a, I2C, O, S, K> {
    config: RadioConfig,
    state: RadioState,
    io: OutputDriver<I2C>,
    led: StatusLed<O>,
    mute: AudioMute<O>,
    synth: S,
    sidetone: K,
    counters: &'a EncoderCounters,
}

impl<'a, I2C, O, S, K> Radio<'a, I2C, O, S, K>
where
    I2C: I2c,
    O: OutputPin,
    S: FrequencySynthesizer,
    K: Sidetone,
{
    /// Assemble the radio; nothing touches the hardware until [`Self::init`]
    pub fn new(
        config: RadioConfig,
        bus: I2C,
        led: O,
        mute: O,
        synth: S,
        sidetone: K,
        counters: &'a EncoderCounters,
    ) -> Self {
        Self {
            config,
            state: RadioState::new(&config),
            io: OutputDriver::new(bus),
            led: StatusLed::new(led),
            mute: AudioMute::new(mute),
            synth,
            sidetone,
            counters,
        }
    }

    /// Bring the hardware to a known state
    ///
    /// Mutes the audio, probes both expanders, drives every reachable relay
    /// line low, then applies the startup band, the filter for the startup
    /// mode and the startup frequency. An unreachable expander is logged and
    /// left degraded; startup carries on.
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        self.mute_audio()?;
        self.led_off()?;

        for device in [Expander::Band, Expander::Filter] {
            if self.io.probe(device) == ProbeStatus::Ok {
                self.io.configure_outputs(device)?;
            } else {
                error!("{} expander unreachable, relay writes disabled", device);
            }
        }

        self.mute_mic()?;
        self.set_band(self.config.band)?;
        self.set_filter(self.state.mode().filter())?;
        self.attenuator_off()?;
        if !self.retune() {
            warn!("startup frequency {} out of band", self.state.frequency());
        }

        info!(
            "radio ready: {} {} step {} Hz",
            self.state.frequency(),
            self.state.mode(),
            self.state.step().as_hz()
        );
        Ok(())
    }

    // =========================================================================
    // Relays
    // =========================================================================

    /// Switch the band relays
    ///
    /// No-op when `band` is already applied.
    pub fn set_band(&mut self, band: Band) -> Result<(), I2C::Error> {
        self.state = self.state.with_band(band);
        if !self.state.band_pending(band) {
            return Ok(());
        }

        debug!("band -> {}", band);
        for bit in band_bits::RELAYS {
            self.io.write_bit(Expander::Band, bit, Level::Low)?;
        }
        self.io.write_bit(Expander::Band, band.relay_bit(), Level::High)?;

        self.state = self.state.with_applied_band(band);
        Ok(())
    }

    /// Switch the IF filter relays
    ///
    /// No-op when `filter` is already applied.
    pub fn set_filter(&mut self, filter: Filter) -> Result<(), I2C::Error> {
        self.state = self.state.with_filter(filter);
        if !self.state.filter_pending(filter) {
            return Ok(());
        }

        debug!("filter -> {}", filter);
        for bit in filter_bits::SELECT {
            self.io.write_bit(Expander::Filter, bit, Level::Low)?;
        }
        for &bit in filter.select_bits() {
            self.io.write_bit(Expander::Filter, bit, Level::High)?;
        }

        self.state = self.state.with_applied_filter(filter);
        Ok(())
    }

    /// Key the transmitter
    ///
    /// Tuning-encoder suppression takes effect before the relay closes.
    pub fn enable_transmit(&mut self) -> Result<(), I2C::Error> {
        self.state = self.state.with_txrx(TxRxState::Tx);
        self.counters.set_transmitting(true);
        info!("TX");
        self.io.write_bit(Expander::Band, band_bits::TX, Level::High)?;
        self.led_on()
    }

    /// Return to receive
    ///
    /// The tuning encoder comes back only after the TX relay has dropped.
    pub fn enable_receive(&mut self) -> Result<(), I2C::Error> {
        self.state = self.state.with_txrx(TxRxState::Rx);
        info!("RX");
        let relay = self.io.write_bit(Expander::Band, band_bits::TX, Level::Low);
        let led = self.led_off();
        self.counters.set_transmitting(false);
        relay?;
        led
    }

    /// Mute the microphone (CW/MIC line high)
    pub fn mute_mic(&mut self) -> Result<(), I2C::Error> {
        self.io.write_bit(Expander::Band, band_bits::CW_MIC, Level::High)?;
        Ok(())
    }

    /// Unmute the microphone
    pub fn unmute_mic(&mut self) -> Result<(), I2C::Error> {
        self.io.write_bit(Expander::Band, band_bits::CW_MIC, Level::Low)?;
        Ok(())
    }

    /// Switch the receive attenuator in
    ///
    /// The flag is authoritative; the relay follows if the filter expander
    /// is reachable.
    pub fn attenuator_on(&mut self) -> Result<(), I2C::Error> {
        self.state = self.state.with_attenuator(true);
        self.io.write_bit(Expander::Filter, filter_bits::ATT, Level::High)?;
        Ok(())
    }

    /// Switch the receive attenuator out
    pub fn attenuator_off(&mut self) -> Result<(), I2C::Error> {
        self.state = self.state.with_attenuator(false);
        self.io.write_bit(Expander::Filter, filter_bits::ATT, Level::Low)?;
        Ok(())
    }

    // =========================================================================
    // Panel outputs
    // =========================================================================

    /// Mute the receiver audio
    pub fn mute_audio(&mut self) -> Result<(), I2C::Error> {
        self.mute.mute().map_err(|_| Error::Pin)
    }

    /// Unmute the receiver audio
    pub fn unmute_audio(&mut self) -> Result<(), I2C::Error> {
        self.mute.unmute().map_err(|_| Error::Pin)
    }

    /// Light the status LED
    pub fn led_on(&mut self) -> Result<(), I2C::Error> {
        self.led.on().map_err(|_| Error::Pin)
    }

    /// Turn the status LED off
    pub fn led_off(&mut self) -> Result<(), I2C::Error> {
        self.led.off().map_err(|_| Error::Pin)
    }

    // =========================================================================
    // Encoders and tuning
    // =========================================================================

    /// Lock the tuning encoder
    pub fn lock(&mut self) {
        self.state = self.state.with_lock(true);
        self.counters.set_locked(true);
    }

    /// Unlock the tuning encoder
    pub fn unlock(&mut self) {
        self.state = self.state.with_lock(false);
        self.counters.set_locked(false);
    }

    /// Drain the tuning encoder (0 while transmitting or locked)
    pub fn tune_delta(&mut self) -> i32 {
        self.counters.drain(EncoderId::Tune)
    }

    /// Drain the function encoder (live in every state)
    pub fn function_delta(&mut self) -> i32 {
        self.counters.drain(EncoderId::Function)
    }

    /// Move the dial by a number of tuning steps
    ///
    /// Returns `Ok(false)` and leaves the frequency alone if the result is
    /// out of band.
    pub fn tune(&mut self, steps: i32) -> Result<bool, I2C::Error> {
        if steps == 0 {
            return Ok(true);
        }
        let target = self.state.frequency().tune(steps, self.state.step());
        self.set_frequency(target)
    }

    /// Set the dial frequency, following the band relays to its band
    ///
    /// Returns `Ok(false)` if the synthesizer rejects it as out of band.
    pub fn set_frequency(&mut self, frequency: Frequency) -> Result<bool, I2C::Error> {
        if !self.synth.set_frequency(frequency.as_hz(), self.state.mode()) {
            debug!("{} out of band", frequency);
            return Ok(false);
        }
        self.state = self.state.with_frequency(frequency);
        if let Some(band) = Band::from_frequency(frequency) {
            self.set_band(band)?;
        }
        Ok(true)
    }

    /// Change mode: select its filter and retune the synthesizer
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), I2C::Error> {
        self.state = self.state.with_mode(mode);
        debug!("mode -> {}", mode);
        self.set_filter(mode.filter())?;
        if !self.retune() {
            warn!("{} out of band in {}", self.state.frequency(), mode);
        }
        Ok(())
    }

    /// Set the tuning step
    pub fn set_tuning_step(&mut self, step: TuningStep) {
        self.state = self.state.with_step(step);
    }

    /// Cycle to the next larger tuning step
    pub fn next_step(&mut self) -> TuningStep {
        self.state = self.state.next_step();
        self.state.step()
    }

    fn retune(&mut self) -> bool {
        self.synth
            .set_frequency(self.state.frequency().as_hz(), self.state.mode())
    }

    // =========================================================================
    // CW keying
    // =========================================================================

    /// Key down: start the sidetone if needed, then request the tone
    pub fn cw_tone_start(&mut self) -> Result<(), I2C::Error> {
        if !self.sidetone.is_running() && !self.sidetone.start() {
            return Err(Error::TimerUnavailable);
        }
        self.sidetone.request_tone(true);
        Ok(())
    }

    /// Key up: release the tone (the envelope ramps down on its own)
    pub fn cw_tone_stop(&mut self) {
        self.sidetone.request_tone(false);
    }

    /// Stop the sidetone generator
    pub fn cw_stop(&mut self) {
        self.sidetone.stop();
    }

    /// Read back an expander's output latch and input port
    ///
    /// `None` when the device is unreachable.
    pub fn read_ports(&mut self, device: Expander) -> Result<Option<PortSnapshot>, I2C::Error> {
        let Some(output) = self.io.read_output(device)? else {
            return Ok(None);
        };
        let Some(input) = self.io.read_input(device)? else {
            return Ok(None);
        };
        Ok(Some(PortSnapshot { output, input }))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Band expander failed its startup probe
    #[must_use]
    pub fn band_io_error(&self) -> bool {
        self.io.flags().band()
    }

    /// Filter expander failed its startup probe
    #[must_use]
    pub fn filter_io_error(&self) -> bool {
        self.io.flags().filter()
    }

    /// Check if transmitting
    #[must_use]
    pub const fn tx_enabled(&self) -> bool {
        self.state.is_transmitting()
    }

    /// Check if receiving
    #[must_use]
    pub const fn rx_enabled(&self) -> bool {
        !self.state.is_transmitting()
    }

    /// Check if the tuning lock is on
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// Check if the attenuator is in
    #[must_use]
    pub const fn attenuator_enabled(&self) -> bool {
        self.state.attenuator_enabled()
    }

    /// Check if the receiver audio is muted
    #[must_use]
    pub const fn audio_muted(&self) -> bool {
        self.mute.is_muted()
    }

    /// Status LED state
    #[must_use]
    pub const fn led_state(&self) -> LedState {
        self.led.state()
    }

    /// Current logical state
    #[must_use]
    pub const fn state(&self) -> &RadioState {
        &self.state
    }

    /// Startup configuration
    #[must_use]
    pub const fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Synthesizer collaborator
    #[must_use]
    pub const fn synth(&self) -> &S {
        &self.synth
    }

    /// Sidetone generator
    #[must_use]
    pub const fn sidetone(&self) -> &K {
        &self.sidetone
    }
}
