//! GPIO Abstractions
//!
//! Type-safe GPIO pin wrappers for the transceiver front panel.
//! Provides semantic meaning to pins through the type system.

use embedded_hal::digital::{InputPin, OutputPin};

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

#[cfg(feature = "embedded")]
impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver
///
/// Lit while transmitting.
pub struct StatusLed<O> {
    pin: O,
    state: LedState,
}

impl<O: OutputPin> StatusLed<O> {
    /// Create a new status LED (state assumed off until first write)
    #[must_use]
    pub fn new(pin: O) -> Self {
        Self {
            pin,
            state: LedState::Off,
        }
    }

    /// Turn LED on
    pub fn on(&mut self) -> Result<(), O::Error> {
        self.pin.set_high()?;
        self.state = LedState::On;
        Ok(())
    }

    /// Turn LED off
    pub fn off(&mut self) -> Result<(), O::Error> {
        self.pin.set_low()?;
        self.state = LedState::Off;
        Ok(())
    }

    /// Toggle LED state
    pub fn toggle(&mut self) -> Result<(), O::Error> {
        match self.state {
            LedState::Off => self.on(),
            LedState::On => self.off(),
        }
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

/// Receiver audio mute line (high mutes)
pub struct AudioMute<O> {
    pin: O,
    muted: bool,
}

impl<O: OutputPin> AudioMute<O> {
    /// Wrap the mute pin; the caller drives it to a known level during init
    #[must_use]
    pub fn new(pin: O) -> Self {
        Self { pin, muted: true }
    }

    /// Mute the receiver audio
    pub fn mute(&mut self) -> Result<(), O::Error> {
        self.pin.set_high()?;
        self.muted = true;
        Ok(())
    }

    /// Unmute the receiver audio
    pub fn unmute(&mut self) -> Result<(), O::Error> {
        self.pin.set_low()?;
        self.muted = false;
        Ok(())
    }

    /// Check if audio is muted
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }
}

/// Active-low input with pull-up (buttons, PTT, paddles, VOX sense)
pub struct ActiveLowInput<P> {
    pin: P,
}

impl<P: InputPin> ActiveLowInput<P> {
    /// Wrap an input pin configured with a pull-up
    #[must_use]
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Check if the input is asserted (pulled low)
    pub fn is_active(&mut self) -> Result<bool, P::Error> {
        self.pin.is_low()
    }
}

/// Operator inputs on the front panel
pub struct ControlInputs<P> {
    ptt: ActiveLowInput<P>,
    vox_sense: ActiveLowInput<P>,
    paddle_a: ActiveLowInput<P>,
    paddle_b: ActiveLowInput<P>,
    tune_button: ActiveLowInput<P>,
    multi_button: ActiveLowInput<P>,
}

impl<P: InputPin> ControlInputs<P> {
    /// Create the input set from its pins
    #[must_use]
    pub fn new(
        ptt: P,
        vox_sense: P,
        paddle_a: P,
        paddle_b: P,
        tune_button: P,
        multi_button: P,
    ) -> Self {
        Self {
            ptt: ActiveLowInput::new(ptt),
            vox_sense: ActiveLowInput::new(vox_sense),
            paddle_a: ActiveLowInput::new(paddle_a),
            paddle_b: ActiveLowInput::new(paddle_b),
            tune_button: ActiveLowInput::new(tune_button),
            multi_button: ActiveLowInput::new(multi_button),
        }
    }

    /// Microphone push-to-talk pressed
    pub fn ptt(&mut self) -> Result<bool, P::Error> {
        self.ptt.is_active()
    }

    /// Digital-mode VOX sense line asserted
    pub fn vox_sense(&mut self) -> Result<bool, P::Error> {
        self.vox_sense.is_active()
    }

    /// CW paddle A closed
    pub fn paddle_a(&mut self) -> Result<bool, P::Error> {
        self.paddle_a.is_active()
    }

    /// CW paddle B closed
    pub fn paddle_b(&mut self) -> Result<bool, P::Error> {
        self.paddle_b.is_active()
    }

    /// Tuning encoder push button pressed
    pub fn tune_button(&mut self) -> Result<bool, P::Error> {
        self.tune_button.is_active()
    }

    /// Multi-function encoder push button pressed
    pub fn multi_button(&mut self) -> Result<bool, P::Error> {
        self.multi_button.is_active()
    }
}
