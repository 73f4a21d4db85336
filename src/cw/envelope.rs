//! CW Envelope Generator
//!
//! A fixed-rate tick walks a four-phase keying state machine and writes one
//! PWM sample per tick:
//!
//! ```text
//!            tone requested            64 ticks
//!   Idle ─────────────────▶ Attack ─────────────▶ Sustain ──┐ 16-tick cycle,
//!    ▲                                              │ ▲     │ latch checked
//!    │        64 ticks (table reversed)             │ └─────┘ at each wrap
//!    └──────────────────── Release ◀────────────────┘
//!                                    latch clear at wrap
//! ```
//!
//! Key-up latency is bounded by one sustain cycle: a cycle is never cut
//! short, so the tone always ends on the release ramp.
//!
//! # Contexts
//!
//! [`EnvelopeGenerator::tick`] is the timer callback body. The main loop
//! talks to a running generator only through the [`ToneLatch`], a single
//! atomic flag; `start`/`stop` reconfigure the hardware and are called with
//! the generator borrowed exclusively.

use core::sync::atomic::{AtomicBool, Ordering};

use super::tables::{attenuate, KEYCLICK, KEYCLICK_LEN, SUSTAIN, SUSTAIN_LEN};
use crate::config::tone::{PWM_MID_RAIL, PWM_WRAP, TICK_PERIOD_US};
use crate::hal::pwm::TonePwm;
use crate::hal::timer::TickTimer;

/// Envelope phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    /// Silent, output held at mid-rail
    #[default]
    Idle,
    /// Ramping up through the keyclick table
    Attack,
    /// Repeating the full-amplitude cycle
    Sustain,
    /// Ramping down through the keyclick table in reverse
    Release,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Phase {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Attack => defmt::write!(f, "Attack"),
            Self::Sustain => defmt::write!(f, "Sustain"),
            Self::Release => defmt::write!(f, "Release"),
        }
    }
}

/// Tone-requested flag shared between the main loop and the tick
///
/// `const`-constructible so it can live in a `static`.
#[derive(Debug, Default)]
pub struct ToneLatch(AtomicBool);

impl ToneLatch {
    /// Create a cleared latch
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Set or clear the request
    pub fn set(&self, on: bool) {
        self.0.store(on, Ordering::Release);
    }

    /// Read the request
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Pure keying state machine: phase, table index and current sample
///
/// Holds no hardware; [`EnvelopeGenerator`] feeds it one latch sample per
/// tick and writes what it returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvelopeShaper {
    phase: Phase,
    index: usize,
    sample: u16,
}

impl EnvelopeShaper {
    /// Create an idle shaper at mid-rail
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            index: 0,
            sample: PWM_MID_RAIL,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current table index
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Last computed sample
    #[must_use]
    pub const fn sample(&self) -> u16 {
        self.sample
    }

    /// Return to idle at mid-rail
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one tick and return the sample to output
    ///
    /// `tone_requested` is only acted on while idle and at sustain-cycle
    /// boundaries.
    pub fn advance(&mut self, tone_requested: bool) -> u16 {
        match self.phase {
            Phase::Idle => {
                self.sample = PWM_MID_RAIL;
                self.index = 0;
                if tone_requested {
                    self.phase = Phase::Attack;
                }
            }
            Phase::Attack => {
                self.sample = attenuate(KEYCLICK[self.index]);
                self.index += 1;
                if self.index >= KEYCLICK_LEN {
                    self.index = 0;
                    self.phase = Phase::Sustain;
                }
            }
            Phase::Sustain => {
                self.sample = attenuate(SUSTAIN[self.index]);
                self.index += 1;
                if self.index >= SUSTAIN_LEN {
                    self.index = 0;
                    if !tone_requested {
                        self.phase = Phase::Release;
                    }
                }
            }
            Phase::Release => {
                self.sample = attenuate(KEYCLICK[KEYCLICK_LEN - 1 - self.index]);
                self.index += 1;
                if self.index >= KEYCLICK_LEN {
                    self.index = 0;
                    self.phase = Phase::Idle;
                }
            }
        }
        self.sample
    }
}

impl Default for EnvelopeShaper {
    fn default() -> Self {
        Self::new()
    }
}

/// Control surface the radio uses to key the sidetone
pub trait Sidetone {
    /// Bring up the tone hardware; `false` if it could not be started
    fn start(&mut self) -> bool;

    /// Shut the tone hardware down; safe when never started
    fn stop(&mut self);

    /// Request key-down (`true`) or key-up (`false`)
    fn request_tone(&self, on: bool);

    /// Whether the generator is running
    fn is_running(&self) -> bool;
}

/// Shaped CW tone generator owning its PWM channel and tick timer
pub struct EnvelopeGenerator<'a, P, T> {
    pwm: P,
    timer: T,
    latch: &'a ToneLatch,
    shaper: EnvelopeShaper,
    running: bool,
}

impl<'a, P: TonePwm, T: TickTimer> EnvelopeGenerator<'a, P, T> {
    /// Create an inert generator; nothing touches the hardware until `start`
    pub fn new(pwm: P, timer: T, latch: &'a ToneLatch) -> Self {
        Self {
            pwm,
            timer,
            latch,
            shaper: EnvelopeShaper::new(),
            running: false,
        }
    }

    /// Shaper state, for diagnostics and tests
    #[must_use]
    pub const fn shaper(&self) -> &EnvelopeShaper {
        &self.shaper
    }

    /// The latch this generator samples
    #[must_use]
    pub const fn latch(&self) -> &'a ToneLatch {
        self.latch
    }

    /// Timer callback body: advance one tick and write the sample
    ///
    /// Bounded work, no blocking. Ticks arriving while stopped are ignored.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let sample = self.shaper.advance(self.latch.is_set());
        self.pwm.set_level(sample);
    }

    /// Configure the PWM at mid-rail and arm the tick timer
    ///
    /// Returns `false` (and leaves the PWM disabled) if the timer cannot be
    /// armed. Calling it while running is a no-op returning `true`.
    pub fn start(&mut self) -> bool {
        if self.running {
            return true;
        }

        self.shaper.reset();
        self.pwm.configure(PWM_WRAP, true);
        self.pwm.set_level(PWM_MID_RAIL);
        self.pwm.set_enabled(true);

        if self.timer.arm(TICK_PERIOD_US).is_err() {
            self.pwm.set_enabled(false);
            error!("CW tick timer unavailable, sidetone inert");
            return false;
        }

        self.running = true;
        debug!("CW envelope started, tick {} us", TICK_PERIOD_US);
        true
    }

    /// Disarm the timer, park the output at mid-rail and disable the PWM
    pub fn stop(&mut self) {
        self.timer.disarm();
        self.latch.set(false);
        self.shaper.reset();
        self.pwm.set_level(PWM_MID_RAIL);
        self.pwm.set_enabled(false);
        if self.running {
            debug!("CW envelope stopped");
        }
        self.running = false;
    }

    /// Set or clear the tone request; shaping follows on later ticks
    pub fn request_tone(&self, on: bool) {
        self.latch.set(on);
    }

    /// Whether the timer is armed
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}

impl<P: TonePwm, T: TickTimer> Sidetone for EnvelopeGenerator<'_, P, T> {
    fn start(&mut self) -> bool {
        EnvelopeGenerator::start(self)
    }

    fn stop(&mut self) {
        EnvelopeGenerator::stop(self);
    }

    fn request_tone(&self, on: bool) {
        EnvelopeGenerator::request_tone(self, on);
    }

    fn is_running(&self) -> bool {
        EnvelopeGenerator::is_running(self)
    }
}

#[cfg(feature = "embedded")]
pub use shared::SharedEnvelope;

#[cfg(feature = "embedded")]
mod shared {
    use core::cell::RefCell;

    use embassy_sync::blocking_mutex::raw::RawMutex;
    use embassy_sync::blocking_mutex::Mutex;

    use super::{EnvelopeGenerator, Sidetone, ToneLatch};
    use crate::hal::pwm::TonePwm;
    use crate::hal::timer::TickTimer;

    /// Generator reachable from both the tick task and the main loop
    ///
    /// The tick task preempts the main loop, so `R` must be safe to lock
    /// from interrupt context (`CriticalSectionRawMutex`). The lock only
    /// guards `start`/`stop`/`tick`; tone requests bypass it and go straight
    /// to the latch.
    pub struct SharedEnvelope<'a, R: RawMutex, P, T> {
        inner: Mutex<R, RefCell<EnvelopeGenerator<'a, P, T>>>,
        latch: &'a ToneLatch,
    }

    impl<'a, R: RawMutex, P: TonePwm, T: TickTimer> SharedEnvelope<'a, R, P, T> {
        /// Share a generator
        pub fn new(generator: EnvelopeGenerator<'a, P, T>) -> Self {
            let latch = generator.latch();
            Self {
                inner: Mutex::new(RefCell::new(generator)),
                latch,
            }
        }

        /// Tick callback for the tick task
        pub fn tick(&self) {
            self.inner.lock(|g| g.borrow_mut().tick());
        }
    }

    impl<R: RawMutex, P: TonePwm, T: TickTimer> Sidetone for &SharedEnvelope<'_, R, P, T> {
        fn start(&mut self) -> bool {
            self.inner.lock(|g| g.borrow_mut().start())
        }

        fn stop(&mut self) {
            self.inner.lock(|g| g.borrow_mut().stop());
        }

        fn request_tone(&self, on: bool) {
            self.latch.set(on);
        }

        fn is_running(&self) -> bool {
            self.inner.lock(|g| g.borrow().is_running())
        }
    }
}
