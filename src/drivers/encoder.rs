//! Rotary Encoder Driver
//!
//! Handles the tuning and multi-function encoders. Decoding and counting run
//! in the tick context; the main loop drains the counts.
//!
//! # Sharing
//!
//! [`EncoderCounters`] is the only multi-step state crossing the two
//! contexts. Producer increments and consumer read-and-zero both run inside
//! a `critical_section`, so a drain can neither observe a half-applied tick
//! nor lose one landing between its read and its reset. The transmit and
//! lock flags are single atomic booleans and need no critical section.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use embedded_hal::digital::InputPin;

/// Encoder rotation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise rotation (increment)
    Clockwise,
    /// Counter-clockwise rotation (decrement)
    CounterClockwise,
}

impl Direction {
    /// Signed count contribution
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Clockwise => 1,
            Self::CounterClockwise => -1,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Direction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Clockwise => defmt::write!(f, "CW"),
            Self::CounterClockwise => defmt::write!(f, "CCW"),
        }
    }
}

/// Which encoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderId {
    /// Main tuning knob
    Tune,
    /// Multi-function (menu) knob
    Function,
}

/// Encoder state machine states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum EncoderState {
    #[default]
    Start,
    CwBegin,
    CwNext,
    CwFinal,
    CcwBegin,
    CcwNext,
    CcwFinal,
}

/// Full-step Gray-code quadrature decoder
///
/// Both phases rest high (pull-ups). A detent is reported only when the
/// full four-transition sequence completes back at rest; contact bounce
/// moves the state back and forth inside the sequence without emitting a
/// step, which is what debounces the knob.
///
/// Clockwise: `11 → 10 → 00 → 01 → 11` (as `(a, b)`),
/// counter-clockwise: `11 → 01 → 00 → 10 → 11`.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadratureDecoder {
    state: EncoderState,
}

impl QuadratureDecoder {
    /// Create a new quadrature decoder
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EncoderState::Start,
        }
    }

    /// Update with new A/B pin levels, returns direction if a detent completed
    pub fn update(&mut self, a: bool, b: bool) -> Option<Direction> {
        use EncoderState::{CcwBegin, CcwFinal, CcwNext, CwBegin, CwFinal, CwNext, Start};

        let (new_state, result) = match (self.state, a, b) {
            (Start, true, false) => (CwBegin, None),
            (Start, false, true) => (CcwBegin, None),
            (Start, _, _) => (Start, None),

            (CwBegin, false, false) => (CwNext, None),
            (CwBegin, true, false) => (CwBegin, None),
            (CwBegin, _, _) => (Start, None),

            (CwNext, false, false) => (CwNext, None),
            (CwNext, true, false) => (CwBegin, None),
            (CwNext, false, true) => (CwFinal, None),
            (CwNext, true, true) => (Start, None),

            (CwFinal, false, false) => (CwNext, None),
            (CwFinal, false, true) => (CwFinal, None),
            (CwFinal, true, true) => (Start, Some(Direction::Clockwise)),
            (CwFinal, true, false) => (Start, None),

            (CcwBegin, false, false) => (CcwNext, None),
            (CcwBegin, false, true) => (CcwBegin, None),
            (CcwBegin, _, _) => (Start, None),

            (CcwNext, false, false) => (CcwNext, None),
            (CcwNext, false, true) => (CcwBegin, None),
            (CcwNext, true, false) => (CcwFinal, None),
            (CcwNext, true, true) => (Start, None),

            (CcwFinal, false, false) => (CcwNext, None),
            (CcwFinal, true, false) => (CcwFinal, None),
            (CcwFinal, true, true) => (Start, Some(Direction::CounterClockwise)),
            (CcwFinal, false, true) => (Start, None),
        };

        self.state = new_state;
        result
    }

    /// Reset the decoder state
    pub fn reset(&mut self) {
        self.state = EncoderState::Start;
    }
}

/// Tick counters and suppression flags shared by producer and consumer
///
/// `const`-constructible so it can live in a `static`.
pub struct EncoderCounters {
    tune: Mutex<Cell<i32>>,
    function: Mutex<Cell<i32>>,
    transmitting: AtomicBool,
    locked: AtomicBool,
}

impl EncoderCounters {
    /// Create zeroed counters in receive, unlocked
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tune: Mutex::new(Cell::new(0)),
            function: Mutex::new(Cell::new(0)),
            transmitting: AtomicBool::new(false),
            locked: AtomicBool::new(false),
        }
    }

    const fn counter(&self, id: EncoderId) -> &Mutex<Cell<i32>> {
        match id {
            EncoderId::Tune => &self.tune,
            EncoderId::Function => &self.function,
        }
    }

    /// Whether the tuning encoder is currently suppressed
    #[must_use]
    pub fn tune_suppressed(&self) -> bool {
        self.transmitting.load(Ordering::Acquire) || self.locked.load(Ordering::Acquire)
    }

    /// Record one detent (producer side)
    ///
    /// Ignored for the tuning encoder while suppressed.
    pub fn record(&self, id: EncoderId, direction: Direction) {
        critical_section::with(|cs| {
            // Checked inside the section so a concurrent `set_transmitting`
            // discard cannot be overtaken by a late tick
            if id == EncoderId::Tune && self.tune_suppressed() {
                return;
            }
            let count = self.counter(id).borrow(cs);
            count.set(count.get().wrapping_add(direction.delta()));
        });
    }

    /// Read and zero a counter as one step (consumer side)
    ///
    /// The tuning counter reads 0 while suppressed, without entering the
    /// critical section.
    pub fn drain(&self, id: EncoderId) -> i32 {
        if id == EncoderId::Tune && self.tune_suppressed() {
            return 0;
        }
        critical_section::with(|cs| self.counter(id).borrow(cs).replace(0))
    }

    /// Discard the pending tuning count
    fn discard_tune(&self) {
        critical_section::with(|cs| self.tune.borrow(cs).set(0));
    }

    /// Enter or leave transmit; entering discards pending tuning ticks
    pub fn set_transmitting(&self, transmitting: bool) {
        self.transmitting.store(transmitting, Ordering::Release);
        if transmitting {
            self.discard_tune();
        }
    }

    /// Whether transmit suppression is active
    #[must_use]
    pub fn is_transmitting(&self) -> bool {
        self.transmitting.load(Ordering::Acquire)
    }

    /// Lock or unlock the tuning encoder
    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::Release);
    }

    /// Whether the tuning lock is active
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

impl Default for EncoderCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// One encoder's phase pins and decoder
pub struct EncoderPins<P> {
    a: P,
    b: P,
    decoder: QuadratureDecoder,
}

impl<P: InputPin> EncoderPins<P> {
    /// Create from the A and B phase inputs
    #[must_use]
    pub fn new(a: P, b: P) -> Self {
        Self {
            a,
            b,
            decoder: QuadratureDecoder::new(),
        }
    }

    /// Sample both phases and advance the decoder
    pub fn sample(&mut self) -> Result<Option<Direction>, P::Error> {
        let a = self.a.is_high()?;
        let b = self.b.is_high()?;
        Ok(self.decoder.update(a, b))
    }

    /// Reset the decoder to rest
    pub fn reset(&mut self) {
        self.decoder.reset();
    }
}

/// Tick-context side of encoder capture
///
/// Owns both encoders' pins and decoders and feeds [`EncoderCounters`].
pub struct EncoderCapture<'a, P> {
    tune: EncoderPins<P>,
    function: EncoderPins<P>,
    counters: &'a EncoderCounters,
}

impl<'a, P: InputPin> EncoderCapture<'a, P> {
    /// Create the capture for both encoders
    #[must_use]
    pub fn new(tune: EncoderPins<P>, function: EncoderPins<P>, counters: &'a EncoderCounters) -> Self {
        Self {
            tune,
            function,
            counters,
        }
    }

    /// Poll both encoders once (call at the fixed tick rate)
    ///
    /// The tuning encoder is not sampled while suppressed; the function
    /// encoder always is. A pin read error skips that encoder for this tick.
    pub fn poll(&mut self) {
        if self.counters.tune_suppressed() {
            self.tune.reset();
        } else if let Ok(Some(direction)) = self.tune.sample() {
            self.counters.record(EncoderId::Tune, direction);
        }

        if let Ok(Some(direction)) = self.function.sample() {
            self.counters.record(EncoderId::Function, direction);
        }
    }

    /// Shared counters this capture feeds
    #[must_use]
    pub const fn counters(&self) -> &'a EncoderCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CW_SEQUENCE: [(bool, bool); 4] = [(true, false), (false, false), (false, true), (true, true)];

    #[test]
    fn full_clockwise_sequence_emits_one_step() {
        let mut decoder = QuadratureDecoder::new();
        let results: heapless::Vec<Option<Direction>, 4> =
            CW_SEQUENCE.iter().map(|&(a, b)| decoder.update(a, b)).collect();
        assert_eq!(results.as_slice(), &[None, None, None, Some(Direction::Clockwise)]);
    }

    #[test]
    fn bounce_inside_sequence_does_not_emit() {
        let mut decoder = QuadratureDecoder::new();
        assert_eq!(decoder.update(true, false), None);
        assert_eq!(decoder.update(false, false), None);
        // contact bounce back a step
        assert_eq!(decoder.update(true, false), None);
        assert_eq!(decoder.update(false, false), None);
        assert_eq!(decoder.update(false, true), None);
        assert_eq!(decoder.update(true, true), Some(Direction::Clockwise));
    }
}
