//! Timer Abstractions
//!
//! The envelope generator owns a repeating tick timer. On the target the
//! tick comes from a fixed-rate embassy `Ticker` task on an interrupt
//! executor and arming simply opens a gate that task checks; other platforms can back [`TickTimer`]
//! with a real hardware alarm.

use core::sync::atomic::{AtomicBool, Ordering};

/// Arming the tick timer failed (no alarm available at that period)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerUnavailable;

#[cfg(feature = "embedded")]
impl defmt::Format for TimerUnavailable {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TimerUnavailable");
    }
}

/// Repeating timer driving a tick callback
pub trait TickTimer {
    /// Start repeating ticks every `period_us` microseconds
    fn arm(&mut self, period_us: u32) -> Result<(), TimerUnavailable>;

    /// Stop ticking; safe to call when not armed
    fn disarm(&mut self);
}

/// Gate over a fixed-rate tick source
///
/// The tick source runs continuously (it also polls the encoders); the gate
/// decides whether the envelope generator sees those ticks. It can only be
/// armed at the period the source was built for.
#[derive(Debug)]
pub struct TickGate {
    period_us: u32,
    armed: AtomicBool,
}

impl TickGate {
    /// Create a closed gate for a source ticking every `period_us`
    #[must_use]
    pub const fn new(period_us: u32) -> Self {
        Self {
            period_us,
            armed: AtomicBool::new(false),
        }
    }

    /// Get the tick period in microseconds
    #[must_use]
    pub const fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Get the tick rate in Hz
    #[must_use]
    pub const fn rate_hz(&self) -> u32 {
        1_000_000 / self.period_us
    }

    /// Check if ticks should reach the generator
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Get period duration
    #[cfg(feature = "embedded")]
    #[must_use]
    pub const fn period(&self) -> embassy_time::Duration {
        embassy_time::Duration::from_micros(self.period_us as u64)
    }

    /// Build the ticker the tick task should run on
    #[cfg(feature = "embedded")]
    #[must_use]
    pub fn ticker(&self) -> embassy_time::Ticker {
        embassy_time::Ticker::every(self.period())
    }
}

impl TickTimer for &TickGate {
    fn arm(&mut self, period_us: u32) -> Result<(), TimerUnavailable> {
        if period_us == 0 || period_us != self.period_us {
            return Err(TimerUnavailable);
        }
        self.armed.store(true, Ordering::Release);
        Ok(())
    }

    fn disarm(&mut self) {
        self.armed.store(false, Ordering::Release);
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TickGate {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TickGate({}Hz, armed={})", self.rate_hz(), self.is_armed());
    }
}
