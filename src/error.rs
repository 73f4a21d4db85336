//! Error types
//!
//! The control core never panics on hardware trouble: bus errors are
//! reported to the caller after logical state has been updated, and an
//! unreachable expander is handled by degrading rather than by an error.

use core::fmt;

/// Control core error, generic over the I2C bus error type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// I2C transaction failed on a reachable expander
    Bus(E),
    /// A digital input or output could not be accessed
    Pin,
    /// The tick timer could not be armed
    TimerUnavailable,
}

/// Result alias used by the control core
pub type Result<T, E> = core::result::Result<T, Error<E>>;

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Bus(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "I2C bus error: {err:?}"),
            Self::Pin => f.write_str("GPIO access failed"),
            Self::TimerUnavailable => f.write_str("tick timer unavailable"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E: defmt::Format> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus(err) => defmt::write!(f, "Bus({})", err),
            Self::Pin => defmt::write!(f, "Pin"),
            Self::TimerUnavailable => defmt::write!(f, "TimerUnavailable"),
        }
    }
}
