//! CW Transceiver Control Core
//!
//! This library provides the control core for a single-board HF amateur
//! radio transceiver: band and filter relay switching through two I2C
//! output expanders, two rotary encoders read from a fixed-rate tick, and
//! a click-free shaped CW tone generated on a PWM channel.
//!
//! # Architecture
//!
//! The firmware runs in two execution contexts:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   MAIN CONTROL LOOP                          │
//! │  Radio (band/filter/TX state)  │  Tuning  │  CW keying       │
//! │        │ I2C writes                  │ tone latch            │
//! ├────────┼─────────────────────────────┼───────────────────────┤
//! │        ▼                             ▼                       │
//! │  Output driver (TCA9534 x2)    Envelope generator            │
//! │                                      ▲                       │
//! ├──────────────────────────────────────┼───────────────────────┤
//! │                 TICK CONTEXT (~89 µs)│                       │
//! │  Encoder capture (critical section)  │  PWM duty writes      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **No I2C in the tick context**: bus transactions stay in the main loop
//! - **Minimal sharing**: encoder counters behind a critical section and a
//!   single atomic tone latch are the only cross-context state
//! - **Relay safety**: band and filter groups are always cleared before the
//!   single assert write
//! - **Degrade, don't halt**: an unreachable expander turns its writes into
//!   no-ops while logical state keeps tracking
//! - **Explicit error handling**: All fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// Digital I/O wrappers, I2C helpers and the PWM/timer seams of the
/// envelope generator.
pub mod hal;

/// Peripheral Drivers
///
/// Rotary encoder capture and the I2C relay expanders.
pub mod drivers;

/// CW Tone Generation
///
/// Keyclick shaping tables and the tick-driven envelope generator.
pub mod cw;

/// Radio Control Logic
///
/// Radio state, the control state machine and the frequency plan.
pub mod radio;

/// Shared types used across modules
pub mod types;

/// Error types
pub mod error;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::{InputPin, OutputPin};
    pub use embedded_hal::i2c::I2c;

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Error handling
    pub use crate::error::{Error, Result};

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
