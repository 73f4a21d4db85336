//! CW Tone Generation
//!
//! Click-free keyed sidetone: amplitude-shaping tables walked one entry per
//! timer tick and written to a PWM channel.

pub mod envelope;
pub mod tables;
