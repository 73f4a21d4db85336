//! Hardware Abstraction Layer
//!
//! Provides the seams between the control core and the board.
//! Everything here is generic over `embedded-hal` traits or small local
//! traits so the core runs unchanged on the target and in host tests;
//! STM32-specific adapters are gated behind the `embedded` feature.

pub mod gpio;
pub mod i2c;
pub mod pwm;
pub mod timer;
