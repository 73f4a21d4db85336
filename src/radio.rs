//! Radio Control Logic
//!
//! State machines and business logic for radio operation.
//! Implements the control core of the transceiver.

pub mod control;
pub mod state;
pub mod synth;
