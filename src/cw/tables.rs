//! Keyclick shaping tables
//!
//! Raw samples are 10-bit PWM levels centred on [`PWM_MID_RAIL`]. They are
//! never written to the hardware as-is: [`attenuate`] scales them towards
//! mid-rail first.

use crate::config::tone::{ATTENUATION, PWM_MID_RAIL};

/// Length of the attack/release table
pub const KEYCLICK_LEN: usize = 64;

/// Length of one steady-tone cycle
pub const SUSTAIN_LEN: usize = 16;

/// Rising envelope: the tone cycle with amplitude growing from zero.
/// Read forwards on key-down and backwards on key-up.
pub const KEYCLICK: [u16; KEYCLICK_LEN] = [
    0x0200, 0x0207, 0x020B, 0x0209, 0x0200, 0x01F0, 0x01DE, 0x01CC,
    0x01C0, 0x01BD, 0x01C7, 0x01DE, 0x0200, 0x0227, 0x024E, 0x026E,
    0x027F, 0x027D, 0x0265, 0x023A, 0x0200, 0x01BF, 0x0183, 0x0156,
    0x0140, 0x0147, 0x016D, 0x01AD, 0x0200, 0x0258, 0x02A9, 0x02E4,
    0x02FF, 0x02F3, 0x02BF, 0x026B, 0x0200, 0x018E, 0x0129, 0x00E0,
    0x00C0, 0x00D1, 0x0113, 0x017C, 0x0200, 0x0289, 0x0303, 0x035A,
    0x037F, 0x0369, 0x031A, 0x029C, 0x0200, 0x015D, 0x00CF, 0x006A,
    0x0040, 0x005B, 0x00B8, 0x014B, 0x0200, 0x02BA, 0x035D, 0x03D0,
];

/// One full-amplitude cycle of the tone
pub const SUSTAIN: [u16; SUSTAIN_LEN] = [
    0x03FF, 0x03D8, 0x0369, 0x02C4, 0x0200, 0x013C, 0x0097, 0x0028,
    0x0001, 0x0028, 0x0097, 0x013C, 0x0200, 0x02C4, 0x0369, 0x03D8,
];

/// Scale a raw table sample towards mid-rail
///
/// `(raw - mid) / ATTENUATION + mid`, computed signed so samples below
/// mid-rail stay below it. The division floors, matching the unsigned
/// wrap-around arithmetic the shaping tables were tuned against.
#[must_use]
pub const fn attenuate(raw: u16) -> u16 {
    let mid = PWM_MID_RAIL as i32;
    let centred = raw as i32 - mid;
    // |centred| <= 512, so the result stays within 448..=576
    (centred.div_euclid(ATTENUATION) + mid) as u16
}
