//! PWM Driver
//!
//! Tone output channel used by the envelope generator. The generator only
//! needs four things from the hardware: a counter top (wrap), a carrier
//! shape, a duty level and an enable switch.

/// Duty level relative to a counter wrap value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DutyCycle {
    level: u16,
    wrap: u16,
}

impl DutyCycle {
    /// Create a duty level (clamped to `wrap + 1`, i.e. 100%)
    #[must_use]
    pub const fn new(level: u16, wrap: u16) -> Self {
        let top = wrap.saturating_add(1);
        let level = if level > top { top } else { level };
        Self { level, wrap }
    }

    /// 50% duty for a given wrap
    #[must_use]
    pub const fn half(wrap: u16) -> Self {
        Self::new(wrap.saturating_add(1) / 2, wrap)
    }

    /// Get the raw level
    #[must_use]
    pub const fn level(self) -> u16 {
        self.level
    }

    /// Get as percentage
    #[must_use]
    pub fn as_percent(self) -> u8 {
        let top = u32::from(self.wrap) + 1;
        let pct = u32::from(self.level) * 100 / top;
        u8::try_from(pct).unwrap_or(100)
    }

    /// Rescale onto a channel whose full-scale duty is `max_duty`
    #[must_use]
    pub fn scale_to(self, max_duty: u16) -> u16 {
        let top = u32::from(self.wrap) + 1;
        let scaled = u32::from(self.level) * u32::from(max_duty) / top;
        u16::try_from(scaled).unwrap_or(max_duty)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DutyCycle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}%", self.as_percent());
    }
}

/// PWM channel driving the CW tone
///
/// Called from the tick context: implementations must not block.
pub trait TonePwm {
    /// Set the counter wrap value and carrier shape
    ///
    /// `phase_correct` selects a symmetric (up/down) carrier instead of a
    /// sawtooth one.
    fn configure(&mut self, wrap: u16, phase_correct: bool);

    /// Write the duty level (0..=wrap+1)
    fn set_level(&mut self, level: u16);

    /// Enable or disable the output
    fn set_enabled(&mut self, enabled: bool);
}

#[cfg(feature = "embedded")]
pub use stm32::SimplePwmTone;

#[cfg(feature = "embedded")]
mod stm32 {
    use embassy_stm32::timer::simple_pwm::SimplePwm;
    use embassy_stm32::timer::GeneralInstance4Channel;

    use super::{DutyCycle, TonePwm};

    /// Tone output on channel 1 of an embassy `SimplePwm`
    ///
    /// The timer must be created with a centre-aligned counting mode; the
    /// carrier shape cannot be changed after construction.
    pub struct SimplePwmTone<'d, T: GeneralInstance4Channel> {
        pwm: SimplePwm<'d, T>,
        wrap: u16,
        centre_aligned: bool,
    }

    impl<'d, T: GeneralInstance4Channel> SimplePwmTone<'d, T> {
        /// Wrap a `SimplePwm` built with the given counting mode
        #[must_use]
        pub fn new(pwm: SimplePwm<'d, T>, centre_aligned: bool) -> Self {
            Self {
                pwm,
                wrap: crate::config::tone::PWM_WRAP,
                centre_aligned,
            }
        }
    }

    impl<T: GeneralInstance4Channel> TonePwm for SimplePwmTone<'_, T> {
        fn configure(&mut self, wrap: u16, phase_correct: bool) {
            self.wrap = wrap;
            if phase_correct != self.centre_aligned {
                warn!("tone PWM carrier shape fixed at construction");
            }
        }

        fn set_level(&mut self, level: u16) {
            let mut ch = self.pwm.ch1();
            let duty = DutyCycle::new(level, self.wrap).scale_to(ch.max_duty_cycle());
            ch.set_duty_cycle(duty);
        }

        fn set_enabled(&mut self, enabled: bool) {
            let mut ch = self.pwm.ch1();
            if enabled {
                ch.enable();
            } else {
                ch.disable();
            }
        }
    }
}
