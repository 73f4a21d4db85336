//! Mock hardware shared by the integration tests
//!
//! Every mock is a cheap clonable handle onto shared state, so a test can
//! hand one clone to the code under test and keep another to inspect.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::rc::Rc;

use cw_transceiver::config::{band_bits, RadioConfig, BAND_EXPANDER_ADDR, FILTER_EXPANDER_ADDR};
use cw_transceiver::cw::envelope::{EnvelopeGenerator, ToneLatch};
use cw_transceiver::drivers::encoder::EncoderCounters;
use cw_transceiver::hal::pwm::TonePwm;
use cw_transceiver::hal::timer::{TickTimer, TimerUnavailable};
use cw_transceiver::radio::control::Radio;
use cw_transceiver::radio::synth::FrequencyPlan;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};

// ============================================================================
// I2C bus with TCA9534 models
// ============================================================================

/// Address not acknowledged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nack;

impl i2c::Error for Nack {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// One write to an expander's output register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputWrite {
    pub addr: u8,
    pub value: u8,
}

/// Register file of one TCA9534
#[derive(Clone, Copy, Debug)]
pub struct Tca9534 {
    pub input: u8,
    pub output: u8,
    pub polarity: u8,
    pub config: u8,
    pointer: u8,
}

impl Default for Tca9534 {
    /// Power-on state: outputs high, no inversion, every line an input
    fn default() -> Self {
        Self {
            input: 0xFF,
            output: 0xFF,
            polarity: 0x00,
            config: 0xFF,
            pointer: 0,
        }
    }
}

impl Tca9534 {
    /// Lines actually driven high: outputs (config bit clear) latched high
    pub fn driven(&self) -> u8 {
        !self.config & self.output
    }

    fn write(&mut self, value: u8) {
        match self.pointer {
            1 => self.output = value,
            2 => self.polarity = value,
            3 => self.config = value,
            _ => {}
        }
    }

    fn read(&self) -> u8 {
        match self.pointer {
            0 => self.input ^ self.polarity,
            1 => self.output,
            2 => self.polarity,
            _ => self.config,
        }
    }
}

#[derive(Default)]
struct BusModel {
    devices: BTreeMap<u8, Tca9534>,
    output_writes: Vec<OutputWrite>,
    driven: Vec<(u8, u8)>,
    transactions: Vec<u8>,
    fail_next: usize,
    on_transaction: Option<Rc<dyn Fn()>>,
}

/// I2C bus populated with zero or more expanders
#[derive(Clone, Default)]
pub struct MockBus(Rc<RefCell<BusModel>>);

impl MockBus {
    /// Bus with expanders at the given addresses
    pub fn with_expanders(addrs: &[u8]) -> Self {
        let bus = Self::default();
        for &addr in addrs {
            bus.0.borrow_mut().devices.insert(addr, Tca9534::default());
        }
        bus
    }

    /// Bus with both relay expanders fitted
    pub fn populated() -> Self {
        Self::with_expanders(&[BAND_EXPANDER_ADDR, FILTER_EXPANDER_ADDR])
    }

    /// Register file of a device
    pub fn device(&self, addr: u8) -> Tca9534 {
        self.0.borrow().devices[&addr]
    }

    /// Output register of a device
    pub fn output(&self, addr: u8) -> u8 {
        self.device(addr).output
    }

    /// Drive a device's input pins
    pub fn set_input(&self, addr: u8, value: u8) {
        if let Some(dev) = self.0.borrow_mut().devices.get_mut(&addr) {
            dev.input = value;
        }
    }

    /// Every output-register write so far, in order
    pub fn output_writes(&self) -> Vec<OutputWrite> {
        self.0.borrow().output_writes.clone()
    }

    /// Output-register values written to one device, in order
    pub fn writes_to(&self, addr: u8) -> Vec<u8> {
        self.0
            .borrow()
            .output_writes
            .iter()
            .filter(|w| w.addr == addr)
            .map(|w| w.value)
            .collect()
    }

    /// Lines driven high by a device after each of its transactions
    pub fn driven_lines(&self, addr: u8) -> Vec<u8> {
        self.0
            .borrow()
            .driven
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, lines)| *lines)
            .collect()
    }

    /// Run `f` at the start of every transaction, as a preempting
    /// interrupt would while the bus is busy
    pub fn on_transaction(&self, f: impl Fn() + 'static) {
        self.0.borrow_mut().on_transaction = Some(Rc::new(f));
    }

    /// Number of transactions addressed to a device (acknowledged or not)
    pub fn transactions_to(&self, addr: u8) -> usize {
        self.0.borrow().transactions.iter().filter(|&&a| a == addr).count()
    }

    /// Forget the transaction and write logs
    pub fn clear_log(&self) {
        let mut model = self.0.borrow_mut();
        model.output_writes.clear();
        model.driven.clear();
        model.transactions.clear();
    }

    /// Make the next `n` transactions fail
    pub fn fail_next(&self, n: usize) {
        self.0.borrow_mut().fail_next = n;
    }
}

impl i2c::ErrorType for MockBus {
    type Error = Nack;
}

impl I2c for MockBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Nack> {
        let hook = self.0.borrow().on_transaction.clone();
        if let Some(hook) = hook {
            hook();
        }

        let mut model = self.0.borrow_mut();
        let BusModel {
            devices,
            output_writes,
            driven,
            transactions,
            fail_next,
            ..
        } = &mut *model;

        transactions.push(address);
        if *fail_next > 0 {
            *fail_next -= 1;
            return Err(Nack);
        }
        let dev = devices.get_mut(&address).ok_or(Nack)?;

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&reg, values)) = bytes.split_first() {
                        dev.pointer = reg;
                        for &value in values {
                            dev.write(value);
                            if reg == 1 {
                                output_writes.push(OutputWrite { addr: address, value });
                            }
                        }
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = dev.read();
                    }
                }
            }
        }
        driven.push((address, dev.driven()));
        Ok(())
    }
}

/// Number of band relay lines high in an output value
pub fn band_relays_high(value: u8) -> usize {
    band_bits::RELAYS
        .iter()
        .filter(|&&bit| value & (1 << bit) != 0)
        .count()
}

// ============================================================================
// Digital pins
// ============================================================================

#[derive(Default)]
struct PinState {
    high: bool,
    history: Vec<bool>,
}

/// Digital pin usable as input or output
#[derive(Clone, Default)]
pub struct MockPin(Rc<RefCell<PinState>>);

impl MockPin {
    /// Pin resting at a level
    pub fn at(high: bool) -> Self {
        let pin = Self::default();
        pin.set(high);
        pin
    }

    /// Drive the pin from the test side
    pub fn set(&self, high: bool) {
        self.0.borrow_mut().high = high;
    }

    /// Current level
    pub fn level(&self) -> bool {
        self.0.borrow().high
    }

    /// Levels written by the code under test, in order
    pub fn history(&self) -> Vec<bool> {
        self.0.borrow().history.clone()
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut state = self.0.borrow_mut();
        state.high = false;
        state.history.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut state = self.0.borrow_mut();
        state.high = true;
        state.history.push(true);
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

// ============================================================================
// Tone PWM and tick timer
// ============================================================================

/// Recorded PWM channel state
#[derive(Clone, Debug, Default)]
pub struct PwmLog {
    pub wrap: u16,
    pub phase_correct: bool,
    pub enabled: bool,
    pub levels: Vec<u16>,
}

/// PWM channel recording every duty write
#[derive(Clone, Default)]
pub struct MockPwm(Rc<RefCell<PwmLog>>);

impl MockPwm {
    pub fn log(&self) -> PwmLog {
        self.0.borrow().clone()
    }

    pub fn levels(&self) -> Vec<u16> {
        self.0.borrow().levels.clone()
    }

    pub fn last_level(&self) -> Option<u16> {
        self.0.borrow().levels.last().copied()
    }

    pub fn is_enabled(&self) -> bool {
        self.0.borrow().enabled
    }

    pub fn clear_levels(&self) {
        self.0.borrow_mut().levels.clear();
    }
}

impl TonePwm for MockPwm {
    fn configure(&mut self, wrap: u16, phase_correct: bool) {
        let mut log = self.0.borrow_mut();
        log.wrap = wrap;
        log.phase_correct = phase_correct;
    }

    fn set_level(&mut self, level: u16) {
        self.0.borrow_mut().levels.push(level);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.0.borrow_mut().enabled = enabled;
    }
}

#[derive(Default)]
struct TimerState {
    armed: bool,
    period_us: u32,
    exhausted: bool,
    arm_calls: usize,
}

/// Repeating timer that can be made unavailable
#[derive(Clone, Default)]
pub struct MockTimer(Rc<RefCell<TimerState>>);

impl MockTimer {
    /// Timer whose every `arm` fails
    pub fn exhausted() -> Self {
        let timer = Self::default();
        timer.0.borrow_mut().exhausted = true;
        timer
    }

    pub fn is_armed(&self) -> bool {
        self.0.borrow().armed
    }

    pub fn period_us(&self) -> u32 {
        self.0.borrow().period_us
    }

    pub fn arm_calls(&self) -> usize {
        self.0.borrow().arm_calls
    }
}

impl TickTimer for MockTimer {
    fn arm(&mut self, period_us: u32) -> Result<(), TimerUnavailable> {
        let mut state = self.0.borrow_mut();
        state.arm_calls += 1;
        if state.exhausted {
            return Err(TimerUnavailable);
        }
        state.armed = true;
        state.period_us = period_us;
        Ok(())
    }

    fn disarm(&mut self) {
        self.0.borrow_mut().armed = false;
    }
}

// ============================================================================
// Radio bench
// ============================================================================

/// Sidetone generator over the mocks
pub type TestEnvelope<'a> = EnvelopeGenerator<'a, MockPwm, MockTimer>;

/// Radio over the mocks
pub type TestRadio<'a> = Radio<'a, MockBus, MockPin, FrequencyPlan, TestEnvelope<'a>>;

/// Handles onto every piece of hardware a test radio is wired to
#[derive(Clone, Default)]
pub struct Bench {
    pub bus: MockBus,
    pub led: MockPin,
    pub mute: MockPin,
    pub pwm: MockPwm,
    pub timer: MockTimer,
}

impl Bench {
    /// Bench around a given bus
    pub fn new(bus: MockBus) -> Self {
        Self {
            bus,
            ..Self::default()
        }
    }

    /// Build a radio with the default configuration
    pub fn radio<'a>(&self, counters: &'a EncoderCounters, latch: &'a ToneLatch) -> TestRadio<'a> {
        self.radio_with(RadioConfig::default(), counters, latch)
    }

    /// Build a radio with a given configuration
    pub fn radio_with<'a>(
        &self,
        config: RadioConfig,
        counters: &'a EncoderCounters,
        latch: &'a ToneLatch,
    ) -> TestRadio<'a> {
        let sidetone = EnvelopeGenerator::new(self.pwm.clone(), self.timer.clone(), latch);
        Radio::new(
            config,
            self.bus.clone(),
            self.led.clone(),
            self.mute.clone(),
            FrequencyPlan::new(config.mode),
            sidetone,
            counters,
        )
    }
}
