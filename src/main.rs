//! CW Transceiver Main Application
//!
//! Entry point for the STM32G474-based transceiver firmware.
//! Initializes hardware, spawns the tick task and runs the control loop.
//!
//! The tick task runs on an interrupt-driven executor above thread mode, so
//! blocking I2C in the control loop never delays encoder polling or the
//! envelope.

#![no_std]
#![no_main]

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals;
use embassy_stm32::time::{khz, Hertz};
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cw_transceiver::cw::envelope::{EnvelopeGenerator, SharedEnvelope, ToneLatch};
use cw_transceiver::drivers::encoder::{EncoderCapture, EncoderCounters, EncoderPins};
use cw_transceiver::drivers::expander::Expander;
use cw_transceiver::hal::gpio::ControlInputs;
use cw_transceiver::hal::i2c::scan;
use cw_transceiver::hal::pwm::SimplePwmTone;
use cw_transceiver::hal::timer::TickGate;
use cw_transceiver::prelude::*;
use cw_transceiver::radio::control::Radio;
use cw_transceiver::radio::synth::FrequencyPlan;

/// Tone PWM on TIM1 CH1
type TonePwmOut = SimplePwmTone<'static, peripherals::TIM1>;

/// Envelope generator shared by the tick task and the control loop
type Envelope = SharedEnvelope<'static, CriticalSectionRawMutex, TonePwmOut, &'static TickGate>;

/// Radio as wired on this board
type BoardRadio =
    Radio<'static, I2c<'static, Blocking>, Output<'static>, FrequencyPlan, &'static Envelope>;

static COUNTERS: EncoderCounters = EncoderCounters::new();
static TONE_LATCH: ToneLatch = ToneLatch::new();
static TICK_GATE: TickGate = TickGate::new(tone::TICK_PERIOD_US);
static ENVELOPE: StaticCell<Envelope> = StaticCell::new();

/// Executor for the tick task, pended from a spare interrupt vector
static TICK_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART4() {
    TICK_EXECUTOR.on_interrupt();
}

/// Control loop period
const LOOP_PERIOD: Duration = Duration::from_millis(5);

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("CW Transceiver Firmware v{}", env!("CARGO_PKG_VERSION"));

    // Initialize STM32G474 peripherals with default clock configuration
    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    // Relay expanders on I2C1, PB8 = SCL, PB9 = SDA
    let mut i2c = I2c::new_blocking(
        p.I2C1,
        p.PB8,
        p.PB9,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    for addr in scan(&mut i2c) {
        info!("I2C device at {}", addr);
    }

    // Tone PWM: TIM1 CH1 on PA8, centre-aligned, ~83 kHz carrier for 1024 levels
    let tone_pin = PwmPin::new_ch1(p.PA8, OutputType::PushPull);
    let pwm = SimplePwm::new(
        p.TIM1,
        Some(tone_pin),
        None,
        None,
        None,
        khz(83),
        CountingMode::CenterAlignedBothInterrupts,
    );
    let generator = EnvelopeGenerator::new(SimplePwmTone::new(pwm, true), &TICK_GATE, &TONE_LATCH);
    let envelope: &'static Envelope = ENVELOPE.init(SharedEnvelope::new(generator));

    // Encoders (pulled up, full-step Gray code)
    let tune_encoder = EncoderPins::new(Input::new(p.PA0, Pull::Up), Input::new(p.PA1, Pull::Up));
    let function_encoder = EncoderPins::new(Input::new(p.PB0, Pull::Up), Input::new(p.PB1, Pull::Up));
    let capture = EncoderCapture::new(tune_encoder, function_encoder, &COUNTERS);

    let mut inputs = ControlInputs::new(
        Input::new(p.PA3, Pull::Up),
        Input::new(p.PA4, Pull::Up),
        Input::new(p.PC0, Pull::Up),
        Input::new(p.PC1, Pull::Up),
        Input::new(p.PA2, Pull::Up),
        Input::new(p.PB2, Pull::Up),
    );

    // Mute is held high until the radio has initialised
    let led = Output::new(p.PA5, Level::Low, Speed::Low);
    let mute = Output::new(p.PC2, Level::High, Speed::Low);

    let mut radio: BoardRadio = Radio::new(
        RadioConfig::default(),
        i2c,
        led,
        mute,
        FrequencyPlan::default(),
        envelope,
        &COUNTERS,
    );
    if let Err(e) = radio.init() {
        error!("Radio init failed: {}", e);
    }
    for device in [Expander::Band, Expander::Filter] {
        match radio.read_ports(device) {
            Ok(Some(ports)) => info!("{} expander {}", device, ports),
            Ok(None) => {}
            Err(e) => warn!("{} expander read-back failed: {}", device, e),
        }
    }
    if radio.band_io_error() || radio.filter_io_error() {
        warn!(
            "Running degraded: band={}, filter={}",
            radio.band_io_error(),
            radio.filter_io_error()
        );
    }
    if let Err(e) = radio.unmute_audio() {
        error!("Unmute failed: {}", e);
    }

    // Any priority above thread mode preempts the control loop
    interrupt::UART4.set_priority(Priority::P6);
    let tick_spawner = TICK_EXECUTOR.start(interrupt::UART4);
    tick_spawner.must_spawn(tick_task(capture, envelope));
    info!("Tick task running at {} Hz", TICK_GATE.rate_hz());

    control_loop(&mut radio, &mut inputs).await;
}

/// Fixed-rate tick: encoder capture and envelope generation
///
/// Runs on `TICK_EXECUTOR`. Never touches the I2C bus.
#[embassy_executor::task]
async fn tick_task(mut capture: EncoderCapture<'static, Input<'static>>, envelope: &'static Envelope) {
    let mut ticker = TICK_GATE.ticker();
    loop {
        capture.poll();
        if TICK_GATE.is_armed() {
            envelope.tick();
        }
        ticker.next().await;
    }
}

/// Main control loop: tuning, PTT and CW keying
async fn control_loop(radio: &mut BoardRadio, inputs: &mut ControlInputs<Input<'static>>) {
    let mut ticker = Ticker::every(LOOP_PERIOD);
    let mut key_down = false;
    let mut multi_pressed = false;

    loop {
        let steps = radio.tune_delta();
        if steps != 0 {
            match radio.tune(steps) {
                Ok(true) => debug!("{}", radio.state().frequency()),
                Ok(false) => debug!("Tuning stopped at band edge"),
                Err(e) => error!("Tune failed: {}", e),
            }
        }

        let clicks = radio.function_delta();
        if clicks > 0 {
            let step = radio.next_step();
            info!("Step {}", step);
        } else if clicks < 0 {
            let step = radio.state().step().next_smaller();
            radio.set_tuning_step(step);
            info!("Step {}", step);
        }

        // Inputs on this board are infallible
        let multi = inputs.multi_button().unwrap_or(false);
        if multi && !multi_pressed && !radio.tx_enabled() {
            let mode = radio.state().mode().next();
            if let Err(e) = radio.set_mode(mode) {
                error!("Mode change failed: {}", e);
            }
            info!("Mode {}", mode);
        }
        multi_pressed = multi;

        let cw = radio.state().mode().is_cw();
        let paddle = inputs.paddle_a().unwrap_or(false) || inputs.paddle_b().unwrap_or(false);
        let keyed = cw && paddle;
        let ptt = inputs.ptt().unwrap_or(false)
            || (radio.state().mode().filter() == Filter::Digital && inputs.vox_sense().unwrap_or(false));

        let want_tx = ptt || keyed;
        if want_tx && radio.rx_enabled() {
            if let Err(e) = radio.enable_transmit() {
                error!("TX switch failed: {}", e);
            }
        }

        if keyed != key_down {
            if keyed {
                if let Err(e) = radio.cw_tone_start() {
                    error!("Sidetone failed: {}", e);
                }
            } else {
                radio.cw_tone_stop();
            }
            key_down = keyed;
        }

        if !want_tx && radio.tx_enabled() {
            if let Err(e) = radio.enable_receive() {
                error!("RX switch failed: {}", e);
            }
        }

        ticker.next().await;
    }
}
