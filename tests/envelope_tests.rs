//! CW Envelope Tests
//!
//! Tests for the keyed tone shaping: phase sequence, sample bounds, key-up
//! latency and the start/stop lifecycle.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test envelope_tests

mod common;

use common::{MockPwm, MockTimer};
use cw_transceiver::config::tone::{PWM_MID_RAIL, PWM_WRAP, TICK_PERIOD_US};
use cw_transceiver::cw::envelope::{EnvelopeGenerator, EnvelopeShaper, Phase, Sidetone, ToneLatch};
use cw_transceiver::cw::tables::{attenuate, KEYCLICK, KEYCLICK_LEN, SUSTAIN, SUSTAIN_LEN};
use cw_transceiver::hal::timer::{TickGate, TickTimer};

fn generator<'a>(pwm: &MockPwm, timer: &MockTimer, latch: &'a ToneLatch) -> EnvelopeGenerator<'a, MockPwm, MockTimer> {
    EnvelopeGenerator::new(pwm.clone(), timer.clone(), latch)
}

/// Largest sample-to-sample step inside the scaled tables, sustain wrap included
fn largest_table_step() -> u16 {
    let attack = KEYCLICK.windows(2).map(|w| attenuate(w[0]).abs_diff(attenuate(w[1])));
    let sustain = (0..SUSTAIN_LEN).map(|i| {
        attenuate(SUSTAIN[i]).abs_diff(attenuate(SUSTAIN[(i + 1) % SUSTAIN_LEN]))
    });
    attack.chain(sustain).max().unwrap_or(0)
}

/// Key down for `hold` ticks, then up, then run `tail` more ticks
fn key(gen: &mut EnvelopeGenerator<'_, MockPwm, MockTimer>, hold: usize, tail: usize) {
    gen.request_tone(true);
    for _ in 0..hold {
        gen.tick();
    }
    gen.request_tone(false);
    for _ in 0..tail {
        gen.tick();
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn start_configures_pwm_and_arms_timer() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::default(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);

    assert!(gen.start());

    let log = pwm.log();
    assert_eq!(log.wrap, PWM_WRAP);
    assert!(log.phase_correct);
    assert!(log.enabled);
    assert_eq!(pwm.last_level(), Some(PWM_MID_RAIL));
    assert!(timer.is_armed());
    assert_eq!(timer.period_us(), TICK_PERIOD_US);
    assert_eq!(TICK_PERIOD_US, 89);
}

#[test]
fn start_twice_arms_once() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::default(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);
    assert!(gen.start());
    assert!(gen.start());
    assert_eq!(timer.arm_calls(), 1);
}

#[test]
fn start_failure_leaves_generator_inert() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::exhausted(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);

    assert!(!gen.start());
    assert!(!gen.is_running());
    assert!(!pwm.is_enabled());

    pwm.clear_levels();
    key(&mut gen, 200, 200);
    assert!(pwm.levels().is_empty());
}

#[test]
fn stop_is_safe_when_never_started() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::default(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);
    gen.stop();
    assert!(!gen.is_running());
    assert!(!timer.is_armed());
    assert_eq!(pwm.last_level(), Some(PWM_MID_RAIL));
}

#[test]
fn stop_mid_tone_parks_at_mid_rail() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::default(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);
    gen.start();
    gen.request_tone(true);
    for _ in 0..100 {
        gen.tick();
    }
    assert_eq!(gen.shaper().phase(), Phase::Sustain);

    gen.stop();
    assert!(!timer.is_armed());
    assert!(!pwm.is_enabled());
    assert!(!latch.is_set());
    assert_eq!(pwm.last_level(), Some(PWM_MID_RAIL));
    assert_eq!(gen.shaper().phase(), Phase::Idle);
}

#[test]
fn request_tone_has_no_immediate_effect() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::default(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);
    gen.start();
    pwm.clear_levels();

    gen.request_tone(true);
    assert!(latch.is_set());
    assert_eq!(gen.shaper().phase(), Phase::Idle);
    assert!(pwm.levels().is_empty());
}

// ============================================================================
// Shaping Tests
// ============================================================================

#[test]
fn keyed_sequence_is_attack_sustain_release() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::default(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);
    gen.start();
    pwm.clear_levels();

    // idle tick + attack + 40 sustain ticks held, then released
    key(&mut gen, 1 + KEYCLICK_LEN + 40, 200);

    let levels = pwm.levels();
    assert_eq!(levels[0], PWM_MID_RAIL);

    let attack: Vec<u16> = KEYCLICK.iter().map(|&r| attenuate(r)).collect();
    assert_eq!(&levels[1..=KEYCLICK_LEN], attack.as_slice());

    // released inside the third sustain cycle, which still completes
    let sustain_start = 1 + KEYCLICK_LEN;
    for (i, &level) in levels[sustain_start..sustain_start + 3 * SUSTAIN_LEN].iter().enumerate() {
        assert_eq!(level, attenuate(SUSTAIN[i % SUSTAIN_LEN]));
    }

    let release_start = sustain_start + 3 * SUSTAIN_LEN;
    let release: Vec<u16> = KEYCLICK.iter().rev().map(|&r| attenuate(r)).collect();
    assert_eq!(&levels[release_start..release_start + KEYCLICK_LEN], release.as_slice());

    assert!(levels[release_start + KEYCLICK_LEN..].iter().all(|&l| l == PWM_MID_RAIL));
    assert_eq!(gen.shaper().phase(), Phase::Idle);
}

#[test]
fn non_idle_sample_count_is_whole_cycles() {
    for k in 1..=4 {
        let mut shaper = EnvelopeShaper::new();
        shaper.advance(true);
        let mut active = 0;
        let mut ticks = 0;
        // hold until k sustain cycles have started
        while !(shaper.phase() == Phase::Sustain && shaper.index() == 0 && active == KEYCLICK_LEN + (k - 1) * SUSTAIN_LEN) {
            shaper.advance(true);
            active += 1;
            ticks += 1;
            assert!(ticks < 10_000);
        }
        while shaper.phase() != Phase::Idle {
            shaper.advance(false);
            active += 1;
        }
        assert_eq!(active, KEYCLICK_LEN + k * SUSTAIN_LEN + KEYCLICK_LEN, "k = {k}");
    }
}

#[test]
fn short_tap_still_plays_one_full_cycle() {
    let mut shaper = EnvelopeShaper::new();
    shaper.advance(true);
    let mut active = 0;
    while shaper.phase() != Phase::Idle || active == 0 {
        shaper.advance(false);
        active += 1;
    }
    assert_eq!(active, KEYCLICK_LEN + SUSTAIN_LEN + KEYCLICK_LEN);
}

#[test]
fn samples_never_step_more_than_the_tables() {
    let (pwm, timer, latch) = (MockPwm::default(), MockTimer::default(), ToneLatch::new());
    let mut gen = generator(&pwm, &timer, &latch);
    gen.start();

    for hold in [1, 30, 70, 123, 300] {
        key(&mut gen, hold, 300);
    }

    let bound = largest_table_step();
    let levels = pwm.levels();
    for w in levels.windows(2) {
        assert!(w[0].abs_diff(w[1]) <= bound, "{} -> {}", w[0], w[1]);
    }
    assert_eq!(levels.last(), Some(&PWM_MID_RAIL));
}

#[test]
fn samples_stay_attenuated() {
    let lowest = attenuate(0);
    let highest = attenuate(PWM_WRAP);
    for &raw in KEYCLICK.iter().chain(SUSTAIN.iter()) {
        let s = attenuate(raw);
        assert!(s >= lowest && s <= highest);
    }
    assert!(highest - PWM_MID_RAIL <= 64);
}

#[test]
fn key_up_latency_is_at_most_one_cycle() {
    let mut shaper = EnvelopeShaper::new();
    shaper.advance(true);
    for _ in 0..KEYCLICK_LEN + 5 {
        shaper.advance(true);
    }
    let mut ticks = 0;
    while shaper.phase() == Phase::Sustain {
        shaper.advance(false);
        ticks += 1;
    }
    assert!(ticks <= SUSTAIN_LEN);
    assert_eq!(shaper.phase(), Phase::Release);
}

// ============================================================================
// Tick Gate Tests
// ============================================================================

#[test]
fn tick_gate_arms_only_at_its_period() {
    let gate = TickGate::new(TICK_PERIOD_US);
    let mut handle = &gate;
    assert!(handle.arm(TICK_PERIOD_US + 1).is_err());
    assert!(!gate.is_armed());

    assert!(handle.arm(TICK_PERIOD_US).is_ok());
    assert!(gate.is_armed());
    handle.disarm();
    assert!(!gate.is_armed());
    assert_eq!(gate.rate_hz(), 1_000_000 / TICK_PERIOD_US);
}

#[test]
fn generator_runs_on_a_tick_gate() {
    let pwm = MockPwm::default();
    let gate = TickGate::new(TICK_PERIOD_US);
    let latch = ToneLatch::new();
    let mut gen = EnvelopeGenerator::new(pwm.clone(), &gate, &latch);

    assert!(Sidetone::start(&mut gen));
    assert!(gate.is_armed());
    Sidetone::stop(&mut gen);
    assert!(!gate.is_armed());
}
