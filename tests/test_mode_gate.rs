// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate the test-mode gate countdown and trigger handling.
// Author: Lukas Bower

use std::cell::Cell;
use std::collections::VecDeque;

use siderite_runtime::boot::gate::{self, BootMode};
use siderite_runtime::hal::{Clock, CountdownTimer, Indicator};
use siderite_runtime::serial::Uart;

const GATE_HZ: u32 = 400;

struct MockClock {
    ticks: Cell<u64>,
}

impl MockClock {
    fn new() -> Self {
        Self { ticks: Cell::new(0) }
    }
}

impl Clock for MockClock {
    fn identifier_hz(&self) -> u32 {
        GATE_HZ
    }

    fn now_ticks(&self) -> u64 {
        let now = self.ticks.get() + 1;
        self.ticks.set(now);
        now
    }

    fn now_ms(&self) -> u64 {
        self.now_ticks()
    }
}

#[derive(Default)]
struct MockCountdown {
    remaining: u32,
    arms: u32,
    polls: u32,
}

impl CountdownTimer for MockCountdown {
    fn arm(&mut self, ticks: u32) {
        self.remaining = ticks;
        self.arms += 1;
    }

    fn remaining(&mut self) -> u32 {
        self.polls += 1;
        let value = self.remaining;
        self.remaining = self.remaining.saturating_sub(1);
        value
    }
}

#[derive(Default)]
struct MockUart {
    input: VecDeque<u8>,
}

impl embedded_io::ErrorType for MockUart {
    type Error = core::convert::Infallible;
}

impl Uart for MockUart {
    fn read_available(&mut self) -> bool {
        !self.input.is_empty()
    }

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        self.input.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, _byte: u8) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Default)]
struct MockIndicator {
    states: Vec<bool>,
}

impl Indicator for MockIndicator {
    fn set(&mut self, on: bool) {
        self.states.push(on);
    }
}

#[test]
fn trigger_byte_before_expiry_selects_test_mode() {
    for trigger in [b't', b'T'] {
        let clock = MockClock::new();
        let mut countdown = MockCountdown::default();
        let mut uart = MockUart::default();
        uart.input.push_back(trigger);
        assert_eq!(
            gate::check(&clock, &mut countdown, &mut uart),
            BootMode::Test
        );
        assert!(countdown.remaining > 0, "trigger must beat the countdown");
    }
}

#[test]
fn expiry_without_trigger_selects_regular_mode() {
    let clock = MockClock::new();
    let mut countdown = MockCountdown::default();
    let mut uart = MockUart::default();
    assert_eq!(
        gate::check(&clock, &mut countdown, &mut uart),
        BootMode::Regular
    );
    // Armed at a quarter of the identifier frequency, in timer ticks.
    assert_eq!(countdown.arms, 1);
    assert_eq!(countdown.polls, GATE_HZ / 4 + 1);
}

#[test]
fn other_bytes_are_discarded_without_resetting_the_countdown() {
    let clock = MockClock::new();
    let mut countdown = MockCountdown::default();
    let mut uart = MockUart::default();
    uart.input.extend([b'x', b'q', b'9']);
    assert_eq!(
        gate::check(&clock, &mut countdown, &mut uart),
        BootMode::Regular
    );
    assert!(uart.input.is_empty(), "noise bytes are consumed");
    assert_eq!(countdown.arms, 1, "noise must not re-arm the countdown");
}

#[test]
fn late_trigger_still_wins_over_noise() {
    let clock = MockClock::new();
    let mut countdown = MockCountdown::default();
    let mut uart = MockUart::default();
    uart.input.extend([b'x', b'y', b't']);
    assert_eq!(
        gate::check(&clock, &mut countdown, &mut uart),
        BootMode::Test
    );
}

#[test]
fn readiness_blink_toggles_three_full_cycles() {
    let clock = MockClock::new();
    let mut indicator = MockIndicator::default();
    gate::readiness_blink(&clock, &mut indicator);
    assert_eq!(indicator.states, [true, false, true, false, true, false]);
    // Six half-cycles of a tenth of the identifier frequency each.
    assert!(clock.ticks.get() >= u64::from(GATE_HZ / 10) * 6);
}
