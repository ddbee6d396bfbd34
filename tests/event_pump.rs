// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate event-pump ordering and per-iteration work bounds.
// Author: Lukas Bower

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use siderite_runtime::event::EventPump;
use siderite_runtime::hal::ControlPlane;
use siderite_runtime::net::TransportServices;
use siderite_runtime::serial::Uart;

type Journal = Arc<Mutex<Vec<&'static str>>>;

struct RecordingUart {
    journal: Journal,
    input: VecDeque<u8>,
}

impl embedded_io::ErrorType for RecordingUart {
    type Error = core::convert::Infallible;
}

impl Uart for RecordingUart {
    fn read_available(&mut self) -> bool {
        !self.input.is_empty()
    }

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        self.journal.lock().unwrap().push("uart_read");
        self.input.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, _byte: u8) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

struct RecordingTransports {
    journal: Journal,
    eth_frames_pending: u32,
    ppp: bool,
}

impl TransportServices<RecordingUart> for RecordingTransports {
    fn service_timers(&mut self, _now_ms: u64, _uart: &mut RecordingUart) {
        self.journal.lock().unwrap().push("timers");
    }

    fn eth_rx_pending(&self) -> bool {
        self.eth_frames_pending > 0
    }

    fn eth_ingest_one(&mut self, _now_ms: u64) {
        self.journal.lock().unwrap().push("eth_ingest");
        self.eth_frames_pending -= 1;
    }

    fn ppp_active(&self) -> bool {
        self.ppp
    }

    fn ppp_feed(&mut self, _byte: u8, _uart: &mut RecordingUart) {
        self.journal.lock().unwrap().push("ppp_feed");
    }
}

struct RecordingControl {
    journal: Journal,
}

impl ControlPlane for RecordingControl {
    fn init(&mut self) {}

    fn reset_sessions(&mut self) {}

    fn service(&mut self) {
        self.journal.lock().unwrap().push("control");
    }
}

fn pump_with(
    eth_frames_pending: u32,
    ppp: bool,
    input: &[u8],
) -> (EventPump<RecordingTransports, RecordingUart, RecordingControl>, Journal) {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let uart = RecordingUart {
        journal: Arc::clone(&journal),
        input: input.iter().copied().collect(),
    };
    let transports = RecordingTransports {
        journal: Arc::clone(&journal),
        eth_frames_pending,
        ppp,
    };
    let control = RecordingControl {
        journal: Arc::clone(&journal),
    };
    (EventPump::new(transports, uart, control), journal)
}

#[test]
fn iteration_order_is_invariant() {
    let (mut pump, journal) = pump_with(2, true, b"ab");

    pump.service(0);
    pump.service(1);
    pump.service(2);

    let expected = [
        // Everything pending: all four steps, strictly ordered.
        "timers", "eth_ingest", "uart_read", "ppp_feed", "control",
        "timers", "eth_ingest", "uart_read", "ppp_feed", "control",
        // Nothing pending: the unconditional steps still run in order.
        "timers", "control",
    ];
    assert_eq!(journal.lock().unwrap().as_slice(), expected);
}

#[test]
fn at_most_one_frame_and_one_byte_per_iteration() {
    let (mut pump, _journal) = pump_with(5, true, b"abc");

    pump.service(0);
    let t = pump.telemetry();
    assert_eq!(t.eth_frames, 1);
    assert_eq!(t.ppp_bytes, 1);

    pump.service(1);
    let t = pump.telemetry();
    assert_eq!(t.eth_frames, 2);
    assert_eq!(t.ppp_bytes, 2);
    assert_eq!(t.iterations, 2);
}

#[test]
fn uart_is_left_alone_without_a_ppp_decoder() {
    let (mut pump, journal) = pump_with(0, false, b"zz");
    pump.service(0);
    let journal = journal.lock().unwrap();
    assert_eq!(journal.as_slice(), ["timers", "control"]);
    assert_eq!(pump.telemetry().ppp_bytes, 0);
}
