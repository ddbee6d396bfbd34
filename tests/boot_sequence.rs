// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate the regular-path bring-up sequence end to end.
// Author: Lukas Bower

use std::sync::{Arc, Mutex};

use siderite_runtime::boot;
use siderite_runtime::hal::{Clock, ControlPlane, Monitor};
use siderite_runtime::host::{MemStore, NoMac, SimClock, SimUart};
use siderite_runtime::net::{DefaultRoute, LinkState};
use siderite_runtime::trace;
use smoltcp::iface::SocketStorage;
use smoltcp::wire::Ipv4Address;

type Journal = Arc<Mutex<Vec<&'static str>>>;

struct RecordingControl {
    journal: Journal,
}

impl ControlPlane for RecordingControl {
    fn init(&mut self) {
        self.journal.lock().unwrap().push("control_init");
    }

    fn reset_sessions(&mut self) {
        self.journal.lock().unwrap().push("session_reset");
    }

    fn service(&mut self) {
        self.journal.lock().unwrap().push("service");
    }
}

struct RecordingMonitor {
    journal: Journal,
}

impl Monitor for RecordingMonitor {
    fn init(&mut self) {
        self.journal.lock().unwrap().push("monitor_init");
    }
}

fn sockets() -> &'static mut [SocketStorage<'static>] {
    Box::leak(Box::new([SocketStorage::EMPTY; 4]))
}

#[test]
fn regular_bring_up_orders_subsystems_and_seals_diagnostics() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let clock = SimClock::new(1_000);
    let mut store = MemStore::default();
    store.insert("ip", "10.9.8.7");
    let uart = SimUart::default();
    let control = RecordingControl {
        journal: Arc::clone(&journal),
    };
    let mut monitor = RecordingMonitor {
        journal: Arc::clone(&journal),
    };

    let mut pump = boot::regular_bring_up(
        &clock,
        &mut store,
        uart,
        None::<NoMac>,
        control,
        &mut monitor,
        sockets(),
    );

    assert!(trace::is_sealed(), "no diagnostics may follow bring-up");
    assert_eq!(
        journal.lock().unwrap().as_slice(),
        ["control_init", "monitor_init", "session_reset"]
    );

    let transports = pump.transports();
    assert_eq!(transports.identity().local_ip, Ipv4Address::new(10, 9, 8, 7));
    assert_eq!(transports.default_route(), DefaultRoute::Ppp);
    assert_eq!(
        transports.ppp_session().map(|p| p.state()),
        Some(LinkState::Initializing)
    );

    for _ in 0..3 {
        pump.service(clock.now_ms());
    }
    assert_eq!(pump.telemetry().iterations, 3);
    assert_eq!(
        journal
            .lock()
            .unwrap()
            .iter()
            .filter(|&&entry| entry == "service")
            .count(),
        3,
        "the control plane is serviced exactly once per iteration"
    );
}

#[test]
fn bring_up_applies_store_overrides_and_keeps_defaults() {
    let clock = SimClock::new(1_000);
    let mut store = MemStore::default();
    store.insert("gateway", "192.168.7.1");
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));

    let pump = boot::regular_bring_up(
        &clock,
        &mut store,
        SimUart::default(),
        None::<NoMac>,
        RecordingControl {
            journal: Arc::clone(&journal),
        },
        &mut RecordingMonitor {
            journal: Arc::clone(&journal),
        },
        sockets(),
    );

    let identity = pump.transports().identity();
    assert_eq!(identity.gateway, Ipv4Address::new(192, 168, 7, 1));
    // Defaults hold for everything the store does not override.
    assert_eq!(identity.local_ip, Ipv4Address::new(192, 168, 0, 42));
    assert_eq!(identity.netmask, Ipv4Address::new(255, 255, 255, 0));
}
