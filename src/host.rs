// Author: Lukas Bower

//! Host-mode simulation of the boot sequence.
//!
//! Drives the real gate, loader, bring-up, and pump against in-memory
//! peripherals for a bounded number of iterations, then reports what the
//! firmware would have done. Useful for exercising the boot core without a
//! board on the bench.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};

use anyhow::Result as AnyhowResult;
use smoltcp::iface::SocketStorage;
use smoltcp::phy::{Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use crate::boot::{self, gate, BootMode};
use crate::event::PumpTelemetry;
use crate::hal::{
    Clock, ConfigError, ConfigStore, CountdownTimer, Indicator, InertControlPlane, InertMonitor,
};
use crate::net::{DefaultRoute, EthernetMac, LinkState};
use crate::serial::Uart;
use crate::trace;

/// Result alias used throughout the host-mode simulation.
pub type Result<T> = AnyhowResult<T>;

const SIM_IDENTIFIER_HZ: u32 = 1_000;
const SIM_TICK_STEP: u64 = 25;
const SIM_PUMP_ITERATIONS: u64 = 64;

/// Entry point for host-mode execution of the boot simulation.
pub fn main() -> Result<()> {
    let _ = trace::init(print_line);

    let mut store = MemStore::default();
    store.insert("ip", "10.0.0.42");
    store.insert("mac", "02:11:22:33:44:55");

    let clock = SimClock::new(SIM_IDENTIFIER_HZ);
    let mut countdown = SimCountdown::default();
    let mut indicator = SimIndicator::default();
    let mut uart = SimUart::default();
    let mut monitor = InertMonitor;

    log::info!(
        "siderite host simulation {} built {}",
        env!("CARGO_PKG_VERSION"),
        env!("SIDERITE_BUILD_STAMP")
    );
    gate::readiness_blink(&clock, &mut indicator);
    let mode = gate::check(&clock, &mut countdown, &mut uart);
    anyhow::ensure!(mode == BootMode::Regular, "no trigger byte was scripted");

    let sockets: &'static mut [SocketStorage<'static>] =
        Box::leak(Box::new([SocketStorage::EMPTY; 4]));
    let mut pump = boot::regular_bring_up(
        &clock,
        &mut store,
        uart,
        None::<NoMac>,
        InertControlPlane::default(),
        &mut monitor,
        sockets,
    );

    for _ in 0..SIM_PUMP_ITERATIONS {
        pump.service(clock.now_ms());
    }

    report(pump.telemetry(), pump.transports().default_route(), pump.transports().ppp_session().map(|p| p.state()));
    Ok(())
}

fn report(telemetry: PumpTelemetry, route: DefaultRoute, ppp: Option<LinkState>) {
    println!(
        "simulation done: {} iterations, default route {:?}, ppp {:?}",
        telemetry.iterations, route, ppp
    );
}

fn print_line(line: &str) {
    println!("{line}");
}

/// In-memory key/value store standing in for the flash sector.
#[derive(Debug, Default)]
pub struct MemStore {
    values: HashMap<String, Vec<u8>>,
}

impl MemStore {
    /// Insert or replace a stored value.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.as_bytes().to_vec());
    }
}

impl ConfigStore for MemStore {
    fn read(&mut self, key: &str, buf: &mut [u8]) -> core::result::Result<usize, ConfigError> {
        let value = self.values.get(key).ok_or(ConfigError::Missing)?;
        if value.len() > buf.len() {
            return Err(ConfigError::Truncated);
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }
}

/// Deterministic clock advancing a fixed step per observation.
#[derive(Debug)]
pub struct SimClock {
    hz: u32,
    ticks: Cell<u64>,
}

impl SimClock {
    /// Create a clock running at `hz` identifier ticks per second.
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self {
            hz,
            ticks: Cell::new(0),
        }
    }
}

impl Clock for SimClock {
    fn identifier_hz(&self) -> u32 {
        self.hz
    }

    fn now_ticks(&self) -> u64 {
        let now = self.ticks.get().wrapping_add(SIM_TICK_STEP);
        self.ticks.set(now);
        now
    }

    fn now_ms(&self) -> u64 {
        self.now_ticks() * 1_000 / u64::from(self.hz.max(1))
    }
}

/// Countdown expiring after a fixed number of polls.
#[derive(Debug, Default)]
pub struct SimCountdown {
    remaining: u32,
}

impl CountdownTimer for SimCountdown {
    fn arm(&mut self, ticks: u32) {
        self.remaining = ticks;
    }

    fn remaining(&mut self) -> u32 {
        let value = self.remaining;
        self.remaining = self.remaining.saturating_sub(SIM_TICK_STEP as u32);
        value
    }
}

/// Indicator counting edges instead of lighting LEDs.
#[derive(Debug, Default)]
pub struct SimIndicator {
    edges: u32,
}

impl SimIndicator {
    /// Number of on/off edges observed.
    #[must_use]
    pub fn edges(&self) -> u32 {
        self.edges
    }
}

impl Indicator for SimIndicator {
    fn set(&mut self, _on: bool) {
        self.edges += 1;
    }
}

/// UART with a scripted input queue and a captured output stream.
#[derive(Debug, Default)]
pub struct SimUart {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl SimUart {
    /// Queue bytes for the firmware to read.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Bytes the firmware wrote, in order.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl embedded_io::ErrorType for SimUart {
    type Error = core::convert::Infallible;
}

impl Uart for SimUart {
    fn read_available(&mut self) -> bool {
        !self.input.is_empty()
    }

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        self.input.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        self.output.push(byte);
        Ok(())
    }
}

/// Ethernet MAC placeholder for boards without one; never yields tokens.
#[derive(Debug, Default)]
pub struct NoMac;

/// Token type that can never be constructed.
pub enum NeverToken {}

impl RxToken for NeverToken {
    fn consume<R, F>(self, _f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        match self {}
    }
}

impl TxToken for NeverToken {
    fn consume<R, F>(self, _len: usize, _f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        match self {}
    }
}

impl Device for NoMac {
    type RxToken<'a>
        = NeverToken
    where
        Self: 'a;
    type TxToken<'a>
        = NeverToken
    where
        Self: 'a;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        None
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        None
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = 1514;
        caps.medium = Medium::Ethernet;
        caps
    }
}

impl EthernetMac for NoMac {
    fn rx_event_pending(&self) -> bool {
        false
    }

    fn ack_rx_event(&mut self) {}
}
