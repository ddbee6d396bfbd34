// Author: Lukas Bower
// Purpose: Cooperative event pump driving transports and the control plane.

//! Steady-state event pump.
//!
//! Single-threaded and cooperative; one [`EventPump::service`] call performs
//! the fixed iteration the controller runs until hardware reset, strictly in
//! order:
//!
//! 1. service every pending software timer of the protocol stack,
//! 2. drain at most one received Ethernet frame and clear the receive event,
//! 3. read at most one UART byte and feed it to the PPP decoder,
//! 4. invoke the control plane's non-blocking service call once.
//!
//! No step blocks waiting for more data; each either does bounded work or is
//! a no-op when nothing is pending. The one-byte-per-iteration UART policy
//! keeps PPP framing and stack timers responsive while the control plane is
//! busy. There is no exit condition.

use crate::hal::{Clock, ControlPlane};
use crate::net::TransportServices;
use crate::serial::Uart;

/// Counters the pump maintains for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpTelemetry {
    /// Completed pump iterations.
    pub iterations: u64,
    /// Ethernet frames drained into the stack.
    pub eth_frames: u64,
    /// UART bytes fed to the PPP decoder.
    pub ppp_bytes: u64,
}

/// The steady-state dispatcher; owns the transports, the UART, and the
/// control plane for the remainder of the process.
pub struct EventPump<T, U, C> {
    transports: T,
    uart: U,
    control: C,
    telemetry: PumpTelemetry,
}

impl<T, U, C> EventPump<T, U, C>
where
    U: Uart,
    T: TransportServices<U>,
    C: ControlPlane,
{
    /// Assemble the pump from the bring-up results.
    pub fn new(transports: T, uart: U, control: C) -> Self {
        Self {
            transports,
            uart,
            control,
            telemetry: PumpTelemetry::default(),
        }
    }

    /// Run one pump iteration at `now_ms`.
    pub fn service(&mut self, now_ms: u64) {
        self.transports.service_timers(now_ms, &mut self.uart);

        if self.transports.eth_rx_pending() {
            self.transports.eth_ingest_one(now_ms);
            self.telemetry.eth_frames = self.telemetry.eth_frames.saturating_add(1);
        }

        if self.transports.ppp_active() && self.uart.read_available() {
            if let Ok(byte) = self.uart.read_byte() {
                self.transports.ppp_feed(byte, &mut self.uart);
                self.telemetry.ppp_bytes = self.telemetry.ppp_bytes.saturating_add(1);
            }
        }

        self.control.service();
        self.telemetry.iterations = self.telemetry.iterations.saturating_add(1);
    }

    /// Run forever; termination is a hardware reset.
    pub fn run<K: Clock>(&mut self, clock: &K) -> ! {
        loop {
            self.service(clock.now_ms());
        }
    }

    /// Snapshot of the pump counters.
    #[must_use]
    pub fn telemetry(&self) -> PumpTelemetry {
        self.telemetry
    }

    /// The transports, for host diagnostics after bounded pump runs.
    #[must_use]
    pub fn transports(&self) -> &T {
        &self.transports
    }

    /// The control plane, for host diagnostics after bounded pump runs.
    #[must_use]
    pub fn control(&self) -> &C {
        &self.control
    }
}
