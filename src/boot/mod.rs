// Author: Lukas Bower
// Purpose: Order the boot sequence from power-up to the event pump.

//! Boot sequencer.
//!
//! Orders the fixed bring-up: clock init, hardware bring-up (RF bridge, DDS
//! channels, payload core halt), the test-mode gate, and on the regular path
//! the identity load, transport bring-up, control-plane and monitor init,
//! and finally the unending event pump. The sequencer exclusively owns the
//! resolved identity and the transport handles; nothing outlives the
//! process and no teardown exists.

pub mod gate;

use log::info;
use smoltcp::iface::SocketStorage;

pub use gate::BootMode;

use crate::event::EventPump;
use crate::hal::{
    Clock, ConfigStore, ControlPlane, CoreLoader, CountdownTimer, DiagnosticMode, Indicator,
    Monitor, RfBridge,
};
use crate::net::{EthernetMac, NullStatusHook, TransportSet};
use crate::netcfg;
use crate::serial::Uart;
use crate::trace;

/// Peripheral and subsystem handles the sequencer consumes.
pub struct BootHardware<K, T, I, S, U, M, C, N, B, L, D> {
    /// Timebase and identifier-frequency register.
    pub clock: K,
    /// Countdown timer backing the test-mode gate.
    pub countdown: T,
    /// Readiness indicator.
    pub indicator: I,
    /// Persistent configuration store.
    pub store: S,
    /// Shared UART: diagnostics during bring-up, PPP afterwards.
    pub uart: U,
    /// Ethernet MAC, on boards that have one.
    pub ethernet: Option<M>,
    /// Remote control-server subsystem.
    pub control: C,
    /// Monitor/injection subsystem.
    pub monitor: N,
    /// RF bridge electronics.
    pub bridge: B,
    /// Payload core loader.
    pub loader: L,
    /// Interactive diagnostics entered when the gate fires.
    pub diag: D,
}

/// Run the full boot sequence. Never returns; the event pump (or the
/// diagnostic mode) owns the machine until hardware reset.
pub fn run<K, T, I, S, U, M, C, N, B, L, D>(
    hw: BootHardware<K, T, I, S, U, M, C, N, B, L, D>,
    sockets: &'static mut [SocketStorage<'static>],
) -> !
where
    K: Clock,
    T: CountdownTimer,
    I: Indicator,
    S: ConfigStore,
    U: Uart,
    M: EthernetMac,
    C: ControlPlane,
    N: Monitor,
    B: RfBridge,
    L: CoreLoader,
    D: DiagnosticMode,
{
    let BootHardware {
        mut clock,
        mut countdown,
        mut indicator,
        mut store,
        mut uart,
        ethernet,
        control,
        mut monitor,
        mut bridge,
        mut loader,
        mut diag,
    } = hw;

    info!(
        "siderite runtime {} built {}",
        env!("CARGO_PKG_VERSION"),
        env!("SIDERITE_BUILD_STAMP")
    );

    clock.init();
    bridge.start();
    bridge.init_dds_channels();
    loader.halt();

    info!("press 't' to enter test mode...");
    gate::readiness_blink(&clock, &mut indicator);

    match gate::check(&clock, &mut countdown, &mut uart) {
        BootMode::Test => {
            info!("entering test mode");
            diag.run()
        }
        BootMode::Regular => {
            info!("entering regular mode");
            let mut pump =
                regular_bring_up(&clock, &mut store, uart, ethernet, control, &mut monitor, sockets);
            pump.run(&clock)
        }
    }
}

/// Regular-path bring-up: identity load, transport bring-up (Ethernet before
/// PPP so PPP's default-route registration persists), control-plane and
/// monitor init, session reset, and the diagnostic-logger seal.
///
/// Returns the assembled pump; [`run`] drives it forever, host tests drive
/// it for a bounded number of iterations.
pub fn regular_bring_up<K, S, U, M, C, N>(
    clock: &K,
    store: &mut S,
    mut uart: U,
    ethernet: Option<M>,
    mut control: C,
    monitor: &mut N,
    sockets: &'static mut [SocketStorage<'static>],
) -> EventPump<TransportSet<M>, U, C>
where
    K: Clock,
    S: ConfigStore,
    U: Uart,
    M: EthernetMac,
    C: ControlPlane,
    N: Monitor,
{
    let identity = netcfg::load(store);
    info!(
        "net: mac {} ip {} mask {} gw {}",
        identity.mac, identity.local_ip, identity.netmask, identity.gateway
    );

    if ethernet.is_some() {
        info!("accepting sessions on Ethernet");
    }
    info!("accepting sessions on serial (PPP)");
    let transports = TransportSet::bring_up(
        ethernet,
        identity,
        sockets,
        &mut uart,
        NullStatusHook,
        clock.now_ms(),
    );

    control.init();
    monitor.init();
    control.reset_sessions();

    // From here the UART belongs to PPP; diagnostics continue into the ring
    // only.
    trace::seal();

    EventPump::new(transports, uart, control)
}
