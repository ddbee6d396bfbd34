// Author: Lukas Bower
// Purpose: Transport capability set and the event-pump service seam.

//! Networking transports for the boot core.
//!
//! Hardware presence is resolved exactly once at bring-up into a
//! [`TransportSet`]; the event pump then drives whatever is present through
//! the [`TransportServices`] seam without re-checking hardware anywhere else.
//! Once a transport is up it is never reconfigured or brought back down;
//! reconfiguration requires a reboot.

pub mod eth;
pub mod ppp;

use smoltcp::iface::SocketStorage;

pub use eth::{EthernetLink, EthernetMac};
pub use ppp::{AuthMode, NullStatusHook, PppSession, PppStatusHook};

use crate::netcfg::NetworkIdentity;
use crate::serial::Uart;

/// Largest Ethernet frame the MAC drivers exchange with the stack.
pub const MAX_FRAME_LEN: usize = 1514;

/// Administrative state of a transport link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not yet configured.
    Down,
    /// Handshake in flight.
    Initializing,
    /// Carrying traffic.
    Up,
}

/// Which transport currently owns the default route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRoute {
    /// No transport registered yet.
    None,
    /// The Ethernet interface.
    Ethernet,
    /// The serial PPP session.
    Ppp,
}

/// Transport hardware resolved at bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCapability {
    /// Ethernet MAC only.
    EthernetOnly,
    /// Serial PPP only.
    PppOnly,
    /// Both transports are live.
    Both,
}

/// Owns every live transport plus the resolved identity for this boot.
pub struct TransportSet<M: EthernetMac, H: PppStatusHook = NullStatusHook> {
    identity: NetworkIdentity,
    eth: Option<EthernetLink<M>>,
    ppp: Option<PppSession<H>>,
    default_route: DefaultRoute,
}

impl<M: EthernetMac, H: PppStatusHook> TransportSet<M, H> {
    /// Bring up every transport the board offers: Ethernet first when a MAC
    /// is present, then the PPP session over the UART.
    ///
    /// Call order is significant: both paths register the default route and
    /// the last registration wins, so PPP's is the one that persists when
    /// both transports exist.
    pub fn bring_up<U: Uart>(
        ethernet: Option<M>,
        identity: NetworkIdentity,
        sockets: &'static mut [SocketStorage<'static>],
        uart: &mut U,
        hook: H,
        now_ms: u64,
    ) -> Self {
        let mut default_route = DefaultRoute::None;
        let eth = ethernet.map(|device| {
            let link = EthernetLink::bring_up(device, &identity, sockets, now_ms);
            default_route = DefaultRoute::Ethernet;
            link
        });

        let mut session = PppSession::create(hook);
        session.set_auth(AuthMode::None);
        default_route = DefaultRoute::Ppp;
        session.connect(uart, now_ms);

        Self {
            identity,
            eth,
            ppp: Some(session),
            default_route,
        }
    }

    /// Bring up the Ethernet interface alone (no UART transport on this
    /// board variant).
    pub fn ethernet_only(
        device: M,
        identity: NetworkIdentity,
        sockets: &'static mut [SocketStorage<'static>],
        now_ms: u64,
    ) -> Self {
        let link = EthernetLink::bring_up(device, &identity, sockets, now_ms);
        Self {
            identity,
            eth: Some(link),
            ppp: None,
            default_route: DefaultRoute::Ethernet,
        }
    }

    /// The capability set resolved at bring-up.
    #[must_use]
    pub fn capability(&self) -> TransportCapability {
        match (self.eth.is_some(), self.ppp.is_some()) {
            (true, true) => TransportCapability::Both,
            (true, false) => TransportCapability::EthernetOnly,
            _ => TransportCapability::PppOnly,
        }
    }

    /// Transport holding the default route.
    #[must_use]
    pub fn default_route(&self) -> DefaultRoute {
        self.default_route
    }

    /// Identity resolved by the loader for this boot.
    #[must_use]
    pub fn identity(&self) -> &NetworkIdentity {
        &self.identity
    }

    /// The Ethernet link, when the board has a MAC.
    #[must_use]
    pub fn ethernet(&self) -> Option<&EthernetLink<M>> {
        self.eth.as_ref()
    }

    /// The PPP session, when the board has a UART transport.
    #[must_use]
    pub fn ppp_session(&self) -> Option<&PppSession<H>> {
        self.ppp.as_ref()
    }

    /// Service every pending software timer of the protocol stack.
    pub fn service_timers<U: Uart>(&mut self, now_ms: u64, uart: &mut U) {
        if let Some(eth) = self.eth.as_mut() {
            eth.service_timers(now_ms);
        }
        if let Some(ppp) = self.ppp.as_mut() {
            ppp.service_timers(uart, now_ms);
        }
    }

    /// Whether the Ethernet hardware reports a pending receive event.
    #[must_use]
    pub fn eth_rx_pending(&self) -> bool {
        self.eth.as_ref().is_some_and(EthernetLink::rx_pending)
    }

    /// Drain exactly one received frame into the stack, then clear the
    /// hardware receive event.
    pub fn eth_ingest_one(&mut self, now_ms: u64) {
        if let Some(eth) = self.eth.as_mut() {
            eth.ingest_one(now_ms);
        }
    }

    /// Whether a PPP byte-decoder is attached to the UART.
    #[must_use]
    pub fn ppp_active(&self) -> bool {
        self.ppp.is_some()
    }

    /// Feed one received UART byte to the PPP decoder.
    pub fn ppp_feed<U: Uart>(&mut self, byte: u8, uart: &mut U) {
        if let Some(ppp) = self.ppp.as_mut() {
            ppp.feed_byte(byte, uart);
        }
    }
}

/// Seam between the event pump and whatever transports are live.
///
/// The pump never learns which transports exist; absent hardware turns each
/// call into a no-op.
pub trait TransportServices<U: Uart> {
    /// Service every pending software timer of the protocol stack.
    fn service_timers(&mut self, now_ms: u64, uart: &mut U);

    /// Whether the Ethernet hardware reports a pending receive event.
    fn eth_rx_pending(&self) -> bool;

    /// Drain exactly one received frame into the stack, then clear the
    /// hardware receive event.
    fn eth_ingest_one(&mut self, now_ms: u64);

    /// Whether a PPP byte-decoder is attached to the UART.
    fn ppp_active(&self) -> bool;

    /// Feed one received UART byte to the PPP decoder.
    fn ppp_feed(&mut self, byte: u8, uart: &mut U);
}

impl<M, H, U> TransportServices<U> for TransportSet<M, H>
where
    M: EthernetMac,
    H: PppStatusHook,
    U: Uart,
{
    fn service_timers(&mut self, now_ms: u64, uart: &mut U) {
        TransportSet::service_timers(self, now_ms, uart);
    }

    fn eth_rx_pending(&self) -> bool {
        TransportSet::eth_rx_pending(self)
    }

    fn eth_ingest_one(&mut self, now_ms: u64) {
        TransportSet::eth_ingest_one(self, now_ms);
    }

    fn ppp_active(&self) -> bool {
        TransportSet::ppp_active(self)
    }

    fn ppp_feed(&mut self, byte: u8, uart: &mut U) {
        TransportSet::ppp_feed(self, byte, uart);
    }
}
