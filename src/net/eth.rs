// Author: Lukas Bower
// Purpose: Bring up the Ethernet interface from the resolved identity.

//! smoltcp-backed Ethernet transport.
//!
//! Bring-up configures the interface from the loader's [`NetworkIdentity`],
//! registers the gateway as the default route, marks the interface
//! administratively up and then its link state up. There is no handshake;
//! the link counts as up once those steps complete. Afterwards the event
//! pump drives the interface through [`EthernetLink::service_timers`] and
//! one-frame-per-iteration ingress.

use log::warn;
use smoltcp::iface::{Config as IfaceConfig, Interface, SocketSet, SocketStorage};
use smoltcp::phy::Device;
use smoltcp::time::Instant;
use smoltcp::wire::{EthernetAddress, HardwareAddress, IpAddress, IpCidr, Ipv4Address};

use super::LinkState;
use crate::netcfg::NetworkIdentity;

const RANDOM_SEED: u64 = 0x73d1_21aa_9c0f_4be6;
const DEFAULT_PREFIX: u8 = 24;

/// Ethernet MAC driver contract consumed by the link.
///
/// Extends the smoltcp device model with the hardware receive-event flag the
/// event pump polls and clears each iteration.
pub trait EthernetMac: Device {
    /// Whether the MAC signals a pending receive event.
    fn rx_event_pending(&self) -> bool;

    /// Acknowledge and clear the pending receive event.
    fn ack_rx_event(&mut self);
}

/// A brought-up Ethernet interface and the MAC beneath it.
pub struct EthernetLink<M: EthernetMac> {
    device: M,
    iface: Interface,
    sockets: SocketSet<'static>,
    admin_up: bool,
    link_up: bool,
    frames_ingested: u64,
}

impl<M: EthernetMac> EthernetLink<M> {
    /// Configure the interface from `identity` and mark it up.
    ///
    /// The identity's netmask is converted to a prefix length; a mask that
    /// is not a contiguous prefix falls back to /24 with a warning, never a
    /// boot failure.
    pub fn bring_up(
        mut device: M,
        identity: &NetworkIdentity,
        sockets: &'static mut [SocketStorage<'static>],
        now_ms: u64,
    ) -> Self {
        let mut config = IfaceConfig::new(HardwareAddress::Ethernet(identity.mac));
        config.random_seed = RANDOM_SEED;

        let mut iface = Interface::new(config, &mut device, timestamp(now_ms));
        let prefix = netmask_prefix(identity.netmask).unwrap_or_else(|| {
            warn!(
                "eth: netmask {} is not a contiguous prefix, using /{}",
                identity.netmask, DEFAULT_PREFIX
            );
            DEFAULT_PREFIX
        });
        iface.update_ip_addrs(|addrs| {
            let cidr = IpCidr::new(IpAddress::Ipv4(identity.local_ip), prefix);
            if addrs.push(cidr).is_err() {
                addrs[0] = cidr;
            }
        });
        if iface
            .routes_mut()
            .add_default_ipv4_route(identity.gateway)
            .is_err()
        {
            warn!("eth: default route table full, gateway not registered");
        }

        let mut link = Self {
            device,
            iface,
            sockets: SocketSet::new(&mut sockets[..]),
            admin_up: false,
            link_up: false,
            frames_ingested: 0,
        };
        link.admin_up = true;
        link.link_up = true;
        link
    }

    /// Link state; `Up` immediately after bring-up, never revisited.
    #[must_use]
    pub fn state(&self) -> LinkState {
        match (self.admin_up, self.link_up) {
            (true, true) => LinkState::Up,
            (true, false) => LinkState::Initializing,
            _ => LinkState::Down,
        }
    }

    /// Run the stack's software timers (retransmission, ARP aging) and any
    /// pending egress without touching ingress.
    pub fn service_timers(&mut self, now_ms: u64) {
        let _ = self
            .iface
            .poll_egress(timestamp(now_ms), &mut self.device, &mut self.sockets);
    }

    /// Whether the MAC reports a pending receive event.
    #[must_use]
    pub fn rx_pending(&self) -> bool {
        self.device.rx_event_pending()
    }

    /// Drain exactly one received frame into the stack's packet-input path,
    /// then clear the hardware receive event.
    pub fn ingest_one(&mut self, now_ms: u64) {
        let _ = self
            .iface
            .poll_ingress_single(timestamp(now_ms), &mut self.device, &mut self.sockets);
        self.device.ack_rx_event();
        self.frames_ingested = self.frames_ingested.saturating_add(1);
    }

    /// Hardware address the interface was configured with.
    #[must_use]
    pub fn hardware_address(&self) -> EthernetAddress {
        match self.iface.hardware_addr() {
            HardwareAddress::Ethernet(addr) => addr,
        }
    }

    /// Frames drained into the stack since bring-up.
    #[must_use]
    pub fn frames_ingested(&self) -> u64 {
        self.frames_ingested
    }
}

fn timestamp(now_ms: u64) -> Instant {
    Instant::from_millis(i64::try_from(now_ms).unwrap_or(i64::MAX))
}

fn netmask_prefix(mask: Ipv4Address) -> Option<u8> {
    let bits = u32::from_be_bytes(mask.octets());
    let ones = bits.leading_ones();
    if bits.checked_shl(ones).unwrap_or(0) == 0 {
        Some(ones as u8)
    } else {
        None
    }
}
