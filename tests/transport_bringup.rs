// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate transport bring-up ordering and steady-state servicing.
// Author: Lukas Bower

use std::collections::VecDeque;

use siderite_runtime::net::{
    DefaultRoute, EthernetMac, LinkState, NullStatusHook, TransportCapability, TransportServices,
    TransportSet,
};
use siderite_runtime::netcfg::NetworkIdentity;
use siderite_runtime::serial::Uart;
use smoltcp::iface::SocketStorage;
use smoltcp::phy::{Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

#[derive(Default)]
struct MockUart {
    output: Vec<u8>,
}

impl embedded_io::ErrorType for MockUart {
    type Error = core::convert::Infallible;
}

impl Uart for MockUart {
    fn read_available(&mut self) -> bool {
        false
    }

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        Err(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        self.output.push(byte);
        Ok(())
    }
}

/// MAC with a scripted receive queue and a latched receive event.
#[derive(Default)]
struct FrameMac {
    rx: VecDeque<Vec<u8>>,
    pending: bool,
    sent: Vec<Vec<u8>>,
}

impl FrameMac {
    fn with_frames(frames: &[&[u8]]) -> Self {
        Self {
            rx: frames.iter().map(|f| f.to_vec()).collect(),
            pending: !frames.is_empty(),
            sent: Vec::new(),
        }
    }
}

struct FrameRxToken {
    frame: Vec<u8>,
}

impl RxToken for FrameRxToken {
    fn consume<R, F>(self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        f(&self.frame)
    }
}

struct FrameTxToken<'a> {
    sent: &'a mut Vec<Vec<u8>>,
}

impl TxToken for FrameTxToken<'_> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let mut buffer = vec![0u8; len];
        let result = f(&mut buffer);
        self.sent.push(buffer);
        result
    }
}

impl Device for FrameMac {
    type RxToken<'a>
        = FrameRxToken
    where
        Self: 'a;
    type TxToken<'a>
        = FrameTxToken<'a>
    where
        Self: 'a;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        let frame = self.rx.pop_front()?;
        Some((FrameRxToken { frame }, FrameTxToken { sent: &mut self.sent }))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        Some(FrameTxToken { sent: &mut self.sent })
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = 1514;
        caps.max_burst_size = Some(1);
        caps.medium = Medium::Ethernet;
        caps
    }
}

impl EthernetMac for FrameMac {
    fn rx_event_pending(&self) -> bool {
        self.pending
    }

    fn ack_rx_event(&mut self) {
        self.pending = !self.rx.is_empty();
    }
}

fn sockets() -> &'static mut [SocketStorage<'static>] {
    Box::leak(Box::new([SocketStorage::EMPTY; 4]))
}

// A broadcast frame with an unknown ethertype; the stack parses and drops it.
const NOISE_FRAME: [u8; 60] = {
    let mut frame = [0u8; 60];
    let mut i = 0;
    while i < 6 {
        frame[i] = 0xFF;
        i += 1;
    }
    frame[12] = 0x88;
    frame[13] = 0xB5;
    frame
};

#[test]
fn both_transports_come_up_and_ppp_owns_the_default_route() {
    let mut uart = MockUart::default();
    let identity = NetworkIdentity::compiled_default();
    let set = TransportSet::bring_up(
        Some(FrameMac::default()),
        identity,
        sockets(),
        &mut uart,
        NullStatusHook,
        0,
    );

    assert_eq!(set.capability(), TransportCapability::Both);
    assert_eq!(set.default_route(), DefaultRoute::Ppp, "last registration wins");

    let eth = set.ethernet().expect("ethernet link present");
    assert_eq!(eth.state(), LinkState::Up, "no handshake on the Ethernet path");
    assert_eq!(eth.hardware_address(), identity.mac);

    let ppp = set.ppp_session().expect("ppp session present");
    assert_eq!(ppp.state(), LinkState::Initializing, "connect initiated");
    assert!(!uart.output.is_empty(), "connect request already on the wire");

    assert_eq!(*set.identity(), identity);
}

#[test]
fn ethernet_only_boards_route_through_ethernet() {
    let set: TransportSet<FrameMac> = TransportSet::ethernet_only(
        FrameMac::default(),
        NetworkIdentity::compiled_default(),
        sockets(),
        0,
    );
    assert_eq!(set.capability(), TransportCapability::EthernetOnly);
    assert_eq!(set.default_route(), DefaultRoute::Ethernet);
    assert!(set.ppp_session().is_none());
}

#[test]
fn ingest_drains_exactly_one_frame_and_clears_the_event() {
    let mut uart = MockUart::default();
    let mac = FrameMac::with_frames(&[NOISE_FRAME.as_slice(), NOISE_FRAME.as_slice()]);
    let mut set = TransportSet::bring_up(
        Some(mac),
        NetworkIdentity::compiled_default(),
        sockets(),
        &mut uart,
        NullStatusHook,
        0,
    );

    assert!(set.eth_rx_pending());
    set.eth_ingest_one(1);
    assert!(set.eth_rx_pending(), "second frame keeps the event asserted");
    set.eth_ingest_one(2);
    assert!(!set.eth_rx_pending(), "event clears once the queue drains");
    assert_eq!(set.ethernet().unwrap().frames_ingested(), 2);
}

#[test]
fn timer_service_never_touches_ingress() {
    let mut uart = MockUart::default();
    let mac = FrameMac::with_frames(&[NOISE_FRAME.as_slice()]);
    let mut set = TransportSet::bring_up(
        Some(mac),
        NetworkIdentity::compiled_default(),
        sockets(),
        &mut uart,
        NullStatusHook,
        0,
    );

    set.service_timers(5, &mut uart);
    assert!(
        set.eth_rx_pending(),
        "timer servicing must leave received frames for the ingress step"
    );
}
