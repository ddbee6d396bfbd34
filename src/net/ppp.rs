// Author: Lukas Bower
// Purpose: Serial PPP session bound to the UART byte transport.

//! PPP-over-serial transport session.
//!
//! The session owns the byte-level plumbing the boot core is responsible
//! for: HDLC de-framing of one received byte at a time, FCS validation,
//! emitting the connect handshake request (with retransmission while the
//! peer stays silent), and acknowledging the peer's configuration request.
//! Negotiation beyond that — option parsing, NCP phases, authentication
//! protocols — belongs to the network-layer consumers of the link and never
//! runs here; authentication is disabled outright at bring-up.
//!
//! A status hook is registered at session creation purely as an extension
//! point. The default hook does nothing and must never abort the process.

use heapless::Vec as HeaplessVec;
use log::{debug, info};

use super::LinkState;
use crate::serial::{self, Uart};

const HDLC_FLAG: u8 = 0x7E;
const HDLC_ESCAPE: u8 = 0x7D;
const HDLC_XOR: u8 = 0x20;
const HDLC_ADDRESS: u8 = 0xFF;
const HDLC_CONTROL: u8 = 0x03;

/// Link Control Protocol identifier on the PPP wire.
pub const PROTO_LCP: u16 = 0xC021;

const LCP_CONFIGURE_REQUEST: u8 = 1;
const LCP_CONFIGURE_ACK: u8 = 2;

/// Unstuffed frame capacity: default MRU plus framing overhead.
pub const PPP_MAX_FRAME: usize = 1536;

const ECHO_OPTS_CAPACITY: usize = 128;
const TX_FRAME_CAPACITY: usize = 2 * ECHO_OPTS_CAPACITY + 64;

// Peer silence window before the configure request is resent.
const RESTART_INTERVAL_MS: u64 = 3_000;

/// Authentication modes the session can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// No authentication; the only mode the boot core uses.
    None,
    /// Password authentication, negotiated by external consumers.
    Pap,
    /// Challenge-handshake authentication, negotiated by external consumers.
    Chap,
}

/// Extension point notified on link-state transitions.
pub trait PppStatusHook {
    /// Called after the session moves to `state`. Must not abort; may log.
    fn link_changed(&mut self, state: LinkState);
}

/// Default status hook: a safe no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusHook;

impl PppStatusHook for NullStatusHook {
    fn link_changed(&mut self, _state: LinkState) {}
}

#[derive(Debug, Default)]
struct Telemetry {
    bytes_fed: u64,
    frames_dropped: u32,
    tx_short_writes: u32,
}

struct Decoder {
    buf: HeaplessVec<u8, PPP_MAX_FRAME>,
    in_escape: bool,
    overrun: bool,
}

enum DecodeEvent {
    Pending,
    Frame,
}

impl Decoder {
    const fn new() -> Self {
        Self {
            buf: HeaplessVec::new(),
            in_escape: false,
            overrun: false,
        }
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.in_escape = false;
        self.overrun = false;
    }

    fn push(&mut self, byte: u8) -> DecodeEvent {
        match byte {
            HDLC_FLAG => {
                // An escape immediately before a flag aborts the frame;
                // back-to-back flags and runts reset silently.
                if self.in_escape || self.overrun || self.buf.len() < 6 {
                    self.reset();
                    return DecodeEvent::Pending;
                }
                DecodeEvent::Frame
            }
            HDLC_ESCAPE => {
                self.in_escape = true;
                DecodeEvent::Pending
            }
            raw => {
                let byte = if self.in_escape {
                    self.in_escape = false;
                    raw ^ HDLC_XOR
                } else {
                    raw
                };
                if self.buf.push(byte).is_err() {
                    self.overrun = true;
                }
                DecodeEvent::Pending
            }
        }
    }
}

enum FrameAction {
    Discard,
    Ignore,
    Ack { id: u8 },
    PeerRequest {
        id: u8,
        opts: HeaplessVec<u8, ECHO_OPTS_CAPACITY>,
    },
}

/// PPP session over the shared UART.
pub struct PppSession<H: PppStatusHook = NullStatusHook> {
    state: LinkState,
    auth: AuthMode,
    hook: H,
    decoder: Decoder,
    request_id: u8,
    last_request_ms: u64,
    telemetry: Telemetry,
}

impl PppSession<NullStatusHook> {
    /// Create a session with the default no-op status hook.
    #[must_use]
    pub fn new() -> Self {
        Self::create(NullStatusHook)
    }
}

impl Default for PppSession<NullStatusHook> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: PppStatusHook> PppSession<H> {
    /// Create a session down, with `hook` registered for state changes.
    #[must_use]
    pub fn create(hook: H) -> Self {
        Self {
            state: LinkState::Down,
            auth: AuthMode::None,
            hook,
            decoder: Decoder::new(),
            request_id: 1,
            last_request_ms: 0,
            telemetry: Telemetry::default(),
        }
    }

    /// Configure the authentication mode; bring-up always selects
    /// [`AuthMode::None`].
    pub fn set_auth(&mut self, auth: AuthMode) {
        self.auth = auth;
    }

    /// Currently configured authentication mode.
    #[must_use]
    pub fn auth(&self) -> AuthMode {
        self.auth
    }

    /// Current link state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Initiate the connect handshake: emit a configure request and move to
    /// `Initializing`. The peer's state machine carries it from there.
    pub fn connect<U: Uart>(&mut self, uart: &mut U, now_ms: u64) {
        if self.state != LinkState::Down {
            return;
        }
        self.transition(LinkState::Initializing);
        self.send_configure_request(uart);
        self.last_request_ms = now_ms;
    }

    /// Resend the configure request while the peer stays silent.
    pub fn service_timers<U: Uart>(&mut self, uart: &mut U, now_ms: u64) {
        if self.state == LinkState::Initializing
            && now_ms.saturating_sub(self.last_request_ms) >= RESTART_INTERVAL_MS
        {
            debug!("ppp: configure request timed out, resending");
            self.send_configure_request(uart);
            self.last_request_ms = now_ms;
        }
    }

    /// Feed exactly one received UART byte to the decoder.
    pub fn feed_byte<U: Uart>(&mut self, byte: u8, uart: &mut U) {
        self.telemetry.bytes_fed = self.telemetry.bytes_fed.saturating_add(1);
        if let DecodeEvent::Frame = self.decoder.push(byte) {
            let action = parse_frame(&self.decoder.buf);
            self.decoder.reset();
            self.apply(action, uart);
        }
    }

    /// Total bytes fed to the decoder since creation.
    #[must_use]
    pub fn bytes_fed(&self) -> u64 {
        self.telemetry.bytes_fed
    }

    /// Frames dropped for bad checksums or malformed contents.
    #[must_use]
    pub fn frames_dropped(&self) -> u32 {
        self.telemetry.frames_dropped
    }

    /// Egress frames the UART accepted only partially or not at all.
    #[must_use]
    pub fn tx_short_writes(&self) -> u32 {
        self.telemetry.tx_short_writes
    }

    fn apply<U: Uart>(&mut self, action: FrameAction, uart: &mut U) {
        match action {
            FrameAction::Discard => {
                self.telemetry.frames_dropped = self.telemetry.frames_dropped.saturating_add(1);
            }
            FrameAction::Ignore => {}
            FrameAction::Ack { id } => {
                if self.state == LinkState::Initializing && id == self.request_id {
                    self.transition(LinkState::Up);
                    info!("ppp: link up");
                }
            }
            FrameAction::PeerRequest { id, opts } => {
                self.send_lcp(uart, LCP_CONFIGURE_ACK, id, &opts);
            }
        }
    }

    fn transition(&mut self, state: LinkState) {
        self.state = state;
        self.hook.link_changed(state);
    }

    fn send_configure_request<U: Uart>(&mut self, uart: &mut U) {
        let id = self.request_id;
        self.send_lcp(uart, LCP_CONFIGURE_REQUEST, id, &[]);
    }

    fn send_lcp<U: Uart>(&mut self, uart: &mut U, code: u8, id: u8, opts: &[u8]) {
        let mut packet: HeaplessVec<u8, { ECHO_OPTS_CAPACITY + 4 }> = HeaplessVec::new();
        let len = 4 + opts.len();
        let fits = packet.push(code).is_ok()
            && packet.push(id).is_ok()
            && packet.extend_from_slice(&(len as u16).to_be_bytes()).is_ok()
            && packet.extend_from_slice(opts).is_ok();
        if !fits {
            self.telemetry.tx_short_writes = self.telemetry.tx_short_writes.saturating_add(1);
            return;
        }

        let mut wire: HeaplessVec<u8, TX_FRAME_CAPACITY> = HeaplessVec::new();
        if !frame(PROTO_LCP, &packet, &mut wire) {
            self.telemetry.tx_short_writes = self.telemetry.tx_short_writes.saturating_add(1);
            return;
        }
        let written = serial::write_all(uart, &wire);
        if written != wire.len() {
            self.telemetry.tx_short_writes = self.telemetry.tx_short_writes.saturating_add(1);
        }
    }
}

/// Encode one PPPoS frame (flags, stuffing, FCS) into `out`.
///
/// Shared by the session's egress path and by test fixtures that need
/// well-formed peer frames. Returns `false` if `out` is too small.
pub fn frame<const N: usize>(proto: u16, payload: &[u8], out: &mut HeaplessVec<u8, N>) -> bool {
    let mut fcs = Fcs::new();
    let header = [
        HDLC_ADDRESS,
        HDLC_CONTROL,
        (proto >> 8) as u8,
        (proto & 0xFF) as u8,
    ];

    if out.push(HDLC_FLAG).is_err() {
        return false;
    }
    for &byte in header.iter().chain(payload) {
        fcs.update(byte);
        if !push_stuffed(byte, out) {
            return false;
        }
    }
    for byte in fcs.finish().to_le_bytes() {
        if !push_stuffed(byte, out) {
            return false;
        }
    }
    out.push(HDLC_FLAG).is_ok()
}

fn push_stuffed<const N: usize>(byte: u8, out: &mut HeaplessVec<u8, N>) -> bool {
    if byte == HDLC_FLAG || byte == HDLC_ESCAPE || byte < 0x20 {
        out.push(HDLC_ESCAPE).is_ok() && out.push(byte ^ HDLC_XOR).is_ok()
    } else {
        out.push(byte).is_ok()
    }
}

fn parse_frame(buf: &[u8]) -> FrameAction {
    let Some((fcs_bytes, body)) = buf.split_last_chunk::<2>().map(|(b, f)| (f, b)) else {
        return FrameAction::Discard;
    };
    let mut fcs = Fcs::new();
    for &byte in body {
        fcs.update(byte);
    }
    if fcs.finish() != u16::from_le_bytes(*fcs_bytes) {
        return FrameAction::Discard;
    }

    let body = match body {
        [HDLC_ADDRESS, HDLC_CONTROL, rest @ ..] => rest,
        other => other,
    };
    let [proto_hi, proto_lo, packet @ ..] = body else {
        return FrameAction::Discard;
    };
    if u16::from_be_bytes([*proto_hi, *proto_lo]) != PROTO_LCP {
        // Network-layer traffic is consumed outside the boot core.
        return FrameAction::Ignore;
    }

    let [code, id, len_hi, len_lo, data @ ..] = packet else {
        return FrameAction::Discard;
    };
    let declared = usize::from(u16::from_be_bytes([*len_hi, *len_lo]));
    if declared < 4 || declared > packet.len() {
        return FrameAction::Discard;
    }
    let opts = &data[..declared - 4];

    match *code {
        LCP_CONFIGURE_ACK => FrameAction::Ack { id: *id },
        LCP_CONFIGURE_REQUEST => {
            let mut echoed = HeaplessVec::new();
            if echoed.extend_from_slice(opts).is_err() {
                return FrameAction::Discard;
            }
            FrameAction::PeerRequest { id: *id, opts: echoed }
        }
        _ => FrameAction::Ignore,
    }
}

/// PPP FCS-16 (RFC 1662), bitwise form.
struct Fcs(u16);

impl Fcs {
    const fn new() -> Self {
        Self(0xFFFF)
    }

    fn update(&mut self, byte: u8) {
        let mut v = (self.0 ^ u16::from(byte)) & 0x00FF;
        for _ in 0..8 {
            v = if v & 1 != 0 { (v >> 1) ^ 0x8408 } else { v >> 1 };
        }
        self.0 = (self.0 >> 8) ^ v;
    }

    fn finish(&self) -> u16 {
        !self.0
    }
}
