// Author: Lukas Bower
// Purpose: Resolve the controller's network identity from persistent storage.

//! Network identity loader.
//!
//! Each identity field is read from the persistent store independently and
//! validated as a complete text; any read failure or malformed candidate
//! keeps that field's compiled default. The policy is "fail to default,
//! never fail to boot": nothing here returns an error to the sequencer.

use log::warn;
use smoltcp::wire::{EthernetAddress, Ipv4Address};
use static_assertions::const_assert;

use crate::hal::{ConfigStore, CONFIG_VALUE_MAX};

/// Compiled default hardware address.
pub const DEFAULT_MAC: EthernetAddress =
    EthernetAddress([0x10, 0xe2, 0xd5, 0x32, 0x50, 0x00]);
/// Compiled default local address.
pub const DEFAULT_LOCAL_IP: Ipv4Address = Ipv4Address::new(192, 168, 0, 42);
/// Compiled default netmask.
pub const DEFAULT_NETMASK: Ipv4Address = Ipv4Address::new(255, 255, 255, 0);
/// Compiled default gateway.
pub const DEFAULT_GATEWAY: Ipv4Address = Ipv4Address::new(192, 168, 0, 1);

/// Storage keys holding the four identity fields.
pub const KEY_MAC: &str = "mac";
/// Key for the local address.
pub const KEY_IP: &str = "ip";
/// Key for the netmask.
pub const KEY_NETMASK: &str = "netmask";
/// Key for the gateway address.
pub const KEY_GATEWAY: &str = "gateway";

// Candidate buffer stays strictly below the storage bound so the store side
// always has room for a terminator.
const CANDIDATE_CAPACITY: usize = CONFIG_VALUE_MAX - 1;
const_assert!(CANDIDATE_CAPACITY < CONFIG_VALUE_MAX);

const MAC_TEXT_LEN: usize = 17;

/// Resolved network identity of this boot.
///
/// Invariant: every field is either the compiled default or a value that
/// passed full-text validation; fields are never partially applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdentity {
    /// 6-byte hardware address.
    pub mac: EthernetAddress,
    /// Local interface address.
    pub local_ip: Ipv4Address,
    /// Interface netmask.
    pub netmask: Ipv4Address,
    /// Default gateway address.
    pub gateway: Ipv4Address,
}

impl NetworkIdentity {
    /// Identity built purely from the compiled defaults.
    #[must_use]
    pub const fn compiled_default() -> Self {
        Self {
            mac: DEFAULT_MAC,
            local_ip: DEFAULT_LOCAL_IP,
            netmask: DEFAULT_NETMASK,
            gateway: DEFAULT_GATEWAY,
        }
    }
}

impl Default for NetworkIdentity {
    fn default() -> Self {
        Self::compiled_default()
    }
}

/// Load the network identity, falling back to the compiled default for any
/// field whose stored candidate is absent, unreadable, or malformed.
///
/// Loading twice against unchanged storage yields identical results; the
/// loader caches nothing.
pub fn load<S: ConfigStore>(store: &mut S) -> NetworkIdentity {
    let mut identity = NetworkIdentity::compiled_default();

    if let Some(mac) = read_candidate(store, KEY_MAC).and_then(|c| parse_mac(c.as_text())) {
        identity.mac = mac;
    }
    if let Some(ip) = read_candidate(store, KEY_IP).and_then(|c| parse_ipv4(c.as_text())) {
        identity.local_ip = ip;
    }
    if let Some(mask) =
        read_candidate(store, KEY_NETMASK).and_then(|c| parse_ipv4(c.as_text()))
    {
        identity.netmask = mask;
    }
    if let Some(gw) = read_candidate(store, KEY_GATEWAY).and_then(|c| parse_ipv4(c.as_text()))
    {
        identity.gateway = gw;
    }

    identity
}

struct Candidate {
    buf: [u8; CANDIDATE_CAPACITY],
    len: usize,
}

impl Candidate {
    fn as_text(&self) -> &str {
        // read_candidate only constructs UTF-8-checked candidates.
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

fn read_candidate<S: ConfigStore>(store: &mut S, key: &str) -> Option<Candidate> {
    let mut buf = [0u8; CANDIDATE_CAPACITY];
    match store.read(key, &mut buf) {
        Ok(len) if len > 0 && len <= CANDIDATE_CAPACITY => {
            if core::str::from_utf8(&buf[..len]).is_err() {
                warn!("netcfg: value for '{key}' is not text, keeping default");
                return None;
            }
            Some(Candidate { buf, len })
        }
        Ok(_) => None,
        Err(err) => {
            warn!("netcfg: read of '{key}' failed ({err}), keeping default");
            None
        }
    }
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Parse a hardware address of exactly six 2-hex-digit groups joined by `:`.
///
/// The whole text is validated as a unit; trailing bytes reject the
/// candidate.
pub fn parse_mac(text: &str) -> Option<EthernetAddress> {
    let bytes = text.as_bytes();
    if bytes.len() != MAC_TEXT_LEN {
        return None;
    }
    let mut mac = [0u8; 6];
    for (i, octet) in mac.iter_mut().enumerate() {
        let hi = hex_nibble(bytes[3 * i])?;
        let lo = hex_nibble(bytes[3 * i + 1])?;
        *octet = (hi << 4) | lo;
    }
    for i in 0..5 {
        if bytes[3 * i + 2] != b':' {
            return None;
        }
    }
    Some(EthernetAddress(mac))
}

/// Parse a strict dotted-quad address; anything else rejects the candidate.
pub fn parse_ipv4(text: &str) -> Option<Ipv4Address> {
    text.parse::<Ipv4Address>().ok()
}
