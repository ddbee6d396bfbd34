// Author: Lukas Bower
//! SRAM-slot Ethernet MAC driver for the controller SoC.

#![allow(unsafe_code)]

use core::ptr::{read_volatile, write_volatile};

use smoltcp::phy::{Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use crate::net::{EthernetMac, MAX_FRAME_LEN};

use super::CSR_BASE;

const ETHMAC_BASE: usize = CSR_BASE + 0x1800;
const ETHMAC_SRAM_BASE: usize = 0xB000_0000;

/// Offset (in bytes) to the RX slot index register.
pub const SRAM_WRITER_SLOT_OFFSET: usize = 0x00;
/// Offset (in bytes) to the RX frame length register.
pub const SRAM_WRITER_LENGTH_OFFSET: usize = 0x04;
/// Offset (in bytes) to the RX event pending register.
pub const SRAM_WRITER_EV_PENDING_OFFSET: usize = 0x08;
/// Offset (in bytes) to the TX start command register.
pub const SRAM_READER_START_OFFSET: usize = 0x0C;
/// Offset (in bytes) to the TX ready flag register.
pub const SRAM_READER_READY_OFFSET: usize = 0x10;
/// Offset (in bytes) to the TX slot index register.
pub const SRAM_READER_SLOT_OFFSET: usize = 0x14;
/// Offset (in bytes) to the TX frame length register.
pub const SRAM_READER_LENGTH_OFFSET: usize = 0x18;

const EV_SRAM_WRITER: u32 = 1 << 0;
const SLOT_SIZE: usize = 2048;
const RX_SLOTS: usize = 2;

fn reg_read(offset: usize) -> u32 {
    unsafe { read_volatile((ETHMAC_BASE + offset) as *const u32) }
}

fn reg_write(offset: usize, value: u32) {
    unsafe { write_volatile((ETHMAC_BASE + offset) as *mut u32, value) };
}

fn rx_slot(index: usize) -> &'static [u8] {
    let base = ETHMAC_SRAM_BASE + (index % RX_SLOTS) * SLOT_SIZE;
    unsafe { core::slice::from_raw_parts(base as *const u8, SLOT_SIZE) }
}

fn tx_slot() -> &'static mut [u8] {
    let base = ETHMAC_SRAM_BASE + RX_SLOTS * SLOT_SIZE;
    unsafe { core::slice::from_raw_parts_mut(base as *mut u8, SLOT_SIZE) }
}

/// MAC front-end exchanging frames through dedicated SRAM slots.
#[derive(Debug, Default)]
pub struct SramMac {
    rx_frames: u64,
    tx_frames: u64,
}

impl SramMac {
    /// Claim the Ethernet MAC CSR block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames moved through the MAC since reset, as `(rx, tx)`.
    #[must_use]
    pub fn frame_counts(&self) -> (u64, u64) {
        (self.rx_frames, self.tx_frames)
    }
}

impl EthernetMac for SramMac {
    fn rx_event_pending(&self) -> bool {
        reg_read(SRAM_WRITER_EV_PENDING_OFFSET) & EV_SRAM_WRITER != 0
    }

    fn ack_rx_event(&mut self) {
        reg_write(SRAM_WRITER_EV_PENDING_OFFSET, EV_SRAM_WRITER);
    }
}

/// Receive token reading one frame out of its SRAM slot.
pub struct SramRxToken {
    mac: *mut SramMac,
    slot: usize,
    len: usize,
}

impl RxToken for SramRxToken {
    fn consume<R, F>(self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        let mac = unsafe { &mut *self.mac };
        mac.rx_frames = mac.rx_frames.wrapping_add(1);
        let slot = rx_slot(self.slot);
        let len = self.len.min(slot.len());
        f(&slot[..len])
    }
}

/// Transmit token staging one frame into the TX SRAM slot.
pub struct SramTxToken {
    mac: *mut SramMac,
}

impl TxToken for SramTxToken {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let mac = unsafe { &mut *self.mac };
        let slot = tx_slot();
        let len = len.min(slot.len());
        let result = f(&mut slot[..len]);
        while reg_read(SRAM_READER_READY_OFFSET) == 0 {}
        reg_write(SRAM_READER_SLOT_OFFSET, 0);
        reg_write(SRAM_READER_LENGTH_OFFSET, len as u32);
        reg_write(SRAM_READER_START_OFFSET, 1);
        mac.tx_frames = mac.tx_frames.wrapping_add(1);
        result
    }
}

impl Device for SramMac {
    type RxToken<'a>
        = SramRxToken
    where
        Self: 'a;
    type TxToken<'a>
        = SramTxToken
    where
        Self: 'a;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        if !self.rx_event_pending() {
            return None;
        }
        let slot = reg_read(SRAM_WRITER_SLOT_OFFSET) as usize;
        let len = reg_read(SRAM_WRITER_LENGTH_OFFSET) as usize;
        let mac = self as *mut SramMac;
        Some((SramRxToken { mac, slot, len }, SramTxToken { mac }))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if reg_read(SRAM_READER_READY_OFFSET) == 0 {
            return None;
        }
        Some(SramTxToken {
            mac: self as *mut SramMac,
        })
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = MAX_FRAME_LEN;
        caps.max_burst_size = Some(1);
        caps.medium = Medium::Ethernet;
        caps
    }
}
