// Author: Lukas Bower
//! RF bridge, payload-core loader, and diagnostic-mode peripherals.

#![allow(unsafe_code)]

use core::ptr::write_volatile;

use log::info;

use crate::hal::{CoreLoader, DiagnosticMode, RfBridge};

use super::CSR_BASE;

const BRIDGE_BASE: usize = CSR_BASE + 0x1C00;
const KLOADER_BASE: usize = CSR_BASE + 0x2000;

/// Offset (in bytes) to the bridge power/control register.
pub const BRIDGE_CTRL_OFFSET: usize = 0x00;
/// Offset (in bytes) to the DDS channel-select register.
pub const BRIDGE_DDS_SEL_OFFSET: usize = 0x04;
/// Offset (in bytes) to the DDS reset-strobe register.
pub const BRIDGE_DDS_RESET_OFFSET: usize = 0x08;
/// Offset (in bytes) to the payload-core run register.
pub const KLOADER_RUN_OFFSET: usize = 0x00;

const DDS_CHANNEL_COUNT: u32 = 8;

fn bridge_write(offset: usize, value: u32) {
    unsafe { write_volatile((BRIDGE_BASE + offset) as *mut u32, value) };
}

/// Bridge electronics behind the RF outputs.
#[derive(Debug, Default)]
pub struct CsrRfBridge {
    _private: (),
}

impl CsrRfBridge {
    /// Claim the bridge CSR block.
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl RfBridge for CsrRfBridge {
    fn start(&mut self) {
        bridge_write(BRIDGE_CTRL_OFFSET, 1);
    }

    fn init_dds_channels(&mut self) {
        for channel in 0..DDS_CHANNEL_COUNT {
            bridge_write(BRIDGE_DDS_SEL_OFFSET, channel);
            bridge_write(BRIDGE_DDS_RESET_OFFSET, 1);
        }
    }
}

/// Run/halt control for the payload core.
#[derive(Debug, Default)]
pub struct CsrCoreLoader {
    _private: (),
}

impl CsrCoreLoader {
    /// Claim the loader CSR block.
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl CoreLoader for CsrCoreLoader {
    fn halt(&mut self) {
        unsafe { write_volatile((KLOADER_BASE + KLOADER_RUN_OFFSET) as *mut u32, 0) };
    }
}

/// Board diagnostic mode: parks the core until the interactive diagnostics
/// image takes over or the operator resets the board.
#[derive(Debug, Default)]
pub struct BoardDiag;

impl DiagnosticMode for BoardDiag {
    fn run(&mut self) -> ! {
        info!("diagnostics: waiting for operator, reset to leave");
        loop {
            core::hint::spin_loop();
        }
    }
}
