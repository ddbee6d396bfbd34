// Author: Lukas Bower
//! LED bank driver used as the boot readiness indicator.

#![allow(unsafe_code)]

use core::ptr::write_volatile;

use crate::hal::Indicator;

use super::CSR_BASE;

const LEDS_BASE: usize = CSR_BASE + 0x1400;

/// Offset (in bytes) to the LED output register.
pub const OUT_OFFSET: usize = 0x00;

/// LED bank on the front panel.
#[derive(Debug, Default)]
pub struct CsrLeds {
    _private: (),
}

impl CsrLeds {
    /// Claim the LED CSR block.
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Indicator for CsrLeds {
    fn set(&mut self, on: bool) {
        unsafe {
            write_volatile((LEDS_BASE + OUT_OFFSET) as *mut u32, u32::from(on));
        }
    }
}
