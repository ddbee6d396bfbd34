// Author: Lukas Bower
// Purpose: Wire the CSR peripheral drivers into the boot sequence.

//! Siderite controller SoC support.
//!
//! The SoC exposes its peripherals as CSR blocks on a shared bus; each
//! driver below owns one block and implements the corresponding HAL trait.
//! [`bring_up`] is the firmware entry called from the reset vector: it
//! unmasks interrupts, installs the diagnostic logger over the UART, and
//! hands every peripheral to the boot sequencer.

#![allow(unsafe_code)]

pub mod bridge;
pub mod clock;
pub mod flash;
#[cfg(target_os = "none")]
mod heap;
pub mod leds;
pub mod ethmac;
pub mod timer;
pub mod uart;

use portable_atomic::{AtomicBool, Ordering};
use smoltcp::iface::SocketStorage;

use crate::boot::{self, BootHardware};
use crate::hal::{InertControlPlane, InertMonitor};
use crate::trace;

/// CSR bus window.
pub const CSR_BASE: usize = 0xE000_0000;
/// Interrupt controller mask register.
const IRQ_MASK_REG: usize = CSR_BASE + 0x0010;

const SOCKET_CAPACITY: usize = 4;

static SOCKET_STORAGE_IN_USE: AtomicBool = AtomicBool::new(false);
static mut SOCKET_STORAGE: [SocketStorage<'static>; SOCKET_CAPACITY] =
    [SocketStorage::EMPTY; SOCKET_CAPACITY];

fn socket_storage() -> &'static mut [SocketStorage<'static>] {
    assert!(
        !SOCKET_STORAGE_IN_USE.swap(true, Ordering::AcqRel),
        "socket storage already claimed"
    );
    // Guarded by the flag above; claimed at most once per boot.
    unsafe { &mut *core::ptr::addr_of_mut!(SOCKET_STORAGE) }
}

fn unmask_interrupts() {
    // Interrupt handling itself lives in the peripheral drivers; the core
    // only opens the global mask.
    unsafe { core::ptr::write_volatile(IRQ_MASK_REG as *mut u32, u32::MAX) };
}

/// Firmware entry point for the controller board. Never returns.
pub fn bring_up() -> ! {
    unmask_interrupts();
    #[cfg(target_os = "none")]
    heap::init();
    let _ = trace::init(uart::debug_puts);

    let hw = BootHardware {
        clock: clock::CsrClock::new(),
        countdown: timer::CsrCountdown::new(),
        indicator: leds::CsrLeds::new(),
        store: flash::FlashStore::new(),
        uart: uart::CsrUart::new(),
        ethernet: Some(ethmac::SramMac::new()),
        control: InertControlPlane::default(),
        monitor: InertMonitor,
        bridge: bridge::CsrRfBridge::new(),
        loader: bridge::CsrCoreLoader::new(),
        diag: bridge::BoardDiag,
    };
    boot::run(hw, socket_storage())
}
