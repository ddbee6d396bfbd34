// Author: Lukas Bower
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Siderite runtime entry point.
//!
//! On the controller board this jumps straight into the boot sequencer and
//! never returns. On a development host it runs the bounded boot simulation
//! so the bring-up path can be exercised without hardware.

#[cfg(all(not(target_os = "none"), not(feature = "board")))]
fn main() -> anyhow::Result<()> {
    siderite_runtime::host::main()
}

#[cfg(all(not(target_os = "none"), feature = "board"))]
fn main() {
    eprintln!("board builds target bare metal; run without --features board for the host simulation");
}

#[cfg(target_os = "none")]
#[allow(unsafe_code)]
mod entry {
    #[no_mangle]
    pub extern "C" fn _start() -> ! {
        siderite_runtime::board::bring_up()
    }
}
