// Author: Lukas Bower
#![cfg_attr(all(feature = "board", not(test)), no_std)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(deprecated)]
#![warn(missing_docs)]

//! Boot and transport bring-up core for the Siderite real-time controller.
//!
//! The firmware resolves a network identity from persistent storage, brings
//! up the Ethernet and serial PPP transports, and then runs a single-threaded
//! cooperative event pump until hardware reset. Every hardware seam is a
//! trait so the whole sequence is testable under `cargo test` on the host.

#[cfg(all(target_os = "none", not(feature = "board")))]
compile_error!("enable the `board` feature when building siderite-runtime for bare-metal targets");

pub mod boot;
pub mod event;
pub mod hal;
pub mod logring;
pub mod netcfg;
pub mod net;
pub mod serial;
pub mod trace;

#[cfg(feature = "board")]
/// CSR/MMIO-backed peripheral drivers for the Siderite controller SoC.
pub mod board;

#[cfg(all(feature = "board", target_os = "none"))]
mod panic;

#[cfg(all(not(feature = "board"), not(target_os = "none")))]
/// Host-mode simulation of the boot sequence used for developer testing.
pub mod host;
