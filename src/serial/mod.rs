// Author: Lukas Bower
// Purpose: Non-blocking UART primitives shared by diagnostics and PPP traffic.

//! Minimal, no-std friendly UART abstraction.
//!
//! The UART is shared between diagnostic text output during bring-up and raw
//! PPP framing once the event pump is running; the boot sequencer seals the
//! diagnostic logger before steady state so the two uses never interleave.
//! The trait mirrors the non-blocking contract the event pump needs: poll for
//! a pending byte, read exactly one, write one.

use core::fmt;

use embedded_io::{Error as EmbeddedError, ErrorKind, ErrorType};

/// Error type surfaced by board UART drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// UART reported an unrecoverable failure.
    DeviceFault,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceFault => write!(f, "serial device fault"),
        }
    }
}

impl core::error::Error for SerialError {}

impl EmbeddedError for SerialError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Byte-level UART access used by the test-mode gate, the PPP session, and
/// the event pump.
pub trait Uart: ErrorType {
    /// Whether a received byte is waiting without consuming it.
    fn read_available(&mut self) -> bool;

    /// Attempt to read a single byte from the device.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Attempt to write a single byte to the device.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;
}

/// Write an entire buffer, spinning through `WouldBlock`.
///
/// Returns the number of bytes accepted before a device fault, which equals
/// `data.len()` on the happy path. Bring-up treats faults as the transport
/// hardware's problem, so callers only log the short count.
pub fn write_all<U: Uart>(uart: &mut U, data: &[u8]) -> usize {
    for (written, &byte) in data.iter().enumerate() {
        if nb::block!(uart.write_byte(byte)).is_err() {
            return written;
        }
    }
    data.len()
}
