// Author: Lukas Bower
// Purpose: Diagnostic logger feeding the UART console until steady state.

//! Boot-time diagnostic logging backend.
//!
//! Implements the `log` facade over a caller-installed UART sink. Once the
//! boot sequencer hands the UART to the event pump the sink is sealed:
//! further records still land in the in-RAM ring ([`crate::logring`]) but no
//! byte reaches the UART again, keeping diagnostics from interleaving with
//! PPP framing.

use core::fmt::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};
use portable_atomic::{AtomicU8, Ordering};
use spin::Mutex;

use crate::logring::{self, LOG_LINE_CAPACITY};

/// Errors raised while transitioning the diagnostic logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The global `log` facade is owned by a foreign logger.
    FacadeUnavailable,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SinkState {
    Uninitialised = 0,
    Active = 1,
    Sealed = 2,
}

static STATE: AtomicU8 = AtomicU8::new(SinkState::Uninitialised as u8);
static SINK: Mutex<Option<fn(&str)>> = Mutex::new(None);

fn state() -> SinkState {
    match STATE.load(Ordering::Acquire) {
        1 => SinkState::Active,
        2 => SinkState::Sealed,
        _ => SinkState::Uninitialised,
    }
}

struct DiagLogger;

static LOGGER: DiagLogger = DiagLogger;

impl Log for DiagLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut line: heapless::String<LOG_LINE_CAPACITY> = heapless::String::new();
        let _ = write!(
            line,
            "[{level} {target}] {message}",
            level = record.level(),
            target = record.target(),
            message = record.args(),
        );
        logring::append(&line);
        if state() == SinkState::Active {
            if let Some(sink) = *SINK.lock() {
                sink(&line);
            }
        }
    }

    fn flush(&self) {}
}

/// Install `sink` as the UART console writer and claim the `log` facade.
///
/// Re-initialisation replaces the sink and reopens a sealed logger; this
/// only happens in host tests, the firmware initialises exactly once.
pub fn init(sink: fn(&str)) -> Result<(), Error> {
    *SINK.lock() = Some(sink);
    if state() == SinkState::Uninitialised && log::set_logger(&LOGGER).is_err() {
        return Err(Error::FacadeUnavailable);
    }
    log::set_max_level(LevelFilter::Info);
    STATE.store(SinkState::Active as u8, Ordering::Release);
    Ok(())
}

/// Permanently stop writing diagnostics to the UART sink.
///
/// The boot sequencer calls this immediately before entering the event pump;
/// from that point the UART carries PPP traffic only. Ring capture continues.
pub fn seal() {
    STATE.store(SinkState::Sealed as u8, Ordering::Release);
}

/// Whether the UART sink has been sealed.
#[must_use]
pub fn is_sealed() -> bool {
    state() == SinkState::Sealed
}
