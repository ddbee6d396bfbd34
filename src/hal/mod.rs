// Author: Lukas Bower
// Purpose: Hardware collaborator traits consumed by the boot core.

//! Lightweight hardware abstraction decoupling the boot sequencer from the
//! controller's peripherals.
//!
//! The abstraction intentionally exposes only the operations the boot core
//! depends on: a bounded key/value read from persistent storage, the
//! identifier clock, the diagnostic countdown timer, the readiness indicator,
//! and the opaque subsystems (control plane, monitor, RF bridge, payload
//! core loader) the sequencer starts but never looks inside.

use core::fmt;

/// Upper bound on the byte length of a value held by the persistent store.
///
/// Candidate buffers handed to [`ConfigStore::read`] stay strictly below this
/// so a text terminator always fits on the storage side.
pub const CONFIG_VALUE_MAX: usize = 32;

/// Errors surfaced by [`ConfigStore::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The key is not present in the store.
    Missing,
    /// The stored value does not fit the caller's buffer.
    Truncated,
    /// The underlying storage driver reported a failure.
    Storage,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "config key missing"),
            Self::Truncated => write!(f, "config value exceeds caller buffer"),
            Self::Storage => write!(f, "persistent storage fault"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Bounded key/value reads from the persistent configuration store.
pub trait ConfigStore {
    /// Read the value stored under `key` into `buf`.
    ///
    /// Returns the number of bytes written. Every failure mode (absent key,
    /// storage fault, value larger than `buf`) is an `Err`; callers in the
    /// boot core treat all of them as "keep the compiled default".
    fn read(&mut self, key: &str, buf: &mut [u8]) -> Result<usize, ConfigError>;
}

/// Monotonic clock plus the hardware identifier-frequency register.
///
/// `now_ticks` counts in the identifier-frequency domain and backs the
/// bounded spin-waits of early boot; `now_ms` is the millisecond timebase the
/// protocol stack and event pump run on.
pub trait Clock {
    /// One-time hardware initialisation of the timebase.
    fn init(&mut self) {}

    /// Frequency of the identifier clock in Hz.
    fn identifier_hz(&self) -> u32;

    /// Current tick count in the identifier-frequency domain.
    fn now_ticks(&self) -> u64;

    /// Milliseconds since an arbitrary boot-time origin.
    fn now_ms(&self) -> u64;

    /// Bounded-wait predicate: has `deadline` (in ticks) passed?
    fn elapsed(&self, deadline: u64) -> bool {
        self.now_ticks() >= deadline
    }
}

/// Hardware countdown timer used by the test-mode gate.
pub trait CountdownTimer {
    /// Load `ticks` and start counting down.
    fn arm(&mut self, ticks: u32);

    /// Latch and read the live countdown value; zero once expired.
    fn remaining(&mut self) -> u32;
}

/// Operator-visible readiness indicator (LED bank on the real board).
pub trait Indicator {
    /// Drive the indicator on or off.
    fn set(&mut self, on: bool);
}

/// Remote control-server subsystem started once and serviced every pump
/// iteration. `service` must be non-blocking.
pub trait ControlPlane {
    /// One-time subsystem initialisation during bring-up.
    fn init(&mut self);

    /// Discard any session state left over from a previous connection.
    fn reset_sessions(&mut self);

    /// Bounded, non-blocking service call invoked once per pump iteration.
    fn service(&mut self);
}

/// Monitor/injection subsystem; the core only initialises it.
pub trait Monitor {
    /// One-time subsystem initialisation during bring-up.
    fn init(&mut self);
}

/// Bridge electronics driving the RF outputs.
pub trait RfBridge {
    /// Power the bridge up.
    fn start(&mut self);

    /// Program every DDS channel to its reset state.
    fn init_dds_channels(&mut self);
}

/// Loader for the payload core; halted before network bring-up so the
/// control plane owns it from a known state.
pub trait CoreLoader {
    /// Stop the payload core.
    fn halt(&mut self);
}

/// Diagnostic mode entered when the test-mode gate fires; runs forever.
pub trait DiagnosticMode {
    /// Hand the machine to the interactive diagnostics. Never returns.
    fn run(&mut self) -> !;
}

/// Control plane stub used until the control-server build is linked in.
#[derive(Debug, Default)]
pub struct InertControlPlane {
    serviced: u64,
}

impl InertControlPlane {
    /// Number of service calls observed; used by host diagnostics.
    #[must_use]
    pub fn serviced(&self) -> u64 {
        self.serviced
    }
}

impl ControlPlane for InertControlPlane {
    fn init(&mut self) {}

    fn reset_sessions(&mut self) {}

    fn service(&mut self) {
        self.serviced = self.serviced.saturating_add(1);
    }
}

/// Monitor stub used until the monitor/injection build is linked in.
#[derive(Debug, Default)]
pub struct InertMonitor;

impl Monitor for InertMonitor {
    fn init(&mut self) {}
}
