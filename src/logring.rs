// Author: Lukas Bower
// Purpose: Bounded in-RAM log ring the control plane can snapshot.

//! Bounded log ring.
//!
//! Every diagnostic line is mirrored here so the control server can ship
//! boot history to a remote operator without touching the UART. The ring
//! keeps the most recent lines and silently drops the oldest.

use heapless::{Deque, String as HeaplessString, Vec as HeaplessVec};
use spin::Mutex;

/// Maximum number of codepoints retained per ring line.
pub const LOG_LINE_CAPACITY: usize = 160;
/// Number of lines retained before the oldest is dropped.
pub const LOG_RING_CAPACITY: usize = 64;
/// Upper bound on lines returned by [`snapshot`].
pub const LOG_SNAPSHOT_LINES: usize = 32;

struct LogRing {
    lines: Deque<HeaplessString<LOG_LINE_CAPACITY>, LOG_RING_CAPACITY>,
}

impl LogRing {
    const fn new() -> Self {
        Self { lines: Deque::new() }
    }

    fn push_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        let mut entry: HeaplessString<LOG_LINE_CAPACITY> = HeaplessString::new();
        let _ = entry.push_str(line);
        if self.lines.is_full() {
            let _ = self.lines.pop_front();
        }
        let _ = self.lines.push_back(entry);
    }
}

static RING: Mutex<LogRing> = Mutex::new(LogRing::new());

/// Append one line to the ring, truncating to [`LOG_LINE_CAPACITY`].
pub fn append(line: &str) {
    RING.lock().push_line(line);
}

/// Copy out the most recent lines, oldest first.
#[must_use]
pub fn snapshot() -> HeaplessVec<HeaplessString<LOG_LINE_CAPACITY>, LOG_SNAPSHOT_LINES> {
    let ring = RING.lock();
    let mut out: HeaplessVec<HeaplessString<LOG_LINE_CAPACITY>, LOG_SNAPSHOT_LINES> =
        HeaplessVec::new();
    let skip = ring.lines.len().saturating_sub(LOG_SNAPSHOT_LINES);
    for line in ring.lines.iter().skip(skip) {
        let _ = out.push(line.clone());
    }
    out
}

/// Discard every retained line.
pub fn clear() {
    let mut ring = RING.lock();
    while ring.lines.pop_front().is_some() {}
}
