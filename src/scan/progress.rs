//! Scan progress reporting. Purely observational.

use std::cell::Cell;
use std::time::Instant;

use crate::util::format_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Walking,
    Extracting,
    Writing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Walking => "walking",
            Phase::Extracting => "reading metadata",
            Phase::Writing => "writing",
        }
    }
}

pub trait ProgressSink {
    fn phase(&self, phase: Phase, total: usize);
    /// Running count of entries discovered by the walker.
    fn entries_seen(&self, count: usize);
    fn finished(&self, inserted: usize, bytes: u64);
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn phase(&self, _phase: Phase, _total: usize) {}
    fn entries_seen(&self, _count: usize) {}
    fn finished(&self, _inserted: usize, _bytes: u64) {}
}

/// Prints to stderr, throttled to every `every` entries.
pub struct ConsoleProgress {
    every: usize,
    start: Instant,
    last: Cell<usize>,
}

impl ConsoleProgress {
    pub fn new(every: usize) -> Self {
        ConsoleProgress {
            every: every.max(1),
            start: Instant::now(),
            last: Cell::new(0),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        ConsoleProgress::new(1_000)
    }
}

impl ProgressSink for ConsoleProgress {
    fn phase(&self, phase: Phase, total: usize) {
        if total > 0 {
            eprintln!("{} ({total} entries)...", phase.as_str());
        } else {
            eprintln!("{}...", phase.as_str());
        }
    }

    fn entries_seen(&self, count: usize) {
        if count >= self.last.get() + self.every {
            self.last.set(count);
            eprintln!(
                "  {count} entries, {:.1}s",
                self.start.elapsed().as_secs_f64()
            );
        }
    }

    fn finished(&self, inserted: usize, bytes: u64) {
        eprintln!(
            "done: {inserted} new entries, {}, {:.2}s",
            format_bytes(bytes),
            self.start.elapsed().as_secs_f64()
        );
    }
}
