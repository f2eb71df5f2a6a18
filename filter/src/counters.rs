//! Lock-free counters describing the decision stream

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Annotated record that passed the admission check
    Allowed,
    /// Annotated record that was dropped
    Skipped,
    /// Record with a resolved sampling rate
    Annotated,
    /// Record without any sampling rate
    Unannotated,
}

/// Four independent monotonic counters, safe to bump from any thread.
#[derive(Debug, Default)]
pub struct SamplingCounters {
    allowed: AtomicU64,
    skipped: AtomicU64,
    annotated: AtomicU64,
    unannotated: AtomicU64,
}

impl SamplingCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, kind: CounterKind) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Read all four counters. Each value is read atomically, but the four
    /// reads are not one transaction.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            allowed: self.allowed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            annotated: self.annotated.load(Ordering::Relaxed),
            unannotated: self.unannotated.load(Ordering::Relaxed),
        }
    }

    fn counter(&self, kind: CounterKind) -> &AtomicU64 {
        match kind {
            CounterKind::Allowed => &self.allowed,
            CounterKind::Skipped => &self.skipped,
            CounterKind::Annotated => &self.annotated,
            CounterKind::Unannotated => &self.unannotated,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub allowed: u64,
    pub skipped: u64,
    pub annotated: u64,
    pub unannotated: u64,
}

impl CounterSnapshot {
    /// Fraction of annotated records that were allowed through.
    pub fn sample_pct(&self) -> f64 {
        sample_pct(self.allowed, self.skipped)
    }

    /// Total records seen by the filter.
    pub fn total(&self) -> u64 {
        self.annotated.saturating_add(self.unannotated)
    }
}

/// `allowed / (allowed + skipped)`, or 0.0 when nothing was sampled yet.
pub fn sample_pct(allowed: u64, skipped: u64) -> f64 {
    let total = allowed.saturating_add(skipped);
    if total == 0 {
        return 0.0; // avoid divide by zero
    }
    allowed as f64 / total as f64
}

/// Snapshot plus the derived percentage, as emitted by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingReport {
    #[serde(flatten)]
    pub counters: CounterSnapshot,
    pub sample_pct: f64,
}

impl From<CounterSnapshot> for SamplingReport {
    fn from(counters: CounterSnapshot) -> Self {
        Self {
            counters,
            sample_pct: counters.sample_pct(),
        }
    }
}

impl fmt::Display for SamplingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allowed: {}, skipped: {}, annotated: {}, unannotated: {}, sample_pct: {:.6}",
            self.counters.allowed,
            self.counters.skipped,
            self.counters.annotated,
            self.counters.unannotated,
            self.sample_pct
        )
    }
}
