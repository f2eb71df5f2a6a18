//! Prometheus gauges mirroring the sampling counters

use crate::counters::SamplingReport;
use crate::error::SinkError;
use once_cell::sync::Lazy;
use prometheus::{register_gauge, register_int_gauge, Encoder, Gauge, IntGauge, TextEncoder};

// ── Decision counters ────────────────────────────────────────────────────────

pub static ALLOWED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "dropsample_allowed",
        "Annotated records allowed through the filter"
    )
    .expect("dropsample_allowed registers once")
});

pub static SKIPPED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("dropsample_skipped", "Annotated records dropped by the filter")
        .expect("dropsample_skipped registers once")
});

pub static ANNOTATED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "dropsample_annotated",
        "Records carrying a resolvable sampling rate"
    )
    .expect("dropsample_annotated registers once")
});

pub static UNANNOTATED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "dropsample_unannotated",
        "Records without a sampling rate, always forwarded"
    )
    .expect("dropsample_unannotated registers once")
});

// ── Derived ──────────────────────────────────────────────────────────────────

pub static SAMPLE_PCT: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "dropsample_sample_pct",
        "Fraction of annotated records allowed through"
    )
    .expect("dropsample_sample_pct registers once")
});

/// Copy a report into the gauges.
pub fn record_report(report: &SamplingReport) {
    let c = &report.counters;
    ALLOWED.set(saturating_i64(c.allowed));
    SKIPPED.set(saturating_i64(c.skipped));
    ANNOTATED.set(saturating_i64(c.annotated));
    UNANNOTATED.set(saturating_i64(c.unannotated));
    SAMPLE_PCT.set(report.sample_pct);
}

/// Render all registered metrics to Prometheus text format.
pub fn encode_metrics() -> Result<String, SinkError> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
