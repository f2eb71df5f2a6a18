//! Destinations for periodic sampling reports

use crate::counters::SamplingReport;
use crate::error::SinkError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Receives every report produced by the [`MetricsReporter`](crate::reporter::MetricsReporter).
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn emit(&self, report: &SamplingReport) -> Result<(), SinkError>;
}

/// Writes reports to the application log.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn emit(&self, report: &SamplingReport) -> Result<(), SinkError> {
        let c = &report.counters;
        info!(
            allowed = c.allowed,
            skipped = c.skipped,
            annotated = c.annotated,
            unannotated = c.unannotated,
            sample_pct = report.sample_pct,
            "periodic sampling metrics: {}",
            report
        );
        Ok(())
    }
}

/// Appends one timestamped line per report to a file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn emit(&self, report: &SamplingReport) -> Result<(), SinkError> {
        let line = format!(
            "{} {}\n",
            dropsample_shared::utils::time::rfc3339_now(),
            report
        );
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Mirrors reports into the Prometheus gauges in [`crate::metrics`].
#[derive(Debug, Default)]
pub struct PrometheusSink;

impl ReportSink for PrometheusSink {
    fn name(&self) -> &'static str {
        "prometheus"
    }

    fn emit(&self, report: &SamplingReport) -> Result<(), SinkError> {
        crate::metrics::record_report(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::CounterSnapshot;

    fn report() -> SamplingReport {
        SamplingReport::from(CounterSnapshot {
            allowed: 1,
            skipped: 1,
            annotated: 2,
            unannotated: 5,
        })
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampling.log");

        let sink = FileSink::open(&path).unwrap();
        sink.emit(&report()).unwrap();
        sink.emit(&report()).unwrap();
        drop(sink);

        // Reopening keeps what was already written.
        let sink = FileSink::open(&path).unwrap();
        sink.emit(&report()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert!(line.ends_with(
                "allowed: 1, skipped: 1, annotated: 2, unannotated: 5, sample_pct: 0.500000"
            ));
        }
    }

    #[test]
    fn test_file_sink_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("sampling.log");
        assert!(matches!(FileSink::open(missing), Err(SinkError::Io(_))));
    }

    #[test]
    fn test_log_and_prometheus_sinks_accept_reports() {
        assert!(LogSink.emit(&report()).is_ok());
        assert!(PrometheusSink.emit(&report()).is_ok());
        assert_eq!(LogSink.name(), "log");
        assert_eq!(PrometheusSink.name(), "prometheus");
    }
}
