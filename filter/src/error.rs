//! Error types for the sampling filter
//!
//! Only construction and sink output can fail. Processing a record never does.

use thiserror::Error;

/// Construction-time failures
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid report interval {value:?}: {reason}")]
    InvalidInterval { value: String, reason: String },

    #[error("failed to open report sink: {0}")]
    Sink(#[from] SinkError),

    #[error("periodic reporter needs a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Failure writing a report to a sink. Logged by the reporter, never
/// propagated to record processing.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics encoding failed: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
