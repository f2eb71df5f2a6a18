//! Drop-sampling filter for structured log pipelines
//!
//! Each record may carry a sampling rate in its workload metadata, either in
//! an annotation or, for ingress traffic, inside the raw JSON log line. The
//! [`DropSampling`] processor resolves that rate, draws a random threshold and
//! forwards or drops the record. Four counters describe the decision stream
//! and are reported periodically by a background task.

pub mod config;
pub mod counters;
pub mod decider;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod processor;
pub mod reporter;
pub mod resolver;
pub mod sinks;
pub mod stage;
pub mod threshold;

pub use crate::config::FilterConfig;
pub use counters::{CounterKind, CounterSnapshot, SamplingCounters, SamplingReport};
pub use decider::{AdmissionDecider, Decision};
pub use error::{FilterError, SinkError};
pub use metadata::StaticMetadata;
pub use processor::{Pipeline, Processor};
pub use reporter::MetricsReporter;
pub use resolver::{RateResolver, RateSource, ResolverConfig};
pub use stage::DropSampling;
pub use threshold::{FixedThreshold, RandomThreshold, Threshold};
