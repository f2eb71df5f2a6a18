//! The drop-sampling processor
//!
//! For every record: resolve a sampling rate, and if there is one, draw a
//! threshold and forward or drop the record accordingly. Records without a
//! rate are always forwarded. Counters are bumped on every path so the
//! reporter can describe the decision stream.

use crate::config::FilterConfig;
use crate::counters::{CounterKind, CounterSnapshot, SamplingCounters};
use crate::decider::{AdmissionDecider, Decision};
use crate::error::FilterError;
use crate::processor::Processor;
use crate::reporter::MetricsReporter;
use crate::resolver::RateResolver;
use crate::sinks::{FileSink, LogSink, PrometheusSink, ReportSink};
use crate::threshold::{RandomThreshold, Threshold};
use dropsample_shared::LogRecord;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct DropSampling {
    resolver: RateResolver,
    decider: AdmissionDecider,
    counters: Arc<SamplingCounters>,
    reporter: Option<MetricsReporter>,
}

impl DropSampling {
    /// Build the processor and start its periodic reporter.
    ///
    /// Fails outside a tokio runtime. The reporter stops when `shutdown` is
    /// cancelled or [`DropSampling::shutdown`] is called.
    pub fn new(config: &FilterConfig, shutdown: CancellationToken) -> Result<Self, FilterError> {
        let interval = config.report_interval()?;
        let threshold = match config.seed {
            Some(seed) => RandomThreshold::new(seed),
            None => RandomThreshold::from_clock(),
        };
        info!(
            seed = threshold.seed(),
            interval = ?interval,
            "creating drop_sampling processor"
        );

        let mut sinks: Vec<Arc<dyn ReportSink>> = Vec::new();
        if config.log_reports {
            sinks.push(Arc::new(LogSink));
        }
        if config.prometheus {
            sinks.push(Arc::new(PrometheusSink));
        }
        if let Some(path) = &config.report_file {
            sinks.push(Arc::new(FileSink::open(path)?));
        }

        let stage = Self::with_threshold(
            RateResolver::new(config.resolver.clone()),
            Arc::new(threshold),
        );
        let reporter = MetricsReporter::start(stage.counters.clone(), sinks, interval, shutdown)?;
        Ok(Self {
            reporter: Some(reporter),
            ..stage
        })
    }

    /// Build the processor around an explicit threshold source, without a
    /// background reporter.
    pub fn with_threshold(resolver: RateResolver, threshold: Arc<dyn Threshold>) -> Self {
        Self {
            resolver,
            decider: AdmissionDecider::new(threshold),
            counters: Arc::new(SamplingCounters::new()),
            reporter: None,
        }
    }

    /// Look for the sampling rate for this record.
    pub fn find_sampling(&self, record: &LogRecord) -> (f64, bool) {
        self.resolver.find_sampling(record)
    }

    pub fn accept(&self, rate: f64) -> Decision {
        self.decider.accept(rate)
    }

    pub fn counters(&self) -> Arc<SamplingCounters> {
        self.counters.clone()
    }

    /// Current values of the four counters.
    pub fn provide_metrics(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Stop the periodic reporter, if one was started.
    pub async fn shutdown(&self) {
        if let Some(reporter) = &self.reporter {
            reporter.shutdown().await;
        }
    }
}

impl Processor for DropSampling {
    fn name(&self) -> &'static str {
        "drop_sampling"
    }

    fn run(&self, record: LogRecord) -> Option<LogRecord> {
        let (rate, found) = self.find_sampling(&record);
        if !found {
            self.counters.increment(CounterKind::Unannotated);
            return Some(record);
        }
        self.counters.increment(CounterKind::Annotated);

        let decision = self.accept(rate);
        debug!(
            target: "drop_sampling",
            rate = decision.rate,
            threshold = decision.threshold,
            accepted = decision.accepted,
            "sampling decision"
        );

        if decision.accepted {
            self.counters.increment(CounterKind::Allowed);
            return Some(record);
        }

        self.counters.increment(CounterKind::Skipped);
        None
    }
}

impl std::fmt::Debug for DropSampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropSampling")
            .field("resolver", &self.resolver)
            .field("counters", &self.counters.snapshot())
            .field("reporter", &self.reporter)
            .finish()
    }
}
