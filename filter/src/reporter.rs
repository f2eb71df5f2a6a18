//! Periodic sampling metrics
//!
//! A background task wakes on a fixed interval, snapshots the counters and
//! hands a [`SamplingReport`] to every configured sink. It never touches the
//! record path: the only shared state is the atomic counters.

use crate::counters::{SamplingCounters, SamplingReport};
use crate::error::FilterError;
use crate::sinks::ReportSink;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default time between two reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(30);

pub struct MetricsReporter {
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MetricsReporter {
    /// Spawn the reporting loop on the current tokio runtime.
    ///
    /// The loop stops when `shutdown` is cancelled, either by the owner of
    /// the token (e.g. the host process on SIGTERM) or via [`Self::shutdown`].
    /// The first report fires one full interval after start. Fails with
    /// [`FilterError::NoRuntime`] when called outside a tokio runtime.
    pub fn start(
        counters: Arc<SamplingCounters>,
        sinks: Vec<Arc<dyn ReportSink>>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Result<Self, FilterError> {
        let runtime = Handle::try_current()?;
        let cancel = shutdown.child_token();
        let task_cancel = cancel.clone();
        // tokio intervals panic on a zero period
        let interval = interval.max(Duration::from_millis(1));

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let report = SamplingReport::from(counters.snapshot());
                        emit(&sinks, &report);
                    }
                }
            }
            info!("terminating periodic sampling metrics");
        });

        Ok(Self {
            cancel,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the loop and wait for it to exit. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(h) = handle {
            if let Err(e) = h.await {
                warn!("periodic sampling metrics task failed: {}", e);
            }
            info!("closing periodic sampling metrics");
        }
    }
}

impl Drop for MetricsReporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for MetricsReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsReporter")
            .field("running", &self.is_running())
            .finish()
    }
}

fn emit(sinks: &[Arc<dyn ReportSink>], report: &SamplingReport) {
    for sink in sinks {
        if let Err(e) = sink.emit(report) {
            warn!("sampling report to {} sink failed: {}", sink.name(), e);
        }
    }
}
