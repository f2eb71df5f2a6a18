//! Admission decision for a single record

use crate::threshold::Threshold;
use std::sync::Arc;

/// Outcome of one admission decision. Only lives long enough to update the
/// counters and feed debug logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub rate: f64,
    pub threshold: f64,
    pub accepted: bool,
}

#[derive(Clone)]
pub struct AdmissionDecider {
    threshold: Arc<dyn Threshold>,
}

impl AdmissionDecider {
    pub fn new(threshold: Arc<dyn Threshold>) -> Self {
        Self { threshold }
    }

    /// Draw a fresh threshold and accept iff the rate is positive and the
    /// threshold does not exceed it.
    ///
    /// A negative rate behaves as 0, i.e. drop everything.
    pub fn accept(&self, rate: f64) -> Decision {
        let threshold = self.threshold.draw();
        Decision {
            rate,
            threshold,
            accepted: rate > 0.0 && threshold <= rate,
        }
    }
}

impl std::fmt::Debug for AdmissionDecider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionDecider").finish_non_exhaustive()
    }
}
