//! Sampling rate discovery
//!
//! A record's sampling rate can come from two places, checked in order:
//!
//! 1. Ingress logs: when the metadata labels identify the record as coming
//!    from the ingress controller, the raw `log` field is itself a JSON
//!    document and may carry a `log_sample` rate.
//! 2. Annotations: a `sampling` annotation on the workload metadata.
//!
//! Every structural mismatch along the way means "not found" and falls
//! through to the next source. None of them are errors.

use dropsample_shared::{Fields, LogRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// Key names consulted while resolving a rate. Defaults match the
/// Kubernetes metadata layout produced by the log shipper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Top-level map holding workload metadata
    pub metadata_key: String,
    /// Label map inside the metadata
    pub labels_key: String,
    /// Label identifying the emitting application
    pub app_label: String,
    /// Label value marking ingress traffic
    pub ingress_app: String,
    /// Raw string field holding the embedded JSON log line
    pub log_field: String,
    /// Rate key inside the embedded JSON log line
    pub log_sample_key: String,
    /// Annotation map inside the metadata
    pub annotations_key: String,
    /// Rate key inside the annotations
    pub annotation_key: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            metadata_key: "kubernetes".to_string(),
            labels_key: "labels".to_string(),
            app_label: "k8s-app".to_string(),
            ingress_app: "nginx-ingress-lb".to_string(),
            log_field: "log".to_string(),
            log_sample_key: "log_sample".to_string(),
            annotations_key: "annotations".to_string(),
            annotation_key: "sampling".to_string(),
        }
    }
}

/// Where a resolved rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Ingress,
    Annotation,
}

#[derive(Debug, Clone, Default)]
pub struct RateResolver {
    config: ResolverConfig,
}

impl RateResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Look for the sampling rate of this record. Returns `(0.0, false)` when
    /// no source yields a rate.
    pub fn find_sampling(&self, record: &LogRecord) -> (f64, bool) {
        match self.resolve(record) {
            Some((rate, _)) => (rate, true),
            None => (0.0, false),
        }
    }

    /// Like [`find_sampling`](Self::find_sampling), but also reports which
    /// source won.
    pub fn resolve(&self, record: &LogRecord) -> Option<(f64, RateSource)> {
        let metadata = match record.get_map(&self.config.metadata_key) {
            Ok(m) => m,
            Err(e) => {
                trace!(target: "drop_sampling", "no metadata map: {}", e);
                return None;
            }
        };

        // Ingress log sampling takes priority over annotations.
        if let Some(rate) = self.find_ingress_sampling(metadata, record) {
            debug!(target: "drop_sampling", rate, "found ingress sampling");
            return Some((rate, RateSource::Ingress));
        }

        if let Some(rate) = self.find_annotation_sampling(metadata) {
            debug!(target: "drop_sampling", rate, "found annotation sampling");
            return Some((rate, RateSource::Annotation));
        }

        None
    }

    /// Rate from the workload annotations.
    pub fn find_annotation_sampling(&self, metadata: &Fields) -> Option<f64> {
        let Some(annotations) = metadata
            .get(&self.config.annotations_key)
            .and_then(Value::as_object)
        else {
            trace!(target: "drop_sampling", "no annotation map");
            return None;
        };

        let Some(raw) = annotations
            .get(&self.config.annotation_key)
            .and_then(Value::as_str)
        else {
            trace!(target: "drop_sampling", "no string sampling annotation");
            return None;
        };

        parse_rate(raw)
    }

    /// Rate embedded in the raw log line, only for ingress records.
    pub fn find_ingress_sampling(&self, metadata: &Fields, record: &LogRecord) -> Option<f64> {
        let app = metadata
            .get(&self.config.labels_key)
            .and_then(Value::as_object)
            .and_then(|labels| labels.get(&self.config.app_label))
            .and_then(Value::as_str);

        match app {
            Some(app) if app == self.config.ingress_app => {
                trace!(target: "drop_sampling", app, "is ingress");
            }
            other => {
                trace!(target: "drop_sampling", app = ?other, "not ingress");
                return None;
            }
        }

        let raw_log = match record.get_str(&self.config.log_field) {
            Ok(s) => s,
            Err(e) => {
                trace!(target: "drop_sampling", "no log string: {}", e);
                return None;
            }
        };

        // The log field is a JSON document of its own.
        let embedded: Fields = match serde_json::from_str(raw_log) {
            Ok(fields) => fields,
            Err(e) => {
                trace!(target: "drop_sampling", "could not parse embedded log: {}", e);
                return None;
            }
        };

        let Some(raw) = embedded
            .get(&self.config.log_sample_key)
            .and_then(Value::as_str)
        else {
            trace!(target: "drop_sampling", "no string log sampling");
            return None;
        };

        if raw.is_empty() {
            trace!(target: "drop_sampling", "log sampling is not set");
            return None;
        }

        parse_rate(raw)
    }
}

/// Parses the rate exactly as written. Padded values are rejected, while
/// `NaN` and `inf` are valid floats and left to the decider.
fn parse_rate(raw: &str) -> Option<f64> {
    match raw.parse::<f64>() {
        Ok(rate) => Some(rate),
        Err(e) => {
            trace!(target: "drop_sampling", raw, "could not parse rate: {}", e);
            None
        }
    }
}
