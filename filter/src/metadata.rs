//! Static workload metadata
//!
//! Merges a fixed metadata document into every record, under the same key the
//! resolver reads from. Handy for exercising a pipeline locally without a
//! cluster-side metadata enricher.

use crate::processor::Processor;
use dropsample_shared::{Fields, LogRecord};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct StaticMetadata {
    patch: Fields,
}

impl StaticMetadata {
    /// Nest `metadata` under `key` (usually `kubernetes`).
    pub fn new(key: &str, metadata: Fields) -> Self {
        let mut patch = Fields::new();
        patch.insert(key.to_string(), Value::Object(metadata));
        Self { patch }
    }

    /// Read the metadata document from a JSON file.
    pub fn from_file(key: &str, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata file {}", path.display()))?;
        let metadata: Fields = serde_json::from_str(&raw)
            .with_context(|| format!("Metadata file {} is not a JSON object", path.display()))?;
        Ok(Self::new(key, metadata))
    }
}

impl Processor for StaticMetadata {
    fn name(&self) -> &'static str {
        "static_metadata"
    }

    fn run(&self, mut record: LogRecord) -> Option<LogRecord> {
        record.deep_update(&self.patch);
        Some(record)
    }
}
