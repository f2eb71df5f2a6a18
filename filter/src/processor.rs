//! Processor chain run by the host pipeline
//!
//! Processors are built explicitly by the composition root and handed to a
//! [`Pipeline`]; there is no global registry.

use dropsample_shared::LogRecord;
use std::sync::Arc;

/// One step of record processing. Returning `None` drops the record, which
/// is never an error.
pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, record: LogRecord) -> Option<LogRecord>;
}

impl<P: Processor + ?Sized> Processor for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn run(&self, record: LogRecord) -> Option<LogRecord> {
        (**self).run(record)
    }
}

/// Ordered list of processors; a record stops at the first drop.
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn push(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn run(&self, record: LogRecord) -> Option<LogRecord> {
        self.processors
            .iter()
            .try_fold(record, |record, processor| processor.run(record))
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("processors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tag(&'static str);

    impl Processor for Tag {
        fn name(&self) -> &'static str {
            "tag"
        }

        fn run(&self, mut record: LogRecord) -> Option<LogRecord> {
            let patch = json!({ "tags": { (self.0): true } });
            record.deep_update(patch.as_object()?);
            Some(record)
        }
    }

    struct DropAll(Arc<AtomicUsize>);

    impl Processor for DropAll {
        fn name(&self) -> &'static str {
            "drop_all"
        }

        fn run(&self, _record: LogRecord) -> Option<LogRecord> {
            self.0.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    #[test]
    fn test_runs_in_order() {
        let pipeline = Pipeline::new().with(Tag("first")).with(Tag("second"));
        let out = pipeline.run(LogRecord::default()).unwrap();
        assert!(out.get_value("tags.first").is_ok());
        assert!(out.get_value("tags.second").is_ok());
        assert_eq!(pipeline.names(), vec!["tag", "tag"]);
    }

    #[test]
    fn test_stops_at_first_drop() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with(DropAll(dropped.clone()))
            .with(DropAll(dropped.clone()));
        assert!(pipeline.run(LogRecord::default()).is_none());
        assert_eq!(dropped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_shared_processor_keeps_state() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let shared = Arc::new(DropAll(dropped.clone()));
        let pipeline = Pipeline::new().with(shared.clone());

        assert!(pipeline.run(LogRecord::default()).is_none());
        assert!(shared.run(LogRecord::default()).is_none());
        assert_eq!(dropped.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_empty_pipeline_forwards() {
        let record = LogRecord::from_json(r#"{"log":"x"}"#).unwrap();
        assert_eq!(Pipeline::new().run(record.clone()), Some(record));
    }
}
