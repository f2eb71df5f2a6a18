use anyhow::Result;
use dropsample_filter::{
    CounterSnapshot, DropSampling, FixedThreshold, Pipeline, Processor, RandomThreshold,
    RateResolver, RateSource, StaticMetadata,
};
use dropsample_shared::LogRecord;
use serde_json::json;
use std::sync::Arc;

fn fixture(name: &str) -> LogRecord {
    let raw = match name {
        "journalctl" => include_str!("fixtures/journalctl.json"),
        "ingress" => include_str!("fixtures/ingress.json"),
        "ingress_no_log_sample" => include_str!("fixtures/ingress_no_log_sample.json"),
        "ingress_annotated" => include_str!("fixtures/ingress_annotated.json"),
        "ingress_empty_sample_annotated" => {
            include_str!("fixtures/ingress_empty_sample_annotated.json")
        }
        other => panic!("unknown fixture {}", other),
    };
    LogRecord::from_json(raw).expect("fixture is a JSON object")
}

fn stage(threshold: f64) -> DropSampling {
    DropSampling::with_threshold(RateResolver::default(), Arc::new(FixedThreshold(threshold)))
}

#[test]
fn test_find_sampling_in_ingress_log() {
    let resolver = RateResolver::default();
    let cases = [
        ("journalctl", None, "not an ingress log"),
        ("ingress_no_log_sample", None, "ingress log with no log sampling"),
        ("ingress_empty_sample_annotated", None, "ingress log with empty sampling"),
        ("ingress", Some(0.5678), "has sampling in log"),
    ];

    for (name, expected, title) in cases {
        let record = fixture(name);
        let metadata = record.get_map("kubernetes").unwrap();
        assert_eq!(
            resolver.find_ingress_sampling(metadata, &record),
            expected,
            "{}",
            title
        );
    }
}

#[test]
fn test_find_sampling_priority() {
    let stage = stage(0.0);
    let cases = [
        (fixture("journalctl"), (0.0, false), "no sampling anywhere"),
        (
            LogRecord::from_json(r#"{"type":"test","name":"TestFindSampling","line":10}"#).unwrap(),
            (0.0, false),
            "no kubernetes",
        ),
        (
            LogRecord::from_json(r#"{"type":"test","kubernetes":"foo"}"#).unwrap(),
            (0.0, false),
            "kubernetes is not a map",
        ),
        (
            fixture("ingress_empty_sample_annotated"),
            (0.34, true),
            "empty ingress sampling does not have priority",
        ),
        (fixture("ingress_annotated"), (0.9988, true), "ingress sampling has priority"),
        (fixture("ingress"), (0.5678, true), "ingress sampling alone"),
    ];

    for (record, expected, title) in cases {
        assert_eq!(stage.find_sampling(&record), expected, "{}", title);
    }
}

#[test]
fn test_rate_source_is_reported() {
    let resolver = RateResolver::default();
    assert_eq!(
        resolver.resolve(&fixture("ingress_annotated")),
        Some((0.9988, RateSource::Ingress))
    );
    assert_eq!(
        resolver.resolve(&fixture("ingress_empty_sample_annotated")),
        Some((0.34, RateSource::Annotation))
    );
    assert_eq!(resolver.resolve(&fixture("journalctl")), None);
}

#[test]
fn test_run() {
    struct Case {
        record: LogRecord,
        threshold: f64,
        forwarded: bool,
        expected: CounterSnapshot,
        title: &'static str,
    }

    let cases = [
        Case {
            record: fixture("journalctl"),
            threshold: 1.0,
            forwarded: true,
            expected: CounterSnapshot {
                unannotated: 1,
                ..CounterSnapshot::default()
            },
            title: "no sampling",
        },
        Case {
            record: fixture("ingress_annotated"),
            threshold: 1.0,
            forwarded: false,
            expected: CounterSnapshot {
                annotated: 1,
                skipped: 1,
                ..CounterSnapshot::default()
            },
            title: "record dropped",
        },
        Case {
            record: fixture("ingress_annotated"),
            threshold: 0.00001,
            forwarded: true,
            expected: CounterSnapshot {
                annotated: 1,
                allowed: 1,
                ..CounterSnapshot::default()
            },
            title: "record accepted",
        },
    ];

    for case in cases {
        let stage = stage(case.threshold);
        let original = case.record.clone();
        let out = stage.run(case.record);

        if case.forwarded {
            assert_eq!(out, Some(original), "{}", case.title);
        } else {
            assert_eq!(out, None, "{}", case.title);
        }
        assert_eq!(stage.provide_metrics(), case.expected, "{}", case.title);
    }
}

#[test]
fn test_counter_invariants_under_concurrency() {
    let stage = Arc::new(DropSampling::with_threshold(
        RateResolver::default(),
        Arc::new(RandomThreshold::new(31337)),
    ));
    let records = Arc::new(vec![
        fixture("journalctl"),
        fixture("ingress"),
        fixture("ingress_annotated"),
        fixture("ingress_empty_sample_annotated"),
        fixture("ingress_no_log_sample"),
    ]);

    let threads = 8;
    let per_thread = 2_000;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let stage = stage.clone();
            let records = records.clone();
            std::thread::spawn(move || {
                let mut forwarded = 0u64;
                for i in 0..per_thread {
                    let record = records[(i + t) % records.len()].clone();
                    if stage.run(record).is_some() {
                        forwarded += 1;
                    }
                }
                forwarded
            })
        })
        .collect();

    let forwarded: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let snap = stage.provide_metrics();

    assert_eq!(snap.allowed + snap.skipped, snap.annotated);
    assert_eq!(snap.annotated + snap.unannotated, (threads * per_thread) as u64);
    assert_eq!(forwarded, snap.allowed + snap.unannotated);
    assert!(snap.sample_pct() > 0.0 && snap.sample_pct() < 1.0);
}

#[test]
fn test_static_metadata_feeds_sampling() -> Result<()> {
    let metadata = json!({
        "namespace": "example-env805-production",
        "annotations": { "sampling": "0.0" },
        "labels": { "app": "egress" }
    });
    let metadata = metadata.as_object().cloned().unwrap_or_default();

    let pipeline = Pipeline::new()
        .with(StaticMetadata::new("kubernetes", metadata))
        .with(stage(0.5));

    let record = LogRecord::from_json(r#"{"log":"GET / 200","stream":"stdout"}"#)?;
    assert!(pipeline.run(record).is_none());
    assert_eq!(pipeline.names(), vec!["static_metadata", "drop_sampling"]);
    Ok(())
}
