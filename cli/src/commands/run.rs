//! Run command implementation

use crate::{output, signals};
use anyhow::{Context, Result};
use clap::Args;
use dropsample_filter::{
    metrics, DropSampling, FilterConfig, Pipeline, SamplingReport, StaticMetadata,
};
use dropsample_shared::LogRecord;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// NDJSON input file (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Configuration file (toml, json or yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file merged into every record's metadata before sampling
    #[arg(long)]
    pub static_metadata: Option<PathBuf>,

    /// Write Prometheus text-format metrics here on exit
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,
}

/// Line counts for one pass over the input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpStats {
    pub lines: u64,
    pub forwarded: u64,
    pub dropped: u64,
    pub invalid: u64,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = FilterConfig::load(args.config.as_deref()).context("Invalid configuration")?;

    let shutdown = CancellationToken::new();
    signals::cancel_on_signal(shutdown.clone());

    let filter = Arc::new(
        DropSampling::new(&config, shutdown.clone())
            .context("Failed to create drop_sampling processor")?,
    );

    let mut pipeline = Pipeline::new();
    if let Some(path) = &args.static_metadata {
        pipeline.push(Box::new(StaticMetadata::from_file(
            &config.resolver.metadata_key,
            path,
        )?));
    }
    pipeline.push(Box::new(filter.clone()));
    info!("pipeline: {:?}", pipeline.names());

    let mut stdout = BufWriter::new(tokio::io::stdout());
    let stats = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            pump(BufReader::new(file), &mut stdout, &pipeline, &shutdown).await?
        }
        None => pump(BufReader::new(tokio::io::stdin()), &mut stdout, &pipeline, &shutdown).await?,
    };
    info!(
        lines = stats.lines,
        forwarded = stats.forwarded,
        dropped = stats.dropped,
        invalid = stats.invalid,
        "input finished"
    );

    shutdown.cancel();
    filter.shutdown().await;

    let report = SamplingReport::from(filter.provide_metrics());
    metrics::record_report(&report);
    output::summary(&report);
    if stats.invalid > 0 {
        output::warning(&format!("{} lines were not JSON objects", stats.invalid));
    }

    if let Some(path) = &args.metrics_file {
        let text = metrics::encode_metrics().context("Failed to encode metrics")?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        output::success(&format!("metrics written to {}", path.display()));
    }

    Ok(())
}

/// Feed every line of `reader` through `pipeline`, writing forwarded records
/// to `writer`. Stops at EOF or when `shutdown` is cancelled.
pub async fn pump<R, W>(
    reader: R,
    writer: &mut W,
    pipeline: &Pipeline,
    shutdown: &CancellationToken,
) -> Result<PumpStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = PumpStats::default();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("input interrupted by shutdown");
                break;
            }
            line = lines.next_line() => line.context("Failed to read input")?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let record = match LogRecord::from_json(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping line {}: {}", stats.lines, e);
                stats.invalid += 1;
                continue;
            }
        };

        match pipeline.run(record) {
            Some(record) => {
                let mut out = record.to_json().context("Failed to serialize record")?;
                out.push('\n');
                writer
                    .write_all(out.as_bytes())
                    .await
                    .context("Failed to write record")?;
                stats.forwarded += 1;
            }
            None => stats.dropped += 1,
        }
    }

    writer.flush().await.context("Failed to flush output")?;
    Ok(stats)
}
