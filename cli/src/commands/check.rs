//! Check command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use dropsample_filter::FilterConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration file (toml, json or yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let config = FilterConfig::load(args.config.as_deref()).context("Invalid configuration")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("Failed to render configuration")?
    );
    output::success(&format!(
        "configuration ok, reporting every {:?}",
        config.report_interval()?
    ));
    Ok(())
}
