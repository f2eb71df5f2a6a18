//! Filter configuration
//!
//! None of this is required for correct decisions: the sampling rate always
//! comes from the record itself. These knobs only tune reporting and the
//! metadata key names.

use crate::error::FilterError;
use crate::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix, e.g. `DROPSAMPLE_REPORT_INTERVAL=10s` or
/// `DROPSAMPLE_RESOLVER__INGRESS_APP=edge-ingress`.
pub const ENV_PREFIX: &str = "DROPSAMPLE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Time between periodic sampling reports ("30s", "1m", ...)
    pub report_interval: String,

    /// Fixed seed for the threshold generator (None = seed from the clock)
    pub seed: Option<u64>,

    /// Metadata key names used to discover the sampling rate
    pub resolver: ResolverConfig,

    /// Emit reports through the application log
    pub log_reports: bool,

    /// Mirror reports into Prometheus gauges
    pub prometheus: bool,

    /// Optional file receiving one line per report
    pub report_file: Option<PathBuf>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            report_interval: "30s".to_string(),
            seed: None,
            resolver: ResolverConfig::default(),
            log_reports: true,
            prometheus: true,
            report_file: None,
        }
    }
}

impl FilterConfig {
    /// Load configuration from an optional file (format picked from the
    /// extension), overridden by `DROPSAMPLE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, FilterError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let config: FilterConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn report_interval(&self) -> Result<Duration, FilterError> {
        let interval = dropsample_shared::utils::parse_duration(&self.report_interval).map_err(
            |e| FilterError::InvalidInterval {
                value: self.report_interval.clone(),
                reason: e.to_string(),
            },
        )?;
        if interval.is_zero() {
            return Err(FilterError::InvalidInterval {
                value: self.report_interval.clone(),
                reason: "interval must be greater than 0".to_string(),
            });
        }
        Ok(interval)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), FilterError> {
        self.report_interval()?;
        Ok(())
    }
}
