//! Shared types and utilities for Dropsample
//!
//! This crate contains the log record representation and the small helpers
//! used by the sampling filter and the host pipeline.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::record::*;
