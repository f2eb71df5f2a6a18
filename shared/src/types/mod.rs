//! Record types flowing through the pipeline

pub mod record;
