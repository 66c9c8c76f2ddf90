//! Listing Insights - rental listing cleaning, SQLite export & dashboard
//!
//! Loads a listings CSV, cleans it, stores it in an indexed SQLite table and
//! summarizes it as a chart dashboard plus console text.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod store;

pub use config::PipelineConfig;
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
