//! Batch pipeline: load, clean, persist, report, render.
//!
//! Stages run strictly in order. The store is written and closed before any
//! report work starts, so a rendering failure never touches stored data.

use crate::charts::{DashboardRenderer, PlotError};
use crate::config::PipelineConfig;
use crate::data::{CleanOutcome, CleanerError, DataCleaner, DataLoader, Listing, LoaderError};
use crate::report::{Report, ReportBuilder};
use crate::stats::StatsError;
use crate::store::{ListingStore, StoreError};
use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Cleaner(#[from] CleanerError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Plot(#[from] PlotError),
}

/// Everything a run produced apart from the files it wrote.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub raw_rows: usize,
    pub cleaned: CleanOutcome,
    pub stored_rows: usize,
    pub report: Report,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage including the dashboard image.
    pub fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let outcome = self.process()?;

        info!("Rendering dashboard");
        DashboardRenderer::render(
            &outcome.report.dashboard,
            &self.config.style,
            &self.config.dashboard_path,
        )?;
        Ok(outcome)
    }

    /// Load, clean, persist and aggregate, without drawing anything.
    pub fn process(&self) -> Result<PipelineOutcome, PipelineError> {
        debug!(config = ?self.config, "Pipeline configuration");

        info!(path = %self.config.input_path.display(), "Loading dataset");
        let raw = self.load()?;
        let raw_rows = raw.height();

        info!("Cleaning data");
        let cleaned = DataCleaner::clean(&raw)?;
        info!("Missing values before/after cleaning:\n{}", cleaned.missing);
        let listings = DataCleaner::to_listings(&cleaned.listings)?;

        info!(path = %self.config.database_path.display(), "Creating SQL database");
        let stored_rows = self.persist(&listings)?;

        info!("Aggregating report");
        let report = ReportBuilder::build(&cleaned.listings, cleaned.removed())?;

        Ok(PipelineOutcome {
            raw_rows,
            cleaned,
            stored_rows,
            report,
        })
    }

    fn load(&self) -> Result<DataFrame, PipelineError> {
        Ok(DataLoader::load_csv(&self.config.input_path)?)
    }

    /// Write `listings` and close the store whether or not the write succeeded.
    fn persist(&self, listings: &[Listing]) -> Result<usize, PipelineError> {
        let mut store = ListingStore::open(&self.config.database_path)?;
        let written = store.replace_listings(&self.config.table_name, listings);
        let closed = store.close();

        let written = written?;
        closed?;
        Ok(written)
    }
}
