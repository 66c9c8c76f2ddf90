//! CSV Data Loader Module
//! Handles listing file loading and column verification using Polars.

use crate::data::schema::RAW_COLUMNS;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Input file is missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Handles CSV file loading with Polars.
///
/// Every column is read as text; typing and validation belong to the cleaner,
/// so a stray value in a numeric column never aborts the load.
pub struct DataLoader;

impl DataLoader {
    /// Load a listings CSV file and check it carries the expected columns.
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        Self::verify_columns(&df)?;
        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded listings"
        );
        Ok(df)
    }

    /// Fail when any expected column is absent. Extra columns are ignored.
    pub fn verify_columns(df: &DataFrame) -> Result<(), LoaderError> {
        let present = df.get_column_names();
        let missing: Vec<String> = RAW_COLUMNS
            .iter()
            .filter(|name| !present.iter().any(|p| p.as_str() == **name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            debug!(?missing, "Column check failed");
            Err(LoaderError::MissingColumns(missing))
        }
    }
}
