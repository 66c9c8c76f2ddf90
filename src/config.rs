//! Pipeline configuration. Paths and style are fixed per build; nothing is
//! read from the environment or the command line.

use crate::charts::ChartStyle;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub database_path: PathBuf,
    pub table_name: String,
    pub dashboard_path: PathBuf,
    pub style: ChartStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("AB_NYC_2019.csv"),
            database_path: PathBuf::from("airbnb_nyc_cleaned.db"),
            table_name: "airbnb_listings".to_string(),
            dashboard_path: PathBuf::from("airbnb_dashboard.png"),
            style: ChartStyle::default(),
        }
    }
}

impl PipelineConfig {
    /// Same settings with every output placed under `dir`.
    pub fn with_output_dir(mut self, dir: &std::path::Path) -> Self {
        self.database_path = dir.join(&self.database_path);
        self.dashboard_path = dir.join(&self.dashboard_path);
        self
    }
}
