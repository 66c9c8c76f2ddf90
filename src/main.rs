//! Listing Insights - batch entry point.
//!
//! Runs the whole pipeline against the fixed input file and prints the summary.

use anyhow::{Context, Result};
use listing_insights::{Pipeline, PipelineConfig};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

fn main() -> Result<()> {
    let directive = "info"
        .parse::<Directive>()
        .context("Invalid default log directive")?;
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(directive));
    tracing_subscriber::registry().with(stderr_layer).init();

    let config = PipelineConfig::default();
    let pipeline = Pipeline::new(config.clone());

    info!("Starting listings analysis");
    let outcome = pipeline
        .run()
        .with_context(|| format!("Analysis of {} failed", config.input_path.display()))?;

    info!(
        raw = outcome.raw_rows,
        cleaned = outcome.cleaned.listings.height(),
        removed = outcome.cleaned.removed(),
        stored = outcome.stored_rows,
        "Analysis complete"
    );
    if let Ok(json) = serde_json::to_string_pretty(&outcome.report.insights) {
        debug!("{json}");
    }

    println!("{}", outcome.report.insights);
    println!("Files created:");
    println!("   • {} (SQL database)", config.database_path.display());
    println!("   • {} (9-chart dashboard)", config.dashboard_path.display());
    Ok(())
}
