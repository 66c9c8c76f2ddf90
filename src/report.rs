//! Report Builder
//! Computes every aggregate view once and shapes it for the dashboard and the
//! console summary.

use crate::charts::DashboardData;
use crate::data::schema::{AVAILABILITY_365, CORRELATION_COLUMNS, MINIMUM_NIGHTS, NUMBER_OF_REVIEWS, PRICE};
use crate::stats::{CategoryCount, CorrelationMatrix, DescriptiveStats, GroupPrice, StatsCalculator, StatsError};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Number of neighbourhoods in the price ranking.
pub const TOP_NEIGHBOURHOODS: usize = 10;

const PRICE_BINS: usize = 50;
const AVAILABILITY_BINS: usize = 30;
const MINIMUM_NIGHTS_BINS: usize = 30;

/// Console summary of a cleaned listing set.
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub total_listings: usize,
    pub removed_listings: usize,
    pub price: DescriptiveStats,
    pub modal_room_type: Option<String>,
    /// Ordered by group name.
    pub groups: Vec<GroupPrice>,
    pub room_types: Vec<CategoryCount>,
    pub top_neighbourhoods: Vec<GroupPrice>,
    pub correlations: CorrelationMatrix,
}

/// Both outputs of the reporting stage.
#[derive(Debug, Clone)]
pub struct Report {
    pub insights: Insights,
    pub dashboard: DashboardData,
}

pub struct ReportBuilder;

impl ReportBuilder {
    /// Aggregate a canonical listing frame. An empty frame gives empty views.
    pub fn build(listings: &DataFrame, removed_listings: usize) -> Result<Report, StatsError> {
        if listings.height() == 0 {
            warn!("No listings survived cleaning; report will be empty");
        }

        let prices = StatsCalculator::column_values(listings, PRICE)?;
        let room_types = StatsCalculator::room_type_distribution(listings)?;
        let groups = StatsCalculator::group_price_summary(listings)?;
        let top_neighbourhoods = StatsCalculator::top_neighbourhoods(listings, TOP_NEIGHBOURHOODS)?;
        let correlations = StatsCalculator::correlation_matrix(listings, &CORRELATION_COLUMNS)?;

        let reviews_vs_price = StatsCalculator::optional_values(listings, NUMBER_OF_REVIEWS)?
            .into_iter()
            .zip(StatsCalculator::optional_values(listings, PRICE)?)
            .filter_map(|(reviews, price)| Some((reviews?, price?)))
            .collect();

        let dashboard = DashboardData {
            price_histogram: StatsCalculator::histogram(&prices, PRICE_BINS),
            room_types: room_types.clone(),
            listings_per_group: StatsCalculator::rank_by_count(&groups),
            reviews_vs_price,
            availability_histogram: StatsCalculator::histogram(
                &StatsCalculator::column_values(listings, AVAILABILITY_365)?,
                AVAILABILITY_BINS,
            ),
            price_by_group: StatsCalculator::rank_by_mean_price(&groups),
            top_neighbourhoods: top_neighbourhoods.clone(),
            correlations: correlations.clone(),
            minimum_nights_histogram: StatsCalculator::histogram(
                &StatsCalculator::column_values(listings, MINIMUM_NIGHTS)?,
                MINIMUM_NIGHTS_BINS,
            ),
        };

        let insights = Insights {
            total_listings: listings.height(),
            removed_listings,
            price: StatsCalculator::describe(&prices),
            modal_room_type: StatsCalculator::modal_room_type(&room_types).map(|c| c.category.clone()),
            groups,
            room_types,
            top_neighbourhoods,
            correlations,
        };
        debug!(groups = insights.groups.len(), "Report aggregated");

        Ok(Report { insights, dashboard })
    }
}

impl fmt::Display for Insights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "KEY INSIGHTS:")?;
        writeln!(f, "• Total listings: {}", with_thousands(self.total_listings))?;
        writeln!(f, "• Removed listings: {}", with_thousands(self.removed_listings))?;
        if self.price.count > 0 {
            writeln!(f, "• Avg price: ${:.0}", self.price.mean)?;
        } else {
            writeln!(f, "• Avg price: n/a")?;
        }
        writeln!(
            f,
            "• Most popular room: {}",
            self.modal_room_type.as_deref().unwrap_or("n/a")
        )?;

        writeln!(f)?;
        writeln!(f, "Neighborhood Summary:")?;
        writeln!(f, "{:<20}{:>8}{:>8}", "neighbourhood_group", "mean", "count")?;
        for group in &self.groups {
            writeln!(f, "{:<20}{:>8.0}{:>8}", group.group, group.mean_price.round_ties_even(), group.count)?;
        }
        Ok(())
    }
}

fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
