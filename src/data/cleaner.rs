//! Data Cleaner Module
//! Turns the raw listing frame into the canonical frame: typing, completeness
//! filter, defaults, date normalization and outlier removal.

use crate::data::schema::{
    Listing, AVAILABILITY_365, CANONICAL_COLUMNS, HAS_REVIEWS, HOST_ID, HOST_NAME, ID, LAST_REVIEW,
    LAST_REVIEW_FORMAT, LATITUDE, LONGITUDE, MAX_MINIMUM_NIGHTS, MAX_PRICE, MINIMUM_NIGHTS, NAME,
    NEIGHBOURHOOD, NEIGHBOURHOOD_GROUP, NUMBER_OF_REVIEWS, OTHER_GROUP, PRICE, RAW_COLUMNS,
    REQUIRED_COLUMNS, REVIEWS_PER_MONTH, ROOM_TYPE,
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Days from 0001-01-01 to 1970-01-01, the epoch of polars dates.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Cleaned frame has a null in required column {column} at row {row}")]
    UnexpectedNull { column: &'static str, row: usize },
}

/// Null counts per column before and after cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingValueReport {
    pub before: Vec<(String, usize)>,
    pub after: Vec<(String, usize)>,
}

impl MissingValueReport {
    pub fn before_for(&self, column: &str) -> Option<usize> {
        lookup(&self.before, column)
    }

    pub fn after_for(&self, column: &str) -> Option<usize> {
        lookup(&self.after, column)
    }
}

fn lookup(counts: &[(String, usize)], column: &str) -> Option<usize> {
    counts
        .iter()
        .find(|(name, _)| name == column)
        .map(|(_, count)| *count)
}

impl fmt::Display for MissingValueReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24}{:>10}{:>10}", "column", "before", "after")?;
        for (name, before) in &self.before {
            match self.after_for(name) {
                Some(after) => writeln!(f, "{name:<24}{before:>10}{after:>10}")?,
                None => writeln!(f, "{name:<24}{before:>10}{:>10}", "-")?,
            }
        }
        Ok(())
    }
}

/// Result of a cleaning pass.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    /// Canonical listings, columns in [`CANONICAL_COLUMNS`] order.
    pub listings: DataFrame,
    /// Rows dropped for lacking an identity or location field.
    pub removed_incomplete: usize,
    /// Rows dropped by the price and minimum-nights bounds.
    pub removed_outliers: usize,
    pub missing: MissingValueReport,
}

impl CleanOutcome {
    pub fn removed(&self) -> usize {
        self.removed_incomplete + self.removed_outliers
    }
}

/// Applies the listing cleaning rules.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a raw listing frame. The input frame is left untouched.
    ///
    /// Rules run in a fixed order, each on the rows the previous one kept:
    /// completeness filter, `"Other"` group default, last-review date parsing
    /// with the derived `has_reviews` flag, zero review velocity default, and
    /// finally the inclusive price and minimum-nights bounds.
    pub fn clean(raw: &DataFrame) -> Result<CleanOutcome, CleanerError> {
        let before = Self::null_counts(raw, &RAW_COLUMNS);
        let raw_rows = raw.height();

        let complete = raw
            .clone()
            .lazy()
            .with_columns(Self::typing_exprs())
            .filter(Self::completeness_predicate())
            .collect()?;
        let complete_rows = complete.height();

        let listings = complete
            .lazy()
            .with_columns([
                col(NEIGHBOURHOOD_GROUP).fill_null(lit(OTHER_GROUP)),
                col(LAST_REVIEW).str().to_date(StrptimeOptions {
                    format: Some(LAST_REVIEW_FORMAT.into()),
                    strict: false,
                    ..Default::default()
                }),
                col(REVIEWS_PER_MONTH).fill_null(lit(0.0)),
            ])
            .with_column(col(LAST_REVIEW).is_not_null().alias(HAS_REVIEWS))
            .filter(
                col(PRICE)
                    .lt_eq(lit(MAX_PRICE))
                    .and(col(MINIMUM_NIGHTS).lt_eq(lit(MAX_MINIMUM_NIGHTS))),
            )
            .with_column(col(MINIMUM_NIGHTS).cast(DataType::Int64))
            .select(CANONICAL_COLUMNS.map(col))
            .collect()?;

        let outcome = CleanOutcome {
            removed_incomplete: raw_rows - complete_rows,
            removed_outliers: complete_rows - listings.height(),
            missing: MissingValueReport {
                before,
                after: Self::null_counts(&listings, &CANONICAL_COLUMNS),
            },
            listings,
        };

        info!(
            rows = outcome.listings.height(),
            removed_incomplete = outcome.removed_incomplete,
            removed_outliers = outcome.removed_outliers,
            "Cleaned listings"
        );
        Ok(outcome)
    }

    /// Casts every column to its canonical type. Unparseable values and NaN
    /// become null.
    ///
    /// Integer columns are parsed as floats first so `3.0` reads as 3.
    /// `minimum_nights` stays a float until after the bounds check.
    fn typing_exprs() -> Vec<Expr> {
        let text = [NAME, HOST_NAME, NEIGHBOURHOOD_GROUP, NEIGHBOURHOOD, ROOM_TYPE, LAST_REVIEW]
            .map(|name| col(name).cast(DataType::String));
        let integers = [ID, HOST_ID, NUMBER_OF_REVIEWS, AVAILABILITY_365]
            .map(|name| numeric(name).cast(DataType::Int64));
        let floats = [LATITUDE, LONGITUDE, PRICE, REVIEWS_PER_MONTH, MINIMUM_NIGHTS].map(numeric);

        text.into_iter().chain(integers).chain(floats).collect()
    }

    fn completeness_predicate() -> Expr {
        REQUIRED_COLUMNS
            .iter()
            .map(|name| col(*name).is_not_null())
            .reduce(|acc, expr| acc.and(expr))
            .unwrap_or_else(|| lit(true))
    }

    fn null_counts(df: &DataFrame, columns: &[&str]) -> Vec<(String, usize)> {
        columns
            .iter()
            .filter_map(|name| {
                df.column(name)
                    .ok()
                    .map(|column| (name.to_string(), column.null_count()))
            })
            .collect()
    }

    /// Convert a canonical frame into typed listing records.
    pub fn to_listings(df: &DataFrame) -> Result<Vec<Listing>, CleanerError> {
        let ids = int_values(df, ID)?;
        let names = text_values(df, NAME)?;
        let host_ids = int_values(df, HOST_ID)?;
        let host_names = text_values(df, HOST_NAME)?;
        let groups = text_values(df, NEIGHBOURHOOD_GROUP)?;
        let neighbourhoods = text_values(df, NEIGHBOURHOOD)?;
        let latitudes = float_values(df, LATITUDE)?;
        let longitudes = float_values(df, LONGITUDE)?;
        let room_types = text_values(df, ROOM_TYPE)?;
        let prices = float_values(df, PRICE)?;
        let minimum_nights = int_values(df, MINIMUM_NIGHTS)?;
        let reviews = int_values(df, NUMBER_OF_REVIEWS)?;
        let last_reviews = date_values(df, LAST_REVIEW)?;
        let reviews_per_month = float_values(df, REVIEWS_PER_MONTH)?;
        let availability = int_values(df, AVAILABILITY_365)?;
        let has_reviews = bool_values(df, HAS_REVIEWS)?;

        let mut listings = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            listings.push(Listing {
                id: ids[row],
                name: required(names[row].clone(), NAME, row)?,
                host_id: host_ids[row],
                host_name: required(host_names[row].clone(), HOST_NAME, row)?,
                neighbourhood_group: required(groups[row].clone(), NEIGHBOURHOOD_GROUP, row)?,
                neighbourhood: required(neighbourhoods[row].clone(), NEIGHBOURHOOD, row)?,
                latitude: required(latitudes[row], LATITUDE, row)?,
                longitude: required(longitudes[row], LONGITUDE, row)?,
                room_type: required(room_types[row].clone(), ROOM_TYPE, row)?,
                price: required(prices[row], PRICE, row)?,
                minimum_nights: required(minimum_nights[row], MINIMUM_NIGHTS, row)?,
                number_of_reviews: reviews[row],
                last_review: last_reviews[row],
                reviews_per_month: reviews_per_month[row].unwrap_or(0.0),
                availability_365: availability[row],
                has_reviews: has_reviews[row].unwrap_or(false),
            });
        }

        debug!(count = listings.len(), "Converted canonical frame to records");
        Ok(listings)
    }
}

/// Text parsed as `Float64`, with NaN mapped to null.
fn numeric(name: &str) -> Expr {
    let parsed = col(name).cast(DataType::Float64);
    when(parsed.clone().is_nan())
        .then(lit(NULL))
        .otherwise(parsed)
        .alias(name)
}

fn required<T>(value: Option<T>, column: &'static str, row: usize) -> Result<T, CleanerError> {
    value.ok_or(CleanerError::UnexpectedNull { column, row })
}

fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn int_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn bool_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<bool>>> {
    let column = df.column(name)?.cast(&DataType::Boolean)?;
    Ok(column.bool()?.into_iter().collect())
}

fn date_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<NaiveDate>>> {
    let column = df.column(name)?.cast(&DataType::Int32)?;
    Ok(column
        .i32()?
        .into_iter()
        .map(|days| days.and_then(days_to_date))
        .collect())
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}
