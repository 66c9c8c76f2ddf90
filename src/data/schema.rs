//! Listing Schema
//! Column names, cleaning thresholds and the canonical listing record.

use chrono::NaiveDate;
use serde::Serialize;

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const HOST_ID: &str = "host_id";
pub const HOST_NAME: &str = "host_name";
pub const NEIGHBOURHOOD_GROUP: &str = "neighbourhood_group";
pub const NEIGHBOURHOOD: &str = "neighbourhood";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const ROOM_TYPE: &str = "room_type";
pub const PRICE: &str = "price";
pub const MINIMUM_NIGHTS: &str = "minimum_nights";
pub const NUMBER_OF_REVIEWS: &str = "number_of_reviews";
pub const LAST_REVIEW: &str = "last_review";
pub const REVIEWS_PER_MONTH: &str = "reviews_per_month";
pub const AVAILABILITY_365: &str = "availability_365";

/// Derived by the cleaner, not present in the source file.
pub const HAS_REVIEWS: &str = "has_reviews";

/// Columns every input file must carry.
pub const RAW_COLUMNS: [&str; 15] = [
    ID,
    NAME,
    HOST_ID,
    HOST_NAME,
    NEIGHBOURHOOD_GROUP,
    NEIGHBOURHOOD,
    LATITUDE,
    LONGITUDE,
    ROOM_TYPE,
    PRICE,
    MINIMUM_NIGHTS,
    NUMBER_OF_REVIEWS,
    LAST_REVIEW,
    REVIEWS_PER_MONTH,
    AVAILABILITY_365,
];

/// Columns of the cleaned frame, in storage order.
pub const CANONICAL_COLUMNS: [&str; 16] = [
    ID,
    NAME,
    HOST_ID,
    HOST_NAME,
    NEIGHBOURHOOD_GROUP,
    NEIGHBOURHOOD,
    LATITUDE,
    LONGITUDE,
    ROOM_TYPE,
    PRICE,
    MINIMUM_NIGHTS,
    NUMBER_OF_REVIEWS,
    LAST_REVIEW,
    REVIEWS_PER_MONTH,
    AVAILABILITY_365,
    HAS_REVIEWS,
];

/// A listing is dropped without any of these.
pub const REQUIRED_COLUMNS: [&str; 6] = [NAME, HOST_NAME, NEIGHBOURHOOD, LATITUDE, LONGITUDE, ROOM_TYPE];

/// Numeric attributes used for the correlation matrix.
pub const CORRELATION_COLUMNS: [&str; 4] = [PRICE, MINIMUM_NIGHTS, NUMBER_OF_REVIEWS, REVIEWS_PER_MONTH];

/// Substituted when a listing has no neighbourhood group.
pub const OTHER_GROUP: &str = "Other";

/// Inclusive upper bound on nightly price.
pub const MAX_PRICE: f64 = 1000.0;

/// Inclusive upper bound on the minimum-nights constraint.
pub const MAX_MINIMUM_NIGHTS: i64 = 30;

pub const LAST_REVIEW_FORMAT: &str = "%Y-%m-%d";

/// A cleaned listing, one row of the stored table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: Option<i64>,
    pub name: String,
    pub host_id: Option<i64>,
    pub host_name: String,
    pub neighbourhood_group: String,
    pub neighbourhood: String,
    pub latitude: f64,
    pub longitude: f64,
    pub room_type: String,
    pub price: f64,
    pub minimum_nights: i64,
    pub number_of_reviews: Option<i64>,
    pub last_review: Option<NaiveDate>,
    pub reviews_per_month: f64,
    pub availability_365: Option<i64>,
    pub has_reviews: bool,
}
