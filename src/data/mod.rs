//! Data module - CSV loading and cleaning

mod cleaner;
mod loader;
pub mod schema;

pub use cleaner::{CleanOutcome, CleanerError, DataCleaner, MissingValueReport};
pub use loader::{DataLoader, LoaderError};
pub use schema::Listing;
