//! Store module - SQLite persistence of cleaned listings

mod sqlite;

pub use sqlite::{ListingStore, StoreError};
