//! SQLite Listing Store
//! Writes the canonical listings into a single indexed table, replacing any
//! earlier table of the same name in one transaction.

use crate::data::Listing;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

const COLUMNS: &str = "id, name, host_id, host_name, neighbourhood_group, neighbourhood, \
    latitude, longitude, room_type, price, minimum_nights, number_of_reviews, \
    last_review, reviews_per_month, availability_365, has_reviews";

/// Owns one connection for the duration of a persist stage.
///
/// The connection is released when the store is dropped; [`ListingStore::close`]
/// does the same but reports close failures.
pub struct ListingStore {
    conn: Connection,
    path: PathBuf,
}

impl ListingStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened listing store");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace `table` with `listings` and rebuild its indexes.
    ///
    /// Everything happens inside one transaction: if any statement fails the
    /// previous table stays visible under the same name.
    pub fn replace_listings(&mut self, table: &str, listings: &[Listing]) -> Result<usize, StoreError> {
        validate_table_name(table)?;

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
            CREATE TABLE {table} (
                id INTEGER,
                name TEXT NOT NULL,
                host_id INTEGER,
                host_name TEXT NOT NULL,
                neighbourhood_group TEXT NOT NULL,
                neighbourhood TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                room_type TEXT NOT NULL,
                price REAL NOT NULL,
                minimum_nights INTEGER NOT NULL,
                number_of_reviews INTEGER,
                last_review TEXT,
                reviews_per_month REAL NOT NULL,
                availability_365 INTEGER,
                has_reviews INTEGER NOT NULL
            );"
        ))?;

        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO {table} ({COLUMNS})
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ))?;
            for listing in listings {
                stmt.execute(params![
                    listing.id,
                    listing.name,
                    listing.host_id,
                    listing.host_name,
                    listing.neighbourhood_group,
                    listing.neighbourhood,
                    listing.latitude,
                    listing.longitude,
                    listing.room_type,
                    listing.price,
                    listing.minimum_nights,
                    listing.number_of_reviews,
                    listing.last_review,
                    listing.reviews_per_month,
                    listing.availability_365,
                    listing.has_reviews,
                ])?;
            }
        }

        tx.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS idx_neighborhood ON {table}(neighbourhood_group, neighbourhood);
            CREATE INDEX IF NOT EXISTS idx_price ON {table}(price);
            CREATE INDEX IF NOT EXISTS idx_room_type ON {table}(room_type);"
        ))?;
        tx.commit()?;

        info!(
            path = %self.path.display(),
            table,
            rows = listings.len(),
            "Stored listings"
        );
        Ok(listings.len())
    }

    pub fn count(&self, table: &str) -> Result<usize, StoreError> {
        validate_table_name(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Read the table back in insertion order.
    pub fn read_listings(&self, table: &str) -> Result<Vec<Listing>, StoreError> {
        validate_table_name(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM {table} ORDER BY rowid"))?;
        let rows = stmt.query_map([], |row| {
            Ok(Listing {
                id: row.get(0)?,
                name: row.get(1)?,
                host_id: row.get(2)?,
                host_name: row.get(3)?,
                neighbourhood_group: row.get(4)?,
                neighbourhood: row.get(5)?,
                latitude: row.get(6)?,
                longitude: row.get(7)?,
                room_type: row.get(8)?,
                price: row.get(9)?,
                minimum_nights: row.get(10)?,
                number_of_reviews: row.get(11)?,
                last_review: row.get(12)?,
                reviews_per_month: row.get(13)?,
                availability_365: row.get(14)?,
                has_reviews: row.get(15)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Names of the indexes defined on `table`, sorted.
    pub fn index_names(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 ORDER BY name",
        )?;
        let names = stmt.query_map(params![table], |row| row.get(0))?;
        Ok(names.collect::<Result<Vec<String>, _>>()?)
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, err)| StoreError::Sqlite(err))
    }
}

/// Table names are spliced into SQL, so only plain identifiers pass.
fn validate_table_name(table: &str) -> Result<(), StoreError> {
    let mut chars = table.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(table.to_string()))
    }
}
