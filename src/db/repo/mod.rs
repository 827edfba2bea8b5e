//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database access.
//! Methods are organized across submodules by domain:
//! - `catalog.rs` - user and asset reference data
//! - `ledger.rs` - investment and withdrawal ledger entries
//! - `balances.rs` - materialized active-balance records
//!
//! Repository reads see the full ledger unconditionally; per-user access
//! control is a presentation concern, and reconciliation must observe every
//! entry regardless of who triggered it.

mod balances;
mod catalog;
mod ledger;

use crate::domain::Decimal;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Decode a canonical decimal string column.
pub(crate) fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Decode an RFC 3339 timestamp column.
pub(crate) fn decode_timestamp(
    row: &SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}
