//! Materialized active-balance operations for the repository.

use crate::domain::{ActiveBalance, AssetId, Decimal, UserId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_decimal, decode_timestamp, Repository};

impl Repository {
    /// Look up the materialized balance for a (user, asset) pair.
    ///
    /// The pair is unique, so at most one row can match.
    pub async fn find_active_balance(
        &self,
        user_id: &UserId,
        asset_id: &AssetId,
    ) -> Result<Option<ActiveBalance>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, asset_id, quantity, fiat_value, last_updated
            FROM active_balances
            WHERE user_id = ? AND asset_id = ?
            "#,
        )
        .bind(user_id.as_str())
        .bind(asset_id.as_str())
        .fetch_optional(self.pool())
        .await?;
        row.map(|r| map_balance(&r)).transpose()
    }

    /// All materialized balances for a user.
    pub async fn balances_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ActiveBalance>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, asset_id, quantity, fiat_value, last_updated
            FROM active_balances
            WHERE user_id = ?
            ORDER BY asset_id ASC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(map_balance).collect()
    }

    /// Insert a new materialized balance record.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including a violation of the
    /// (user, asset) uniqueness backstop.
    pub async fn insert_active_balance(&self, balance: &ActiveBalance) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO active_balances (id, user_id, asset_id, quantity, fiat_value, last_updated)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&balance.id)
        .bind(balance.user_id.as_str())
        .bind(balance.asset_id.as_str())
        .bind(balance.quantity.to_canonical_string())
        .bind(balance.fiat_value.to_canonical_string())
        .bind(balance.last_updated.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Overwrite an existing balance record with recomputed values.
    ///
    /// Returns false if no record with that id exists.
    pub async fn update_active_balance(
        &self,
        id: &str,
        quantity: Decimal,
        fiat_value: Decimal,
        last_updated: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE active_balances
            SET quantity = ?, fiat_value = ?, last_updated = ?
            WHERE id = ?
            "#,
        )
        .bind(quantity.to_canonical_string())
        .bind(fiat_value.to_canonical_string())
        .bind(last_updated.to_rfc3339())
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a balance record. Returns false if it did not exist.
    pub async fn delete_active_balance(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM active_balances WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count balance rows for a pair. Used by tests to assert the
    /// at-most-one invariant.
    pub async fn count_active_balances(
        &self,
        user_id: &UserId,
        asset_id: &AssetId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM active_balances WHERE user_id = ? AND asset_id = ?",
        )
        .bind(user_id.as_str())
        .bind(asset_id.as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(row.0)
    }
}

fn map_balance(row: &SqliteRow) -> Result<ActiveBalance, sqlx::Error> {
    Ok(ActiveBalance {
        id: row.try_get("id")?,
        user_id: UserId::new(row.try_get::<String, _>("user_id")?),
        asset_id: AssetId::new(row.try_get::<String, _>("asset_id")?),
        quantity: decode_decimal(row, "quantity")?,
        fiat_value: decode_decimal(row, "fiat_value")?,
        last_updated: decode_timestamp(row, "last_updated")?,
    })
}
