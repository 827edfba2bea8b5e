//! Investment and withdrawal ledger operations for the repository.

use crate::domain::{
    AssetId, Investment, UserId, Withdrawal, WithdrawalCountPolicy, WithdrawalStatus,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use super::{decode_decimal, decode_timestamp, Repository};

impl Repository {
    // =========================================================================
    // Investment operations
    // =========================================================================

    /// Insert an investment ledger entry.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_investment(&self, investment: &Investment) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO investments
                (id, user_id, asset_id, quantity, fiat_value, purchased_at, external_txn_id, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&investment.id)
        .bind(investment.user_id.as_str())
        .bind(investment.asset_id.as_str())
        .bind(investment.quantity.to_canonical_string())
        .bind(investment.fiat_value.to_canonical_string())
        .bind(investment.purchased_at.to_rfc3339())
        .bind(&investment.external_txn_id)
        .bind(investment.notes.as_deref())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Look up an investment by id.
    pub async fn get_investment(&self, id: &str) -> Result<Option<Investment>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, asset_id, quantity, fiat_value, purchased_at, external_txn_id, notes
            FROM investments WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(|r| map_investment(&r)).transpose()
    }

    /// Overwrite the mutable fields of an investment entry.
    ///
    /// Returns false if no entry with that id exists.
    pub async fn update_investment(&self, investment: &Investment) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE investments
            SET quantity = ?, fiat_value = ?, purchased_at = ?, external_txn_id = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(investment.quantity.to_canonical_string())
        .bind(investment.fiat_value.to_canonical_string())
        .bind(investment.purchased_at.to_rfc3339())
        .bind(&investment.external_txn_id)
        .bind(investment.notes.as_deref())
        .bind(&investment.id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an investment entry. Returns false if it did not exist.
    pub async fn delete_investment(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM investments WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All investment entries for a (user, asset) pair, oldest first.
    pub async fn investments_for(
        &self,
        user_id: &UserId,
        asset_id: &AssetId,
    ) -> Result<Vec<Investment>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, asset_id, quantity, fiat_value, purchased_at, external_txn_id, notes
            FROM investments
            WHERE user_id = ? AND asset_id = ?
            ORDER BY purchased_at ASC, id ASC
            "#,
        )
        .bind(user_id.as_str())
        .bind(asset_id.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(map_investment).collect()
    }

    /// All investment entries for a user across assets, newest first.
    pub async fn investments_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Investment>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, asset_id, quantity, fiat_value, purchased_at, external_txn_id, notes
            FROM investments
            WHERE user_id = ?
            ORDER BY purchased_at DESC, id ASC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(map_investment).collect()
    }

    // =========================================================================
    // Withdrawal operations
    // =========================================================================

    /// Insert a withdrawal ledger entry.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO withdrawals
                (id, user_id, asset_id, quantity, fiat_value, status, external_txn_id, requested_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&withdrawal.id)
        .bind(withdrawal.user_id.as_str())
        .bind(withdrawal.asset_id.as_str())
        .bind(withdrawal.quantity.to_canonical_string())
        .bind(withdrawal.fiat_value.to_canonical_string())
        .bind(withdrawal.status.as_str())
        .bind(withdrawal.external_txn_id.as_deref())
        .bind(withdrawal.requested_at.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Look up a withdrawal by id.
    pub async fn get_withdrawal(&self, id: &str) -> Result<Option<Withdrawal>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, asset_id, quantity, fiat_value, status, external_txn_id, requested_at
            FROM withdrawals WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(|r| map_withdrawal(&r)).transpose()
    }

    /// Set a withdrawal's status (and, when completing, its external
    /// transaction id). Returns false if no entry with that id exists.
    pub async fn update_withdrawal_status(
        &self,
        id: &str,
        status: WithdrawalStatus,
        external_txn_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawals
            SET status = ?, external_txn_id = COALESCE(?, external_txn_id)
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(external_txn_id)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a withdrawal entry. Returns false if it did not exist.
    pub async fn delete_withdrawal(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM withdrawals WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Withdrawal entries for a (user, asset) pair that count under the
    /// given policy, oldest first.
    pub async fn withdrawals_for(
        &self,
        user_id: &UserId,
        asset_id: &AssetId,
        policy: WithdrawalCountPolicy,
    ) -> Result<Vec<Withdrawal>, sqlx::Error> {
        let sql = match policy {
            WithdrawalCountPolicy::ExcludeRejected => {
                r#"
                SELECT id, user_id, asset_id, quantity, fiat_value, status, external_txn_id, requested_at
                FROM withdrawals
                WHERE user_id = ? AND asset_id = ? AND status != 'rejected'
                ORDER BY requested_at ASC, id ASC
                "#
            }
            WithdrawalCountPolicy::CompleteOnly => {
                r#"
                SELECT id, user_id, asset_id, quantity, fiat_value, status, external_txn_id, requested_at
                FROM withdrawals
                WHERE user_id = ? AND asset_id = ? AND status = 'complete'
                ORDER BY requested_at ASC, id ASC
                "#
            }
        };

        let rows = sqlx::query(sql)
            .bind(user_id.as_str())
            .bind(asset_id.as_str())
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(map_withdrawal).collect()
    }

    /// All withdrawal entries for a user across assets and statuses,
    /// newest first.
    pub async fn withdrawals_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Withdrawal>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, asset_id, quantity, fiat_value, status, external_txn_id, requested_at
            FROM withdrawals
            WHERE user_id = ?
            ORDER BY requested_at DESC, id ASC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(map_withdrawal).collect()
    }
}

fn map_investment(row: &SqliteRow) -> Result<Investment, sqlx::Error> {
    Ok(Investment {
        id: row.try_get("id")?,
        user_id: UserId::new(row.try_get::<String, _>("user_id")?),
        asset_id: AssetId::new(row.try_get::<String, _>("asset_id")?),
        quantity: decode_decimal(row, "quantity")?,
        fiat_value: decode_decimal(row, "fiat_value")?,
        purchased_at: decode_timestamp(row, "purchased_at")?,
        external_txn_id: row.try_get("external_txn_id")?,
        notes: row.try_get("notes")?,
    })
}

fn map_withdrawal(row: &SqliteRow) -> Result<Withdrawal, sqlx::Error> {
    let status_raw: String = row.try_get("status")?;
    let status = WithdrawalStatus::from_str(&status_raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: e.into(),
    })?;

    Ok(Withdrawal {
        id: row.try_get("id")?,
        user_id: UserId::new(row.try_get::<String, _>("user_id")?),
        asset_id: AssetId::new(row.try_get::<String, _>("asset_id")?),
        quantity: decode_decimal(row, "quantity")?,
        fiat_value: decode_decimal(row, "fiat_value")?,
        status,
        external_txn_id: row.try_get("external_txn_id")?,
        requested_at: decode_timestamp(row, "requested_at")?,
    })
}
