//! User and asset reference-data operations for the repository.

use crate::domain::{Asset, AssetId, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_timestamp, Repository};

impl Repository {
    /// Insert a user.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including duplicate email).
    pub async fn insert_user(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.created_at.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Look up a user by id.
    pub async fn get_user(&self, id: &UserId) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await?;
        row.map(|r| map_user(&r)).transpose()
    }

    /// List all users, oldest first.
    pub async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let rows =
            sqlx::query("SELECT id, email, name, created_at FROM users ORDER BY created_at ASC")
                .fetch_all(self.pool())
                .await?;
        rows.iter().map(map_user).collect()
    }

    /// Insert an asset.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including duplicate symbol).
    pub async fn insert_asset(&self, asset: &Asset) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO assets (id, name, symbol, fiat_unit_value, image_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(asset.id.as_str())
        .bind(&asset.name)
        .bind(&asset.symbol)
        .bind(&asset.fiat_unit_value)
        .bind(asset.image_url.as_deref())
        .bind(asset.created_at.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Look up an asset by id.
    pub async fn get_asset(&self, id: &AssetId) -> Result<Option<Asset>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, name, symbol, fiat_unit_value, image_url, created_at FROM assets WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(self.pool())
        .await?;
        row.map(|r| map_asset(&r)).transpose()
    }

    /// List all assets, by symbol.
    pub async fn list_assets(&self) -> Result<Vec<Asset>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, name, symbol, fiat_unit_value, image_url, created_at FROM assets ORDER BY symbol ASC",
        )
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(map_asset).collect()
    }

    /// Overwrite an asset's stored fiat unit value (raw display string).
    ///
    /// Returns false if no asset with that id exists.
    pub async fn update_asset_value(
        &self,
        id: &AssetId,
        fiat_unit_value: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE assets SET fiat_unit_value = ? WHERE id = ?")
            .bind(fiat_unit_value)
            .bind(id.as_str())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get::<String, _>("id")?),
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: decode_timestamp(row, "created_at")?,
    })
}

fn map_asset(row: &SqliteRow) -> Result<Asset, sqlx::Error> {
    Ok(Asset {
        id: AssetId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        symbol: row.try_get("symbol")?,
        fiat_unit_value: row.try_get("fiat_unit_value")?,
        image_url: row.try_get("image_url")?,
        created_at: decode_timestamp(row, "created_at")?,
    })
}
