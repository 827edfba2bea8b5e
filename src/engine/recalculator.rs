//! Balance recalculator: ledger sums to materialized active balance.

use crate::db::Repository;
use crate::domain::{ActiveBalance, AssetId, Decimal, UserId, WithdrawalCountPolicy};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// A recalculation abort. The triggering ledger write has already
/// committed when this surfaces; the caller logs it and moves on, leaving
/// the prior balance record untouched rather than partially written.
#[derive(Debug, Error)]
pub enum RecalcError {
    /// A ledger record carried an empty user or asset reference.
    #[error("ledger record is missing its user or asset reference")]
    MissingReference,
    /// The referenced asset does not exist.
    #[error("asset {0} not found")]
    AssetNotFound(AssetId),
    /// The asset's stored fiat unit value does not parse as a number.
    #[error("asset {asset_id} has unparseable fiat unit value {raw:?}")]
    BadUnitValue { asset_id: AssetId, raw: String },
    /// A storage lookup or write failed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Recomputes net holdings per (user, asset) and maintains the single
/// materialized `active_balances` record for the pair.
#[derive(Clone)]
pub struct Reconciler {
    repo: Arc<Repository>,
    policy: WithdrawalCountPolicy,
}

impl Reconciler {
    pub fn new(repo: Arc<Repository>, policy: WithdrawalCountPolicy) -> Self {
        Self { repo, policy }
    }

    /// Recompute the net holding for a (user, asset) pair and bring its
    /// materialized balance record in line.
    ///
    /// Idempotent: with an unchanged ledger, a second call recomputes the
    /// same values and leaves exactly one (or zero) balance rows.
    ///
    /// Performs at most one write to `active_balances`:
    /// - net > 0, record exists: update it
    /// - net > 0, no record: create one
    /// - net <= 0, record exists: delete it
    /// - net <= 0, no record: nothing to do
    ///
    /// # Errors
    /// Any failed lookup aborts before the write, so the prior record is
    /// never left half-updated.
    pub async fn recalculate(
        &self,
        user_id: &UserId,
        asset_id: &AssetId,
    ) -> Result<(), RecalcError> {
        if user_id.is_empty() || asset_id.is_empty() {
            return Err(RecalcError::MissingReference);
        }

        let invested = self
            .repo
            .investments_for(user_id, asset_id)
            .await?
            .iter()
            .fold(Decimal::zero(), |sum, inv| sum + inv.quantity);

        let withdrawn = self
            .repo
            .withdrawals_for(user_id, asset_id, self.policy)
            .await?
            .iter()
            .fold(Decimal::zero(), |sum, w| sum + w.quantity);

        let net_quantity = invested - withdrawn;

        let asset = self
            .repo
            .get_asset(asset_id)
            .await?
            .ok_or_else(|| RecalcError::AssetNotFound(asset_id.clone()))?;

        let unit_value = Decimal::from_display_string(&asset.fiat_unit_value).map_err(|_| {
            RecalcError::BadUnitValue {
                asset_id: asset_id.clone(),
                raw: asset.fiat_unit_value.clone(),
            }
        })?;

        let fiat_value = net_quantity * unit_value;
        let existing = self.repo.find_active_balance(user_id, asset_id).await?;

        match existing {
            Some(balance) if net_quantity.is_positive() => {
                self.repo
                    .update_active_balance(&balance.id, net_quantity, fiat_value, Utc::now())
                    .await?;
            }
            Some(balance) => {
                self.repo.delete_active_balance(&balance.id).await?;
            }
            None if net_quantity.is_positive() => {
                self.repo
                    .insert_active_balance(&ActiveBalance {
                        id: Uuid::new_v4().to_string(),
                        user_id: user_id.clone(),
                        asset_id: asset_id.clone(),
                        quantity: net_quantity,
                        fiat_value,
                        last_updated: Utc::now(),
                    })
                    .await?;
            }
            None => {}
        }

        Ok(())
    }
}
