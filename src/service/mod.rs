//! Ledger write coordination and reconciliation triggering.
//!
//! Every investment and withdrawal mutation goes through `LedgerService`.
//! It holds the pair lock for the duration of the mutation, runs the
//! admission check where one applies, performs the write, and then invokes
//! the reconciler exactly once for the affected (user, asset) pair.
//!
//! Reconciliation is a best-effort side effect: a recalculation abort is
//! logged and the originating write still stands. Admission failures, in
//! contrast, strictly block the withdrawal write.

use crate::config::Config;
use crate::db::Repository;
use crate::domain::{
    AssetId, Decimal, Investment, UserId, Withdrawal, WithdrawalStatus,
};
use crate::engine::{Admission, PairLocks, Reconciler, WithdrawalGuard};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient balance: available {available}")]
    InsufficientBalance { available: Decimal },
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),
    #[error("{0} not found")]
    NotFound(String),
    #[error("cannot change withdrawal status from {from} to {to}")]
    InvalidTransition {
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Fields for a new investment ledger entry.
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub quantity: Decimal,
    pub fiat_value: Decimal,
    pub purchased_at: Option<DateTime<Utc>>,
    pub external_txn_id: String,
    pub notes: Option<String>,
}

/// Admin amendments to an existing investment entry. `None` leaves the
/// field unchanged.
#[derive(Debug, Clone, Default)]
pub struct InvestmentPatch {
    pub quantity: Option<Decimal>,
    pub fiat_value: Option<Decimal>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub external_txn_id: Option<String>,
    pub notes: Option<String>,
}

/// Fields for a new withdrawal request.
#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub quantity: Decimal,
    pub fiat_value: Decimal,
}

/// Coordinates ledger writes with admission checks and reconciliation.
pub struct LedgerService {
    repo: Arc<Repository>,
    reconciler: Reconciler,
    guard: WithdrawalGuard,
    locks: PairLocks,
}

impl LedgerService {
    pub fn new(repo: Arc<Repository>, config: &Config) -> Self {
        let reconciler = Reconciler::new(repo.clone(), config.recalc_withdrawal_policy);
        let guard = WithdrawalGuard::new(repo.clone(), config.admission_withdrawal_policy);
        Self {
            repo,
            reconciler,
            guard,
            locks: PairLocks::new(),
        }
    }

    // =========================================================================
    // Investments
    // =========================================================================

    /// Record a new investment and reconcile the affected balance.
    pub async fn record_investment(&self, new: NewInvestment) -> Result<Investment, LedgerError> {
        if !new.quantity.is_positive() {
            return Err(LedgerError::NonPositiveQuantity);
        }
        self.require_refs(&new.user_id, &new.asset_id).await?;

        let _pair = self.locks.lock(&new.user_id, &new.asset_id).await;

        let investment = Investment {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            asset_id: new.asset_id,
            quantity: new.quantity,
            fiat_value: new.fiat_value,
            purchased_at: new.purchased_at.unwrap_or_else(Utc::now),
            external_txn_id: new.external_txn_id,
            notes: new.notes,
        };
        self.repo.insert_investment(&investment).await?;

        self.reconcile(&investment.user_id, &investment.asset_id)
            .await;
        Ok(investment)
    }

    /// Amend an investment entry and reconcile the affected balance.
    pub async fn amend_investment(
        &self,
        id: &str,
        patch: InvestmentPatch,
    ) -> Result<Investment, LedgerError> {
        let mut investment = self
            .repo
            .get_investment(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("investment {}", id)))?;

        let _pair = self
            .locks
            .lock(&investment.user_id, &investment.asset_id)
            .await;

        if let Some(quantity) = patch.quantity {
            if !quantity.is_positive() {
                return Err(LedgerError::NonPositiveQuantity);
            }
            investment.quantity = quantity;
        }
        if let Some(fiat_value) = patch.fiat_value {
            investment.fiat_value = fiat_value;
        }
        if let Some(purchased_at) = patch.purchased_at {
            investment.purchased_at = purchased_at;
        }
        if let Some(external_txn_id) = patch.external_txn_id {
            investment.external_txn_id = external_txn_id;
        }
        if let Some(notes) = patch.notes {
            investment.notes = Some(notes);
        }

        if !self.repo.update_investment(&investment).await? {
            return Err(LedgerError::NotFound(format!("investment {}", id)));
        }

        self.reconcile(&investment.user_id, &investment.asset_id)
            .await;
        Ok(investment)
    }

    /// Delete an investment entry and reconcile the affected balance.
    ///
    /// The (user, asset) pair is captured before the row is gone so the
    /// reconciler still knows which balance to recompute.
    pub async fn remove_investment(&self, id: &str) -> Result<(), LedgerError> {
        let investment = self
            .repo
            .get_investment(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("investment {}", id)))?;

        let _pair = self
            .locks
            .lock(&investment.user_id, &investment.asset_id)
            .await;

        if !self.repo.delete_investment(id).await? {
            return Err(LedgerError::NotFound(format!("investment {}", id)));
        }

        self.reconcile(&investment.user_id, &investment.asset_id)
            .await;
        Ok(())
    }

    // =========================================================================
    // Withdrawals
    // =========================================================================

    /// Admit and persist a withdrawal request.
    ///
    /// The admission check, the insert, and the follow-up reconciliation
    /// all run under the pair lock, so two concurrent requests cannot both
    /// be admitted against the same available balance.
    pub async fn request_withdrawal(&self, new: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        if !new.quantity.is_positive() {
            return Err(LedgerError::NonPositiveQuantity);
        }
        self.require_refs(&new.user_id, &new.asset_id).await?;

        let _pair = self.locks.lock(&new.user_id, &new.asset_id).await;

        match self
            .guard
            .check(&new.user_id, &new.asset_id, new.quantity)
            .await?
        {
            Admission::Rejected { available } => {
                return Err(LedgerError::InsufficientBalance { available });
            }
            Admission::Accepted { .. } => {}
        }

        let withdrawal = Withdrawal {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            asset_id: new.asset_id,
            quantity: new.quantity,
            fiat_value: new.fiat_value,
            status: WithdrawalStatus::Pending,
            external_txn_id: None,
            requested_at: Utc::now(),
        };
        self.repo.insert_withdrawal(&withdrawal).await?;

        self.reconcile(&withdrawal.user_id, &withdrawal.asset_id)
            .await;
        Ok(withdrawal)
    }

    /// Move a withdrawal through its status lifecycle and reconcile.
    pub async fn set_withdrawal_status(
        &self,
        id: &str,
        status: WithdrawalStatus,
        external_txn_id: Option<String>,
    ) -> Result<Withdrawal, LedgerError> {
        let withdrawal = self
            .repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("withdrawal {}", id)))?;

        let _pair = self
            .locks
            .lock(&withdrawal.user_id, &withdrawal.asset_id)
            .await;

        if !withdrawal.status.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition {
                from: withdrawal.status,
                to: status,
            });
        }

        if !self
            .repo
            .update_withdrawal_status(id, status, external_txn_id.as_deref())
            .await?
        {
            return Err(LedgerError::NotFound(format!("withdrawal {}", id)));
        }

        self.reconcile(&withdrawal.user_id, &withdrawal.asset_id)
            .await;

        self.repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("withdrawal {}", id)))
    }

    /// Delete a withdrawal entry and reconcile, capturing the pair first.
    pub async fn remove_withdrawal(&self, id: &str) -> Result<(), LedgerError> {
        let withdrawal = self
            .repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("withdrawal {}", id)))?;

        let _pair = self
            .locks
            .lock(&withdrawal.user_id, &withdrawal.asset_id)
            .await;

        if !self.repo.delete_withdrawal(id).await? {
            return Err(LedgerError::NotFound(format!("withdrawal {}", id)));
        }

        self.reconcile(&withdrawal.user_id, &withdrawal.asset_id)
            .await;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Recalculate the pair's balance, logging instead of propagating
    /// failures. The ledger write this follows has already committed.
    async fn reconcile(&self, user_id: &UserId, asset_id: &AssetId) {
        if let Err(e) = self.reconciler.recalculate(user_id, asset_id).await {
            warn!(
                user_id = %user_id,
                asset_id = %asset_id,
                error = %e,
                "balance reconciliation aborted; materialized balance left as-is"
            );
        }
    }

    async fn require_refs(
        &self,
        user_id: &UserId,
        asset_id: &AssetId,
    ) -> Result<(), LedgerError> {
        if self.repo.get_user(user_id).await?.is_none() {
            return Err(LedgerError::UnknownUser(user_id.clone()));
        }
        if self.repo.get_asset(asset_id).await?.is_none() {
            return Err(LedgerError::UnknownAsset(asset_id.clone()));
        }
        Ok(())
    }
}
