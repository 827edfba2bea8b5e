//! Withdrawal admission check.

use crate::db::Repository;
use crate::domain::{AssetId, Decimal, UserId, WithdrawalCountPolicy};
use std::sync::Arc;

/// Outcome of an admission check. Both arms carry the available quantity:
/// rejections surface it to the caller, acceptances make it available for
/// logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted { available: Decimal },
    Rejected { available: Decimal },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted { .. })
    }

    pub fn available(&self) -> Decimal {
        match self {
            Admission::Accepted { available } | Admission::Rejected { available } => *available,
        }
    }
}

/// Guards withdrawal creation: a request is admitted only if the user
/// currently holds enough of the asset.
///
/// Pure read-only check, run before the withdrawal row is written. Under
/// the default `ExcludeRejected` policy a pending withdrawal already
/// reserves funds here, even though the materialized balance does not move
/// until completion.
#[derive(Clone)]
pub struct WithdrawalGuard {
    repo: Arc<Repository>,
    policy: WithdrawalCountPolicy,
}

impl WithdrawalGuard {
    pub fn new(repo: Arc<Repository>, policy: WithdrawalCountPolicy) -> Self {
        Self { repo, policy }
    }

    /// Determine the available quantity for the pair and admit or reject
    /// the requested withdrawal. A request equal to the available quantity
    /// is admitted; only `requested > available` rejects.
    ///
    /// # Errors
    /// Returns an error if a ledger lookup fails; the withdrawal must not
    /// be persisted in that case.
    pub async fn check(
        &self,
        user_id: &UserId,
        asset_id: &AssetId,
        requested: Decimal,
    ) -> Result<Admission, sqlx::Error> {
        let total_invested = self
            .repo
            .investments_for(user_id, asset_id)
            .await?
            .iter()
            .fold(Decimal::zero(), |sum, inv| sum + inv.quantity);

        let total_withdrawn = self
            .repo
            .withdrawals_for(user_id, asset_id, self.policy)
            .await?
            .iter()
            .fold(Decimal::zero(), |sum, w| sum + w.quantity);

        let available = total_invested - total_withdrawn;

        if requested > available {
            Ok(Admission::Rejected { available })
        } else {
            Ok(Admission::Accepted { available })
        }
    }
}
