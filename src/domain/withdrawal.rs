//! Withdrawal ledger entry, status lifecycle, and counting policies.

use crate::domain::{AssetId, Decimal, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Processing status of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WithdrawalStatus {
    /// Submitted, awaiting admin action.
    Pending,
    /// Being processed by an admin.
    InProgress,
    /// Declined; never counts against balance.
    Rejected,
    /// Paid out on-chain.
    Complete,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::InProgress => "inProgress",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Complete => "complete",
        }
    }

    /// Whether a status transition is allowed. Rejected and complete are
    /// terminal.
    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        match self {
            WithdrawalStatus::Pending => next != WithdrawalStatus::Pending,
            WithdrawalStatus::InProgress => matches!(
                next,
                WithdrawalStatus::Rejected | WithdrawalStatus::Complete
            ),
            WithdrawalStatus::Rejected | WithdrawalStatus::Complete => false,
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WithdrawalStatus::Pending),
            "inProgress" => Ok(WithdrawalStatus::InProgress),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            "complete" => Ok(WithdrawalStatus::Complete),
            other => Err(format!("unknown withdrawal status: {}", other)),
        }
    }
}

/// Which withdrawals count against a balance.
///
/// The admission check and the recalculator each carry their own policy.
/// With the default configuration the admission check excludes only
/// rejected requests (pending withdrawals reserve funds) while the
/// recalculator counts only completed ones (the materialized balance moves
/// when the payout happens).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalCountPolicy {
    /// Count every withdrawal that was not rejected.
    ExcludeRejected,
    /// Count only completed withdrawals.
    CompleteOnly,
}

impl WithdrawalCountPolicy {
    /// Whether a withdrawal with the given status counts under this policy.
    pub fn counts(&self, status: WithdrawalStatus) -> bool {
        match self {
            WithdrawalCountPolicy::ExcludeRejected => status != WithdrawalStatus::Rejected,
            WithdrawalCountPolicy::CompleteOnly => status == WithdrawalStatus::Complete,
        }
    }
}

/// A withdrawal ledger entry for `quantity` units of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: String,
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub quantity: Decimal,
    pub fiat_value: Decimal,
    pub status: WithdrawalStatus,
    pub external_txn_id: Option<String>,
    pub requested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            WithdrawalStatus::Pending,
            WithdrawalStatus::InProgress,
            WithdrawalStatus::Rejected,
            WithdrawalStatus::Complete,
        ] {
            assert_eq!(WithdrawalStatus::from_str(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn test_status_serde_camel_case() {
        let json = serde_json::to_string(&WithdrawalStatus::InProgress).unwrap();
        assert_eq!(json, "\"inProgress\"");
    }

    #[test]
    fn test_pending_can_move_anywhere_but_pending() {
        let pending = WithdrawalStatus::Pending;
        assert!(pending.can_transition_to(WithdrawalStatus::InProgress));
        assert!(pending.can_transition_to(WithdrawalStatus::Rejected));
        assert!(pending.can_transition_to(WithdrawalStatus::Complete));
        assert!(!pending.can_transition_to(WithdrawalStatus::Pending));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!WithdrawalStatus::Rejected.can_transition_to(WithdrawalStatus::Pending));
        assert!(!WithdrawalStatus::Complete.can_transition_to(WithdrawalStatus::Rejected));
    }

    #[test]
    fn test_exclude_rejected_policy() {
        let p = WithdrawalCountPolicy::ExcludeRejected;
        assert!(p.counts(WithdrawalStatus::Pending));
        assert!(p.counts(WithdrawalStatus::InProgress));
        assert!(p.counts(WithdrawalStatus::Complete));
        assert!(!p.counts(WithdrawalStatus::Rejected));
    }

    #[test]
    fn test_complete_only_policy() {
        let p = WithdrawalCountPolicy::CompleteOnly;
        assert!(!p.counts(WithdrawalStatus::Pending));
        assert!(!p.counts(WithdrawalStatus::InProgress));
        assert!(!p.counts(WithdrawalStatus::Rejected));
        assert!(p.counts(WithdrawalStatus::Complete));
    }
}
