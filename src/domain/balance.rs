//! Materialized active-balance record.

use crate::domain::{AssetId, Decimal, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The materialized net holding of one user in one asset.
///
/// Derived cache, never authoritative: the reconciler recomputes it from
/// the ledger after every investment or withdrawal mutation. At most one
/// record exists per (user, asset), and a record exists only while the net
/// quantity is positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBalance {
    pub id: String,
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub quantity: Decimal,
    pub fiat_value: Decimal,
    pub last_updated: DateTime<Utc>,
}
