//! Investment ledger entry.

use crate::domain::{AssetId, Decimal, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An investment ledger entry: an admin-recorded purchase of `quantity`
/// units of an asset for `fiat_value`. Entries are append-mostly and never
/// modified automatically; balances are derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investment {
    pub id: String,
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub quantity: Decimal,
    pub fiat_value: Decimal,
    pub purchased_at: DateTime<Utc>,
    pub external_txn_id: String,
    pub notes: Option<String>,
}
