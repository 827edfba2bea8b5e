//! Tracked asset reference data.

use crate::domain::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked crypto asset.
///
/// `fiat_unit_value` is kept as the raw display string an operator (or an
/// external price lookup) wrote, possibly with thousands separators. It is
/// parsed with `Decimal::from_display_string` only at valuation time, so a
/// malformed value surfaces as a reconciliation abort rather than a
/// corrupted stored number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub symbol: String,
    pub fiat_unit_value: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
