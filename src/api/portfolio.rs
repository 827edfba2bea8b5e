use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Decimal, UserId, WithdrawalStatus};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub holdings: Vec<HoldingDto>,
    pub total_fiat_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingDto {
    pub asset_id: String,
    pub symbol: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: String,
    pub fiat_value: String,
    pub last_updated: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionDto>,
}

/// One row of a user's transaction history: either an investment or a
/// withdrawal, flattened into a single shape for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    pub kind: TransactionKind,
    pub asset_id: String,
    pub quantity: String,
    pub fiat_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WithdrawalStatus>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Investment,
    Withdrawal,
}

/// Dashboard data: the user's materialized holdings with asset metadata
/// and the portfolio's total fiat value.
pub async fn get_portfolio(
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let user_id = UserId::new(params.user_id);
    let balances = state.repo.balances_for_user(&user_id).await?;

    let mut holdings = Vec::with_capacity(balances.len());
    let mut total_fiat_value = Decimal::zero();

    for balance in balances {
        let asset = state
            .repo
            .get_asset(&balance.asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("asset {}", balance.asset_id)))?;

        total_fiat_value = total_fiat_value + balance.fiat_value;
        holdings.push(HoldingDto {
            asset_id: balance.asset_id.0,
            symbol: asset.symbol,
            name: asset.name,
            image_url: asset.image_url,
            quantity: balance.quantity.to_canonical_string(),
            fiat_value: balance.fiat_value.to_canonical_string(),
            last_updated: balance.last_updated.to_rfc3339(),
        });
    }

    Ok(Json(PortfolioResponse {
        holdings,
        total_fiat_value: total_fiat_value.to_canonical_string(),
    }))
}

/// Full transaction history for a user: investments and withdrawals merged,
/// newest first.
pub async fn get_transactions(
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let user_id = UserId::new(params.user_id);

    let investments = state.repo.investments_for_user(&user_id).await?;
    let withdrawals = state.repo.withdrawals_for_user(&user_id).await?;

    let mut transactions: Vec<(chrono::DateTime<chrono::Utc>, TransactionDto)> = Vec::new();

    for inv in investments {
        transactions.push((
            inv.purchased_at,
            TransactionDto {
                id: inv.id,
                kind: TransactionKind::Investment,
                asset_id: inv.asset_id.0,
                quantity: inv.quantity.to_canonical_string(),
                fiat_value: inv.fiat_value.to_canonical_string(),
                status: None,
                timestamp: inv.purchased_at.to_rfc3339(),
            },
        ));
    }

    for w in withdrawals {
        transactions.push((
            w.requested_at,
            TransactionDto {
                id: w.id,
                kind: TransactionKind::Withdrawal,
                asset_id: w.asset_id.0,
                quantity: w.quantity.to_canonical_string(),
                fiat_value: w.fiat_value.to_canonical_string(),
                status: Some(w.status),
                timestamp: w.requested_at.to_rfc3339(),
            },
        ));
    }

    transactions.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(Json(TransactionsResponse {
        transactions: transactions.into_iter().map(|(_, dto)| dto).collect(),
    }))
}
