use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{AssetId, Decimal, UserId, Withdrawal, WithdrawalStatus};
use crate::error::AppError;
use crate::service::NewWithdrawal;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalsQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithdrawalRequest {
    pub user_id: String,
    pub asset_id: String,
    pub quantity: String,
    pub fiat_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWithdrawalStatusRequest {
    pub status: WithdrawalStatus,
    pub external_txn_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalDto {
    pub id: String,
    pub user_id: String,
    pub asset_id: String,
    pub quantity: String,
    pub fiat_value: String,
    pub status: WithdrawalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_txn_id: Option<String>,
    pub requested_at: String,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(w: Withdrawal) -> Self {
        WithdrawalDto {
            id: w.id,
            user_id: w.user_id.0,
            asset_id: w.asset_id.0,
            quantity: w.quantity.to_canonical_string(),
            fiat_value: w.fiat_value.to_canonical_string(),
            status: w.status,
            external_txn_id: w.external_txn_id,
            requested_at: w.requested_at.to_rfc3339(),
        }
    }
}

pub async fn list_withdrawals(
    Query(params): Query<WithdrawalsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<WithdrawalDto>>, AppError> {
    let withdrawals = state
        .repo
        .withdrawals_for_user(&UserId::new(params.user_id))
        .await?;
    Ok(Json(
        withdrawals.into_iter().map(WithdrawalDto::from).collect(),
    ))
}

/// Create a withdrawal request. The admission check runs before the row is
/// written; a request exceeding the available balance is rejected with the
/// available amount in the error payload.
pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(req): Json<CreateWithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalDto>), AppError> {
    let quantity = Decimal::from_str(&req.quantity)
        .map_err(|_| AppError::BadRequest("quantity must be a decimal number".into()))?;
    let fiat_value = Decimal::from_str(&req.fiat_value)
        .map_err(|_| AppError::BadRequest("fiatValue must be a decimal number".into()))?;

    let withdrawal = state
        .ledger
        .request_withdrawal(NewWithdrawal {
            user_id: UserId::new(req.user_id),
            asset_id: AssetId::new(req.asset_id),
            quantity,
            fiat_value,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(withdrawal.into())))
}

pub async fn update_withdrawal_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWithdrawalStatusRequest>,
) -> Result<Json<WithdrawalDto>, AppError> {
    let withdrawal = state
        .ledger
        .set_withdrawal_status(&id, req.status, req.external_txn_id)
        .await?;
    Ok(Json(withdrawal.into()))
}

pub async fn delete_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.ledger.remove_withdrawal(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
