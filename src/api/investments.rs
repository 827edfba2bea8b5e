use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{AssetId, Decimal, Investment, UserId};
use crate::error::AppError;
use crate::service::{InvestmentPatch, NewInvestment};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentsQuery {
    pub user_id: String,
    pub asset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvestmentRequest {
    pub user_id: String,
    pub asset_id: String,
    pub quantity: String,
    pub fiat_value: String,
    pub purchased_at: Option<DateTime<Utc>>,
    pub external_txn_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendInvestmentRequest {
    pub quantity: Option<String>,
    pub fiat_value: Option<String>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub external_txn_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentDto {
    pub id: String,
    pub user_id: String,
    pub asset_id: String,
    pub quantity: String,
    pub fiat_value: String,
    pub purchased_at: String,
    pub external_txn_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<Investment> for InvestmentDto {
    fn from(inv: Investment) -> Self {
        InvestmentDto {
            id: inv.id,
            user_id: inv.user_id.0,
            asset_id: inv.asset_id.0,
            quantity: inv.quantity.to_canonical_string(),
            fiat_value: inv.fiat_value.to_canonical_string(),
            purchased_at: inv.purchased_at.to_rfc3339(),
            external_txn_id: inv.external_txn_id,
            notes: inv.notes,
        }
    }
}

fn parse_quantity(raw: &str, field: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("{} must be a decimal number", field)))
}

pub async fn list_investments(
    Query(params): Query<InvestmentsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<InvestmentDto>>, AppError> {
    let user_id = UserId::new(params.user_id);
    let investments = match params.asset_id {
        Some(asset_id) => {
            state
                .repo
                .investments_for(&user_id, &AssetId::new(asset_id))
                .await?
        }
        None => state.repo.investments_for_user(&user_id).await?,
    };
    Ok(Json(
        investments.into_iter().map(InvestmentDto::from).collect(),
    ))
}

pub async fn create_investment(
    State(state): State<AppState>,
    Json(req): Json<CreateInvestmentRequest>,
) -> Result<(StatusCode, Json<InvestmentDto>), AppError> {
    let investment = state
        .ledger
        .record_investment(NewInvestment {
            user_id: UserId::new(req.user_id),
            asset_id: AssetId::new(req.asset_id),
            quantity: parse_quantity(&req.quantity, "quantity")?,
            fiat_value: parse_quantity(&req.fiat_value, "fiatValue")?,
            purchased_at: req.purchased_at,
            external_txn_id: req.external_txn_id,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(investment.into())))
}

pub async fn amend_investment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AmendInvestmentRequest>,
) -> Result<Json<InvestmentDto>, AppError> {
    let patch = InvestmentPatch {
        quantity: req
            .quantity
            .as_deref()
            .map(|q| parse_quantity(q, "quantity"))
            .transpose()?,
        fiat_value: req
            .fiat_value
            .as_deref()
            .map(|v| parse_quantity(v, "fiatValue"))
            .transpose()?,
        purchased_at: req.purchased_at,
        external_txn_id: req.external_txn_id,
        notes: req.notes,
    };

    let investment = state.ledger.amend_investment(&id, patch).await?;
    Ok(Json(investment.into()))
}

pub async fn delete_investment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.ledger.remove_investment(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
