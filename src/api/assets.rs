use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Asset, AssetId};
use crate::error::{map_unique_violation, AppError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetRequest {
    pub name: String,
    pub symbol: String,
    pub fiat_unit_value: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssetValueRequest {
    pub fiat_unit_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDto {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub fiat_unit_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<Asset> for AssetDto {
    fn from(asset: Asset) -> Self {
        AssetDto {
            id: asset.id.0,
            name: asset.name,
            symbol: asset.symbol,
            fiat_unit_value: asset.fiat_unit_value,
            image_url: asset.image_url,
        }
    }
}

pub async fn create_asset(
    State(state): State<AppState>,
    Json(req): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<AssetDto>), AppError> {
    if req.symbol.trim().is_empty() {
        return Err(AppError::BadRequest("symbol must not be empty".into()));
    }

    let asset = Asset {
        id: AssetId::generate(),
        name: req.name,
        symbol: req.symbol,
        fiat_unit_value: req.fiat_unit_value,
        image_url: req.image_url,
        created_at: Utc::now(),
    };

    state
        .repo
        .insert_asset(&asset)
        .await
        .map_err(|e| map_unique_violation(e, "asset symbol already exists"))?;

    Ok((StatusCode::CREATED, Json(asset.into())))
}

pub async fn list_assets(
    State(state): State<AppState>,
) -> Result<Json<Vec<AssetDto>>, AppError> {
    let assets = state.repo.list_assets().await?;
    Ok(Json(assets.into_iter().map(AssetDto::from).collect()))
}

/// Store a new fiat unit value for an asset. The raw string is stored
/// as-is; it is validated only when a balance is next valued, so an
/// operator typo degrades to aborted recalculations rather than a rejected
/// price update losing data.
pub async fn update_asset_value(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAssetValueRequest>,
) -> Result<Json<AssetDto>, AppError> {
    let asset_id = AssetId::new(id);

    if !state
        .repo
        .update_asset_value(&asset_id, &req.fiat_unit_value)
        .await?
    {
        return Err(AppError::NotFound(format!("asset {}", asset_id)));
    }

    let asset = state
        .repo
        .get_asset(&asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("asset {}", asset_id)))?;
    Ok(Json(asset.into()))
}
