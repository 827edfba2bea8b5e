pub mod assets;
pub mod health;
pub mod investments;
pub mod portfolio;
pub mod users;
pub mod withdrawals;

use crate::db::Repository;
use crate::service::LedgerService;
use axum::{
    routing::{delete, get, patch},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, ledger: Arc<LedgerService>) -> Self {
        Self { repo, ledger }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/users", get(users::list_users).post(users::create_user))
        .route(
            "/v1/assets",
            get(assets::list_assets).post(assets::create_asset),
        )
        .route("/v1/assets/:id/value", patch(assets::update_asset_value))
        .route(
            "/v1/investments",
            get(investments::list_investments).post(investments::create_investment),
        )
        .route(
            "/v1/investments/:id",
            patch(investments::amend_investment).delete(investments::delete_investment),
        )
        .route(
            "/v1/withdrawals",
            get(withdrawals::list_withdrawals).post(withdrawals::create_withdrawal),
        )
        .route(
            "/v1/withdrawals/:id/status",
            patch(withdrawals::update_withdrawal_status),
        )
        .route("/v1/withdrawals/:id", delete(withdrawals::delete_withdrawal))
        .route("/v1/portfolio", get(portfolio::get_portfolio))
        .route("/v1/transactions", get(portfolio::get_transactions))
        .layer(cors)
        .with_state(state)
}
