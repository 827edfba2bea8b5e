use axum::body::Body;
use axum::http::{Request, StatusCode};
use coinvault::api;
use coinvault::config::Config;
use coinvault::db::init_db;
use coinvault::domain::WithdrawalCountPolicy;
use coinvault::{LedgerService, Repository};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        recalc_withdrawal_policy: WithdrawalCountPolicy::CompleteOnly,
        admission_withdrawal_policy: WithdrawalCountPolicy::ExcludeRejected,
    };

    let ledger = Arc::new(LedgerService::new(repo.clone(), &config));
    let app = api::create_router(api::AppState::new(repo, ledger));

    TestApp {
        app,
        _temp: temp_dir,
    }
}

async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed_user_and_asset(app: &axum::Router, unit_value: &str) -> (String, String) {
    let (status, user) = request(
        app,
        "POST",
        "/v1/users",
        Some(json!({"email": "u1@example.com", "name": "U One"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, asset) = request(
        app,
        "POST",
        "/v1/assets",
        Some(json!({"name": "Bitcoin", "symbol": "BTC", "fiatUnitValue": unit_value})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (
        user["id"].as_str().unwrap().to_string(),
        asset["id"].as_str().unwrap().to_string(),
    )
}

async fn holdings(app: &axum::Router, user_id: &str) -> Value {
    let (status, body) = request(
        app,
        "GET",
        &format!("/v1/portfolio?userId={}", user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_recording_an_investment_creates_the_balance() {
    let test = setup_test_app().await;
    let (user_id, asset_id) = seed_user_and_asset(&test.app, "100").await;

    let (status, body) = request(
        &test.app,
        "POST",
        "/v1/investments",
        Some(json!({
            "userId": user_id,
            "assetId": asset_id,
            "quantity": "2.0",
            "fiatValue": "200",
            "externalTxnId": "txn-1",
            "notes": "first buy"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], "2");
    assert_eq!(body["notes"], "first buy");

    let portfolio = holdings(&test.app, &user_id).await;
    assert_eq!(portfolio["holdings"][0]["quantity"], "2");
    assert_eq!(portfolio["holdings"][0]["fiatValue"], "200");
    assert_eq!(portfolio["totalFiatValue"], "200");
}

#[tokio::test]
async fn test_amending_an_investment_moves_the_balance() {
    let test = setup_test_app().await;
    let (user_id, asset_id) = seed_user_and_asset(&test.app, "100").await;

    let (_, inv) = request(
        &test.app,
        "POST",
        "/v1/investments",
        Some(json!({
            "userId": user_id,
            "assetId": asset_id,
            "quantity": "2.0",
            "fiatValue": "200",
            "externalTxnId": "txn-1"
        })),
    )
    .await;
    let inv_id = inv["id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &test.app,
        "PATCH",
        &format!("/v1/investments/{}", inv_id),
        Some(json!({"quantity": "3.5"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], "3.5");

    let portfolio = holdings(&test.app, &user_id).await;
    assert_eq!(portfolio["holdings"][0]["quantity"], "3.5");
    assert_eq!(portfolio["holdings"][0]["fiatValue"], "350");
}

#[tokio::test]
async fn test_deleting_the_only_investment_removes_the_balance() {
    let test = setup_test_app().await;
    let (user_id, asset_id) = seed_user_and_asset(&test.app, "100").await;

    let (_, inv) = request(
        &test.app,
        "POST",
        "/v1/investments",
        Some(json!({
            "userId": user_id,
            "assetId": asset_id,
            "quantity": "2.0",
            "fiatValue": "200",
            "externalTxnId": "txn-1"
        })),
    )
    .await;
    let inv_id = inv["id"].as_str().unwrap().to_string();

    let (status, _) = request(
        &test.app,
        "DELETE",
        &format!("/v1/investments/{}", inv_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let portfolio = holdings(&test.app, &user_id).await;
    assert_eq!(portfolio["holdings"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_multiple_investments_accumulate() {
    let test = setup_test_app().await;
    let (user_id, asset_id) = seed_user_and_asset(&test.app, "10").await;

    for (i, qty) in ["1.5", "0.5", "2"].iter().enumerate() {
        let (status, _) = request(
            &test.app,
            "POST",
            "/v1/investments",
            Some(json!({
                "userId": user_id,
                "assetId": asset_id,
                "quantity": qty,
                "fiatValue": "0",
                "externalTxnId": format!("txn-{}", i)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let portfolio = holdings(&test.app, &user_id).await;
    assert_eq!(portfolio["holdings"][0]["quantity"], "4");
    assert_eq!(portfolio["holdings"][0]["fiatValue"], "40");
}

#[tokio::test]
async fn test_unit_value_with_separators_is_parsed_for_valuation() {
    let test = setup_test_app().await;
    let (user_id, asset_id) = seed_user_and_asset(&test.app, "1,234.56").await;

    let (status, _) = request(
        &test.app,
        "POST",
        "/v1/investments",
        Some(json!({
            "userId": user_id,
            "assetId": asset_id,
            "quantity": "2",
            "fiatValue": "2469.12",
            "externalTxnId": "txn-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let portfolio = holdings(&test.app, &user_id).await;
    assert_eq!(portfolio["holdings"][0]["fiatValue"], "2469.12");
}

#[tokio::test]
async fn test_malformed_asset_value_does_not_fail_the_write() {
    let test = setup_test_app().await;
    let (user_id, asset_id) = seed_user_and_asset(&test.app, "N/A").await;

    // The investment commits even though reconciliation aborts on the
    // unparseable asset value.
    let (status, _) = request(
        &test.app,
        "POST",
        "/v1/investments",
        Some(json!({
            "userId": user_id,
            "assetId": asset_id,
            "quantity": "2",
            "fiatValue": "200",
            "externalTxnId": "txn-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = request(
        &test.app,
        "GET",
        &format!("/v1/investments?userId={}", user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    // No balance was materialized.
    let portfolio = holdings(&test.app, &user_id).await;
    assert_eq!(portfolio["holdings"].as_array().unwrap().len(), 0);

    // Fixing the value and touching the ledger heals the balance.
    let (status, _) = request(
        &test.app,
        "PATCH",
        &format!("/v1/assets/{}/value", asset_id),
        Some(json!({"fiatUnitValue": "100"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &test.app,
        "POST",
        "/v1/investments",
        Some(json!({
            "userId": user_id,
            "assetId": asset_id,
            "quantity": "1",
            "fiatValue": "100",
            "externalTxnId": "txn-2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let portfolio = holdings(&test.app, &user_id).await;
    assert_eq!(portfolio["holdings"][0]["quantity"], "3");
    assert_eq!(portfolio["holdings"][0]["fiatValue"], "300");
}

#[tokio::test]
async fn test_unknown_user_is_rejected() {
    let test = setup_test_app().await;
    let (_, asset_id) = seed_user_and_asset(&test.app, "100").await;

    let (status, body) = request(
        &test.app,
        "POST",
        "/v1/investments",
        Some(json!({
            "userId": "no-such-user",
            "assetId": asset_id,
            "quantity": "2",
            "fiatValue": "200",
            "externalTxnId": "txn-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no-such-user"));
}

#[tokio::test]
async fn test_non_positive_quantity_is_rejected() {
    let test = setup_test_app().await;
    let (user_id, asset_id) = seed_user_and_asset(&test.app, "100").await;

    for qty in ["0", "-1"] {
        let (status, _) = request(
            &test.app,
            "POST",
            "/v1/investments",
            Some(json!({
                "userId": user_id,
                "assetId": asset_id,
                "quantity": qty,
                "fiatValue": "0",
                "externalTxnId": "txn-1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
