use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use configuration::ServerConfig;
use database::{DbRepository, connect_in_memory};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{AppState, router};

// ============================================================================
// Helpers
// ============================================================================

async fn app() -> Router {
    let repo = DbRepository::new(connect_in_memory().await.expect("in-memory database"));
    router(Arc::new(AppState::new(repo)), &ServerConfig::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_text(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_raw(app: &Router, uri: &str) -> (StatusCode, header::HeaderMap, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn seed_january(app: &Router) {
    send(app, Method::PUT, "/api/settings", Some(json!({ "starting_balance": 1000.0 }))).await;
    send(app, Method::POST, "/api/entries", Some(json!({ "Date": "2024-01-01", "Gain": 100 }))).await;
    send(app, Method::POST, "/api/entries", Some(json!({ "Date": "2024-01-02", "Loss": "50" }))).await;
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn health_is_healthy() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn settings_start_at_defaults_and_update_partially() {
    let app = app().await;
    let (_, body) = send(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(body, json!({ "starting_balance": 0.0, "exchange_rate": 1.0 }));

    let (status, body) = send(&app, Method::PUT, "/api/settings", Some(json!({ "exchange_rate": 83.5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "starting_balance": 0.0, "exchange_rate": 83.5 }));

    let (_, body) = send(&app, Method::PUT, "/api/settings", Some(json!({ "starting_balance": 500 }))).await;
    assert_eq!(body, json!({ "starting_balance": 500.0, "exchange_rate": 83.5 }));
}

#[tokio::test]
async fn adding_an_entry_returns_it_with_an_id() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "Date": "2024-03-05", "Gain": "12.5", "Loss": "abc", "Deposit": null })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_string());
    assert_eq!(body["date"], "2024-03-05");
    assert_eq!(body["gain"], 12.5);
    assert_eq!(body["loss"], 0.0);
    assert_eq!(body["deposit"], 0.0);

    let (_, listed) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn entries_without_a_readable_date_are_rejected() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/api/entries", Some(json!({ "Gain": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::POST, "/api/entries", Some(json!({ "Date": "yesterday" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn deleting_entries() {
    let app = app().await;
    let (_, created) = send(&app, Method::POST, "/api/entries", Some(json!({ "Date": "2024-01-01" }))).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/entries/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/entries/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::DELETE, "/api/entries/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_follow_the_store_and_settings() {
    let app = app().await;

    let (_, empty) = send(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(empty["daily"], json!([]));
    assert_eq!(empty["monthly"], json!([]));

    seed_january(&app).await;
    let (status, report) = send(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(status, StatusCode::OK);

    let daily = report["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0]["serial"], 1);
    assert_eq!(daily[0]["balance"], 1100.0);
    assert_eq!(daily[1]["net"], -50.0);
    assert_eq!(daily[1]["balance"], 1050.0);

    let monthly = report["monthly"].as_array().unwrap();
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0]["month"], "2024-01");
    assert_eq!(monthly[0]["balance"], 1050.0);

    // A settings change shows up on the next read.
    send(&app, Method::PUT, "/api/settings", Some(json!({ "starting_balance": 0 }))).await;
    let (_, report) = send(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(report["daily"][1]["balance"], 50.0);
}

#[tokio::test]
async fn calculate_uses_stored_settings_unless_overridden() {
    let app = app().await;
    send(&app, Method::PUT, "/api/settings", Some(json!({ "starting_balance": 1000, "exchange_rate": 2 }))).await;

    let data = json!([
        { "Date": "2024-01-01", "Gain": 100, "Withdrawal": 10 },
        { "Date": "2024-01-01", "Gain": 5, "Loss": 2 },
    ]);

    let (status, report) = send(&app, Method::POST, "/api/calculate", Some(json!({ "data": data }))).await;
    assert_eq!(status, StatusCode::OK);
    let day = &report["daily"][0];
    assert_eq!(day["gain"], 105.0);
    assert_eq!(day["loss"], 2.0);
    assert_eq!(day["balance"], 1093.0);
    assert_eq!(day["cumulative_withdrawal_converted"], 20.0);

    let (_, report) = send(
        &app,
        Method::POST,
        "/api/calculate",
        Some(json!({ "data": data, "starting_balance": 0, "exchange_rate": 1 })),
    )
    .await;
    assert_eq!(report["daily"][0]["balance"], 93.0);

    // Shipped entries never reach the store.
    let (_, listed) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn calculate_reports_rejected_entries_or_fails_when_strict() {
    let app = app().await;
    let body = json!({
        "data": [
            { "Date": "2024-01-01", "Gain": 10 },
            { "Date": "31/31/2024", "Gain": 99 },
        ]
    });

    let (status, report) = send(&app, Method::POST, "/api/calculate", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["daily"].as_array().unwrap().len(), 1);
    assert_eq!(report["rejected"][0]["index"], 1);
    assert_eq!(report["rejected"][0]["date"], "31/31/2024");

    let (status, err) = send(&app, Method::POST, "/api/calculate?strict=true", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("31/31/2024"));
}

#[tokio::test]
async fn exports_are_csv_attachments() {
    let app = app().await;
    seed_january(&app).await;

    let (status, headers, text) = get_raw(&app, "/api/export/daily.csv").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"PnL_Tracker_DateWise_"));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Sl,Date,Gain ($)"));
    assert!(lines[2].ends_with(",1050.00"));

    let (_, _, monthly) = get_raw(&app, "/api/export/monthly.csv").await;
    assert_eq!(monthly.lines().count(), 2);

    let (_, _, entries) = get_raw(&app, "/api/export/entries.csv").await;
    assert_eq!(
        entries.lines().collect::<Vec<_>>(),
        [
            "Date,Gain ($),Loss ($),Withdrawal ($),Deposit ($)",
            "2024-01-01,100,0,0,0",
            "2024-01-02,0,50,0,0",
        ]
    );
}

#[tokio::test]
async fn import_replaces_the_ledger() {
    let app = app().await;
    seed_january(&app).await;

    let csv = "Date,Gain ($),Loss ($),Withdrawal ($),Deposit ($)\n\
               2024-02-01,10,0,0,0\n\
               ,5,0,0,0\n\
               not a date,1,0,0,0\n\
               2024-02-03,0,4,0,100\n";
    let (status, summary) = send_text(&app, Method::POST, "/api/import/csv", csv).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, json!({ "imported": 2, "skipped": 2 }));

    let (_, listed) = send(&app, Method::GET, "/api/entries", None).await;
    let dates: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, ["2024-02-01", "2024-02-03"]);
}

#[tokio::test]
async fn import_without_required_columns_is_a_bad_request() {
    let app = app().await;
    seed_january(&app).await;

    let (status, body) = send_text(&app, Method::POST, "/api/import/csv", "Date,Gain\n2024-01-01,5\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Loss"));

    // The previous ledger is untouched.
    let (_, listed) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}
