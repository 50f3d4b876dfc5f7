// API integration tests that verify HTTP endpoints
// Tests the Axum router with real HTTP requests against an in-memory store

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{export_with_duplicate_day, vendor_csv, vendor_row, FailingStore};
use http_body_util::BodyExt; // For `.collect()`
use scale_import_service::api::{create_router, AppState};
use scale_import_service::db::{InMemoryMeasurementStore, MeasurementStore};
use scale_import_service::services::ImportService;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot`

fn app_with_store(store: Arc<dyn MeasurementStore>) -> axum::Router {
    create_router(AppState {
        import_service: ImportService::new(10 * 1024 * 1024),
        store,
    })
}

async fn post(app: axum::Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "text/csv")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app_with_store(Arc::new(InMemoryMeasurementStore::new()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_preview_returns_parse_result() {
    let app = app_with_store(Arc::new(InMemoryMeasurementStore::new()));

    let (status, json) = post(
        app,
        "/api/v1/imports/preview?file_name=export.csv",
        export_with_duplicate_day(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rawRecords"].as_array().unwrap().len(), 3);
    assert_eq!(json["canonicalRecords"].as_array().unwrap().len(), 3);
    assert_eq!(json["canonicalRecords"][0]["date"], "2024-01-01");
    assert_eq!(json["canonicalRecords"][0]["bodyFatPct"], 18.0);
    assert_eq!(json["groupedByDate"]["2024-01-01"].as_array().unwrap().len(), 2);
    assert_eq!(json["duplicateGroups"][0]["count"], 2);
    assert_eq!(json["validation"]["isValid"], true);
}

#[tokio::test]
async fn test_preview_still_returns_invalid_results() {
    let app = app_with_store(Arc::new(InMemoryMeasurementStore::new()));
    let content = vendor_csv(&[vendor_row("01/01/24", "07:00", 25.0, 20.0, 18.0)]);

    let (status, json) = post(app, "/api/v1/imports/preview?file_name=export.csv", content).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["validation"]["isValid"], false);
    assert!(json["validation"]["errors"][0]
        .as_str()
        .unwrap()
        .contains("Minimum weight"));
}

#[tokio::test]
async fn test_preview_rejects_non_csv() {
    let app = app_with_store(Arc::new(InMemoryMeasurementStore::new()));

    let (status, json) = post(
        app,
        "/api/v1/imports/preview?file_name=export.xlsx",
        export_with_duplicate_day(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_file");
}

#[tokio::test]
async fn test_preview_missing_column_is_unprocessable() {
    let app = app_with_store(Arc::new(InMemoryMeasurementStore::new()));
    let content = "Fecha, Hora, Peso(kg),Grasa corporal(%)\n01/01/24,07:00,70,18\n".to_string();

    let (status, json) = post(app, "/api/v1/imports/preview?file_name=export.csv", content).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "invalid_format");
    assert!(json["message"].as_str().unwrap().contains("IMC"));
}

#[tokio::test]
async fn test_commit_average() {
    let store = Arc::new(InMemoryMeasurementStore::new());
    let app = app_with_store(store.clone());

    let (status, json) = post(
        app,
        "/api/v1/imports/commit?file_name=export.csv&strategy=average",
        export_with_duplicate_day(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["strategy"], "average");
    assert_eq!(json["successCount"], 2);
    assert_eq!(json["failureCount"], 0);
    assert_eq!(json["finalRecords"][0]["weightKg"], 71.0);
    assert_eq!(store.records().len(), 2);
}

#[tokio::test]
async fn test_commit_blocked_by_validation() {
    let store = Arc::new(InMemoryMeasurementStore::new());
    let app = app_with_store(store.clone());
    let content = vendor_csv(&[vendor_row("01/01/24", "07:00", 25.0, 20.0, 18.0)]);

    let (status, json) = post(
        app,
        "/api/v1/imports/commit?file_name=export.csv&strategy=keep_all",
        content,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "validation_blocked");
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_commit_unknown_strategy_is_bad_request() {
    let app = app_with_store(Arc::new(InMemoryMeasurementStore::new()));

    let (status, _) = post(
        app,
        "/api/v1/imports/commit?file_name=export.csv&strategy=median",
        export_with_duplicate_day(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_commit_store_failure_is_server_error() {
    let app = app_with_store(Arc::new(FailingStore));

    let (status, json) = post(
        app,
        "/api/v1/imports/commit?file_name=export.csv&strategy=keep_all",
        export_with_duplicate_day(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "persistence_failure");
}
