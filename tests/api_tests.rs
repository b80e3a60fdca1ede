use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use honeycomb_api::{
    build_router, AppState, BatchEngine, SupabaseConfig, SupabaseStorage,
};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn router_for(server: &MockServer) -> Router {
    let storage = SupabaseStorage::new(
        SupabaseConfig::new(server.base_url(), "service-key"),
        "generatedfiles",
        Duration::from_secs(5),
    )
    .unwrap();
    build_router(Arc::new(AppState::new(BatchEngine::new(storage))))
}

fn unconfigured_router() -> Router {
    build_router(Arc::new(AppState::<SupabaseStorage>::without_storage()))
}

async fn send(app: Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().uri(path).method(method);
    let body = match body {
        Some(value) => {
            req = req.header("Content-Type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(req.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn jitter_body() -> Value {
    json!({
        "job_id": "job-7",
        "boundary_width_mm": 2.0,
        "boundary_height_mm": 1.0,
        "cell_size_um_options": [100.0, 200.0],
        "line_width_um_options": [10.0],
        "seed": 11
    })
}

#[tokio::test]
async fn test_root_and_health_without_storage() {
    let (status, body) = send(unconfigured_router(), Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Welcome"));

    let (status, body) = send(unconfigured_router(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "unconfigured");
}

#[tokio::test]
async fn test_generation_without_storage_is_500() {
    for path in ["/generate/jitter-grid", "/generate/sunflower", "/generate/poisson"] {
        let (status, body) =
            send(unconfigured_router(), Method::POST, path, Some(jitter_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", path);
        assert_eq!(body["errorDetails"]["errorCode"], "ERR_STORAGE_UNAVAILABLE");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .to_lowercase()
            .contains("storage client is not initialised"));
    }
}

#[tokio::test]
async fn test_bad_body_without_storage_is_422() {
    let (status, body) = send(
        unconfigured_router(),
        Method::POST,
        "/generate/jitter-grid",
        Some(json!({"job_id": "job-9"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_VALIDATION");

    let mut empty_options = jitter_body();
    empty_options["cell_size_um_options"] = json!([]);
    let (status, _) = send(
        unconfigured_router(),
        Method::POST,
        "/generate/jitter-grid",
        Some(empty_options),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_jitter_grid_uploads_and_returns_public_urls() {
    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path_contains("/storage/v1/object/generatedfiles/job-7/")
            .header("Authorization", "Bearer service-key")
            .header("Content-Type", "image/vnd.dxf")
            .header("x-upsert", "true");
        then.status(200).json_body(json!({"Key": "ok"}));
    });

    let (status, body) = send(
        router_for(&server),
        Method::POST,
        "/generate/jitter-grid",
        Some(jitter_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["job_id"], "job-7");
    let urls: Vec<String> = serde_json::from_value(body["publicUrls"].clone()).unwrap();
    assert_eq!(
        urls,
        vec![
            format!(
                "{}/storage/v1/object/public/generatedfiles/job-7/jitter_cell-100.0um_gap-10.0um.dxf",
                server.base_url()
            ),
            format!(
                "{}/storage/v1/object/public/generatedfiles/job-7/jitter_cell-200.0um_gap-10.0um.dxf",
                server.base_url()
            ),
        ]
    );
    upload.assert_hits(2);
}

#[tokio::test]
async fn test_poisson_and_sunflower_endpoints() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("/storage/v1/object/generatedfiles/");
        then.status(200);
    });

    let body = json!({
        "job_id": "job-8",
        "boundary_width_mm": 1.0,
        "boundary_height_mm": 1.0,
        "cell_size_um_options": [100.0],
        "seed": 3
    });

    let (status, response) = send(
        router_for(&server),
        Method::POST,
        "/generate/poisson",
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", response);
    assert!(response["publicUrls"][0]
        .as_str()
        .unwrap()
        .ends_with("job-8/poisson_cell-100.0um.dxf"));

    let (status, response) =
        send(router_for(&server), Method::POST, "/generate/sunflower", Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{}", response);
    assert!(response["publicUrls"][0]
        .as_str()
        .unwrap()
        .ends_with("job-8/sunflower_cell-100.0um.dxf"));
}

#[tokio::test]
async fn test_invalid_requests_are_422() {
    let server = MockServer::start();

    let mut empty_options = jitter_body();
    empty_options["cell_size_um_options"] = json!([]);
    let (status, body) = send(
        router_for(&server),
        Method::POST,
        "/generate/jitter-grid",
        Some(empty_options),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_VALIDATION");

    let (status, body) = send(
        router_for(&server),
        Method::POST,
        "/generate/jitter-grid",
        Some(json!({"job_id": "job-9"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_VALIDATION");
}

#[tokio::test]
async fn test_all_uploads_failing_is_500() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST);
        then.status(400).body("Bucket not found");
    });

    let (status, body) = send(
        router_for(&server),
        Method::POST,
        "/generate/jitter-grid",
        Some(jitter_body()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Jitter-Grid: all batch runs failed");
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_BATCH_FAILED");
}
