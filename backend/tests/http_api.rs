//! HTTP API tests: drive the router in-process with `tower::ServiceExt::oneshot`
//! and check status codes, bodies and the zipped step outputs.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use metaboflow::columns::{COMPOUND_ID, MZ, RETENTION_TIME};
use metaboflow::server::{router, AppState};
use metaboflow::{sheet, Cell, ServerConfig, StorageConfig, Table};

const BOUNDARY: &str = "metaboflow-test-boundary";
const CALLER: &str = "lab7";
const FILE: &str = "batch_01.xlsx";

fn app() -> (TempDir, Router) {
    let root = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        storage: StorageConfig::under(root.path()),
        ..ServerConfig::default()
    };
    let state = Arc::new(AppState::new(config).unwrap());
    (root, router(state))
}

fn measurements() -> Vec<u8> {
    let table = Table::new(vec![
        (
            COMPOUND_ID.into(),
            vec!["PC 34:1_PC".into(), "LPC 16:0_LPC".into(), "Glucose".into()],
        ),
        (
            MZ.into(),
            vec![Cell::Number(760.6), Cell::Number(496.3), Cell::Number(179.1)],
        ),
        (
            RETENTION_TIME.into(),
            vec![Cell::Number(8.4), Cell::Number(0.3), Cell::Number(7.6)],
        ),
        (
            "Sample 1".into(),
            vec![Cell::Number(10.0), Cell::Number(4.0), Cell::Number(30.0)],
        ),
    ])
    .unwrap();
    sheet::to_bytes(&table).unwrap()
}

fn upload_request(filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("id", CALLER)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn step_request(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("id", CALLER)
        .header("filename", FILE)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_root, app) = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_upload_accepts_xlsx() {
    let (root, app) = app();
    let response = app.oneshot(upload_request(FILE, &measurements())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Upload completed successfully");
    assert!(root.path().join("uploads").join("4_lab7_batch_01.xlsx").is_file());
}

#[tokio::test]
async fn test_upload_rejects_other_extensions() {
    let (root, app) = app();
    let response = app
        .oneshot(upload_request("batch_01.csv", b"a,b\n1,2\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_text(response).await, "Invalid extension found");
    assert_eq!(std::fs::read_dir(root.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_extension_checked_before_caller_id() {
    let (_root, app) = app();
    let mut request = upload_request("batch_01.csv", b"a,b\n1,2\n");
    request.headers_mut().remove("id");

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_text(response).await, "Invalid extension found");
}

#[tokio::test]
async fn test_filter_returns_zip_of_three_files() {
    let (_root, app) = app();
    let response = app
        .clone()
        .oneshot(upload_request(FILE, &measurements()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(step_request("/filter_compoundID")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"result.zip\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["PC_batch_01.xlsx", "LPC_batch_01.xlsx", "plasmalogen_batch_01.xlsx"]
    );
}

#[tokio::test]
async fn test_steps_before_upload_are_422() {
    let (_root, app) = app();

    let response = app
        .clone()
        .oneshot(step_request("/filter_compoundID"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_text(response).await,
        "File is not present in server. Please upload your file first"
    );

    let response = app.oneshot(step_request("/roundoff_retention")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_text(response).await, "Query file not found in server");
}

#[tokio::test]
async fn test_mean_before_round_is_432() {
    let (_root, app) = app();
    app.clone()
        .oneshot(upload_request(FILE, &measurements()))
        .await
        .unwrap();

    let response = app.clone().oneshot(step_request("/find_mean")).await.unwrap();
    assert_eq!(response.status().as_u16(), 432);
    assert_eq!(body_text(response).await, "Complete the second task first");

    let response = app
        .clone()
        .oneshot(step_request("/roundoff_retention"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(step_request("/find_mean")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(step_request("/status")).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["caller"], CALLER);
    assert_eq!(json["rounded"], true);
    assert_eq!(json["meaned"], true);
    assert_eq!(json["filtered"], false);
}

#[tokio::test]
async fn test_missing_headers_are_bad_request() {
    let (_root, app) = app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/roundoff_retention")
                .header("id", CALLER)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Missing header: filename");
}
