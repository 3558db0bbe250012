//! Integration tests for the intake API
//!
//! Drives the real router in-process with axum-test. Each test gets its
//! own temporary upload directory and an in-memory recorder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use intake_api::error::INTERNAL_ERROR_MESSAGE;
use intake_api::{create_router, AppState, OrderResponse};
use intake_core::{
    IntakeError, IntakeResult, MemoryRecorder, Order, OrderRecorder, UploadSink,
    DEFAULT_MAX_UPLOAD_BYTES,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Fixture
// =============================================================================

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nproof-of-transfer";

struct Fixture {
    server: TestServer,
    recorder: Arc<MemoryRecorder>,
    upload_dir: PathBuf,
    placeholder: PathBuf,
    _tmp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn with_limit(max_upload_bytes: u64) -> Self {
        let recorder = Arc::new(MemoryRecorder::new());
        Self::build(max_upload_bytes, recorder.clone(), recorder)
    }

    /// Router wired to `recorder`; `self.recorder` stays empty
    fn with_recorder(recorder: Arc<dyn OrderRecorder>) -> Self {
        Self::build(
            DEFAULT_MAX_UPLOAD_BYTES,
            recorder,
            Arc::new(MemoryRecorder::new()),
        )
    }

    fn build(
        max_upload_bytes: u64,
        wired: Arc<dyn OrderRecorder>,
        recorder: Arc<MemoryRecorder>,
    ) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let upload_dir = tmp.path().join("uploads");
        let placeholder = tmp.path().join("placeholder-qris.png");

        let state = AppState::new(
            UploadSink::new(&upload_dir, max_upload_bytes),
            &placeholder,
            wired,
        );
        let server = TestServer::new(create_router(state)).unwrap();

        Self {
            server,
            recorder,
            upload_dir,
            placeholder,
            _tmp: tmp,
        }
    }

    /// Names of all files currently in the upload directory
    fn stored_files(&self) -> Vec<String> {
        list_dir(&self.upload_dir)
    }
}

/// Recorder whose backing store is unavailable
struct FailingRecorder;

#[async_trait]
impl OrderRecorder for FailingRecorder {
    async fn record(&self, _order: &Order) -> IntakeResult<()> {
        Err(IntakeError::Recorder("order store unavailable".into()))
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn order_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("plan", "Premium 30 Hari"),
        ("price", "50000"),
        ("adminFee", "1500"),
        ("total", "51500"),
        ("orderId", "ORD-1700000000000"),
        ("customerName", "Budi Santoso"),
        ("customerPhone", "081234567890"),
    ]
}

fn form_without(skip: &str) -> MultipartForm {
    order_fields()
        .into_iter()
        .filter(|(name, _)| *name != skip)
        .fold(MultipartForm::new(), |form, (name, value)| {
            form.add_text(name, value)
        })
}

fn proof_part(bytes: Vec<u8>, file_name: &str) -> Part {
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_type("image/png")
}

/// `proof-<millis>-<digits>.png`
fn is_generated_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("proof-").and_then(|r| r.strip_suffix(".png")) else {
        return false;
    };
    match rest.split_once('-') {
        Some((millis, suffix)) => {
            !millis.is_empty()
                && !suffix.is_empty()
                && millis.chars().all(|c| c.is_ascii_digit())
                && suffix.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

// =============================================================================
// Order API Tests
// =============================================================================

#[tokio::test]
async fn test_valid_order_is_accepted_and_file_stored() {
    let fx = Fixture::new();
    let form = form_without("")
        .add_text("customerEmail", "budi@example.com")
        .add_part("proof", proof_part(PNG_BYTES.to_vec(), "bukti.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: OrderResponse = response.json();
    assert_eq!(body, OrderResponse::accepted());

    let files = fx.stored_files();
    assert_eq!(files.len(), 1);
    assert!(is_generated_name(&files[0]), "unexpected name {}", files[0]);
    assert_eq!(
        std::fs::read(fx.upload_dir.join(&files[0])).unwrap(),
        PNG_BYTES
    );

    let orders = fx.recorder.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, "ORD-1700000000000");
    assert_eq!(orders[0].customer_email.as_deref(), Some("budi@example.com"));
    assert_eq!(orders[0].proof_filename, files[0]);
}

#[tokio::test]
async fn test_missing_field_rejects_and_removes_file() {
    let fx = Fixture::new();
    let form = form_without("customerPhone")
        .add_part("proof", proof_part(PNG_BYTES.to_vec(), "bukti.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("tidak lengkap"));

    assert!(fx.stored_files().is_empty());
    assert!(fx.recorder.is_empty());
}

#[tokio::test]
async fn test_missing_proof_is_rejected() {
    let fx = Fixture::new();

    let response = fx
        .server
        .post("/api/order")
        .multipart(form_without(""))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("wajib diupload"));
    assert!(fx.stored_files().is_empty());
}

#[tokio::test]
async fn test_missing_fields_and_proof_reports_incomplete() {
    let fx = Fixture::new();

    let response = fx
        .server
        .post("/api/order")
        .multipart(MultipartForm::new().add_text("plan", "Basic"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("tidak lengkap"));
}

#[tokio::test]
async fn test_blank_required_field_counts_as_missing() {
    let fx = Fixture::new();
    let form = form_without("plan")
        .add_text("plan", "   ")
        .add_part("proof", proof_part(PNG_BYTES.to_vec(), "bukti.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(fx.stored_files().is_empty());
}

#[tokio::test]
async fn test_oversized_file_is_rejected_and_not_retained() {
    let fx = Fixture::new();
    let too_big = vec![0u8; (DEFAULT_MAX_UPLOAD_BYTES + 1) as usize];
    let form = form_without("").add_part("proof", proof_part(too_big, "huge.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("10MB"));
    assert!(fx.stored_files().is_empty());
    assert!(fx.recorder.is_empty());
}

#[tokio::test]
async fn test_file_at_limit_is_accepted() {
    let fx = Fixture::with_limit(64);
    let form = form_without("").add_part("proof", proof_part(vec![7u8; 64], "exact.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(fx.stored_files().len(), 1);
}

#[tokio::test]
async fn test_second_proof_file_is_rejected() {
    let fx = Fixture::new();
    let form = form_without("")
        .add_part("proof", proof_part(PNG_BYTES.to_vec(), "one.png"))
        .add_part("proof", proof_part(PNG_BYTES.to_vec(), "two.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: OrderResponse = response.json();
    assert!(!body.success);
    assert!(fx.stored_files().is_empty());
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let fx = Fixture::new();
    let form = form_without("")
        .add_text("voucher", "GRATIS")
        .add_part("attachment", proof_part(b"ignored".to_vec(), "other.png"))
        .add_part("proof", proof_part(PNG_BYTES.to_vec(), "bukti.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(fx.stored_files().len(), 1);
}

#[tokio::test]
async fn test_duplicate_order_ids_are_both_accepted() {
    let fx = Fixture::new();

    for _ in 0..2 {
        let form =
            form_without("").add_part("proof", proof_part(PNG_BYTES.to_vec(), "bukti.png"));
        let response = fx.server.post("/api/order").multipart(form).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    assert_eq!(fx.recorder.len(), 2);
    assert_eq!(fx.stored_files().len(), 2);
}

#[tokio::test]
async fn test_incomplete_json_body_reports_incomplete() {
    let fx = Fixture::new();

    let response = fx
        .server
        .post("/api/order")
        .json(&json!({ "plan": "Basic" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("tidak lengkap"));
}

#[tokio::test]
async fn test_complete_json_body_reports_missing_proof() {
    let fx = Fixture::new();
    let mut fields = serde_json::Map::new();
    for (name, value) in order_fields() {
        fields.insert(name.to_string(), json!(value));
    }
    // Numbers are read as their JSON text
    fields.insert("price".into(), json!(50000));

    let response = fx
        .server
        .post("/api/order")
        .json(&Value::Object(fields))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: OrderResponse = response.json();
    assert_eq!(
        body,
        OrderResponse::failure("Bukti transfer wajib diupload.")
    );
    assert!(fx.stored_files().is_empty());
    assert!(fx.recorder.is_empty());
}

#[tokio::test]
async fn test_malformed_json_body_is_rejected() {
    let fx = Fixture::new();

    let response = fx
        .server
        .post("/api/order")
        .bytes("{\"plan\": ".into())
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: OrderResponse = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_recorder_failure_returns_500_and_removes_file() {
    let fx = Fixture::with_recorder(Arc::new(FailingRecorder));
    let form = form_without("").add_part("proof", proof_part(PNG_BYTES.to_vec(), "bukti.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: OrderResponse = response.json();
    assert_eq!(body, OrderResponse::failure(INTERNAL_ERROR_MESSAGE));
    assert!(fx.stored_files().is_empty());
}

#[tokio::test]
async fn test_truncated_multipart_body_returns_500() {
    let fx = Fixture::new();
    // No closing boundary
    let body = "--XYZ\r\n\
                Content-Disposition: form-data; name=\"plan\"\r\n\
                \r\n\
                Basic\r\n\
                --XYZ\r\n\
                Content-Disposition: form-data; name=\"proof\"; filename=\"bukti.png\"\r\n\
                Content-Type: image/png\r\n\
                \r\n\
                \x00\x01\x02";

    let response = fx
        .server
        .post("/api/order")
        .bytes(body.into())
        .content_type("multipart/form-data; boundary=XYZ")
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: OrderResponse = response.json();
    assert_eq!(body, OrderResponse::failure(INTERNAL_ERROR_MESSAGE));
    assert!(fx.stored_files().is_empty());
    assert!(fx.recorder.is_empty());
}

#[tokio::test]
async fn test_body_over_transport_limit_reports_file_too_large() {
    let fx = Fixture::with_limit(64);
    // Text alone pushes the body past the limit plus the form overhead
    let note = "x".repeat(1024 * 1024 + 128);
    let form = form_without("")
        .add_text("customerNote", note)
        .add_part("proof", proof_part(vec![7u8; 32], "small.png"));

    let response = fx.server.post("/api/order").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: OrderResponse = response.json();
    assert_eq!(
        body,
        OrderResponse::failure("Ukuran file terlalu besar. Maksimal 1KB.")
    );
    assert!(fx.stored_files().is_empty());
    assert!(fx.recorder.is_empty());
}

// =============================================================================
// QRIS API Tests
// =============================================================================

#[tokio::test]
async fn test_qris_without_nominal_returns_400() {
    let fx = Fixture::new();
    std::fs::write(&fx.placeholder, PNG_BYTES).unwrap();

    let response = fx
        .server
        .get("/api/qrisdinamis")
        .add_query_param("string", "00020101021126")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Missing string or nominal parameter");
}

#[tokio::test]
async fn test_qris_with_empty_string_returns_400() {
    let fx = Fixture::new();

    let response = fx
        .server
        .get("/api/qrisdinamis")
        .add_query_param("string", "")
        .add_query_param("nominal", "51500")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_qris_returns_placeholder_bytes() {
    let fx = Fixture::new();
    std::fs::write(&fx.placeholder, PNG_BYTES).unwrap();

    let response = fx
        .server
        .get("/api/qrisdinamis")
        .add_query_param("string", "00020101021126")
        .add_query_param("nominal", "51500")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.as_bytes().to_vec(), PNG_BYTES.to_vec());
    assert_eq!(response.header("content-type"), "image/png");
}

#[tokio::test]
async fn test_qris_without_placeholder_returns_404() {
    let fx = Fixture::new();

    let response = fx
        .server
        .get("/api/qrisdinamis")
        .add_query_param("string", "00020101021126")
        .add_query_param("nominal", "abc")
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("QRIS placeholder image not found"));
}

// =============================================================================
// Upload Serving Tests
// =============================================================================

#[tokio::test]
async fn test_stored_upload_is_served() {
    let fx = Fixture::new();
    let form = form_without("").add_part("proof", proof_part(PNG_BYTES.to_vec(), "bukti.png"));
    fx.server.post("/api/order").multipart(form).await;

    let filename = fx.recorder.orders()[0].proof_filename.clone();
    let response = fx.server.get(&format!("/uploads/{}", filename)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.as_bytes().to_vec(), PNG_BYTES.to_vec());
}

#[tokio::test]
async fn test_unknown_upload_returns_404() {
    let fx = Fixture::new();

    let response = fx.server.get("/uploads/proof-0-0.png").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let fx = Fixture::new();

    let response = fx.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
}
