//! Order intake handler
//!
//! A request goes through three steps:
//! 1. extraction: text fields fill an [`OrderForm`], the `proof` file is
//!    streamed into the upload sink. A JSON body fills the form too but
//!    can never carry a proof file.
//! 2. validation: [`OrderForm::validate`], no I/O
//! 3. recording: the order is handed to the recorder and the proof file
//!    is kept
//!
//! The stored proof is a [`StoredUpload`] guard, so every early return
//! between steps 1 and 3 removes it from disk.

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use intake_core::{IntakeError, IntakeResult, OrderForm, StoredUpload, UploadSink};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the proof of payment
pub const PROOF_FIELD: &str = "proof";

/// Message returned for an accepted order
pub const ACCEPTED_MESSAGE: &str =
    "Order berhasil diterima dan bukti transfer tersimpan. Admin akan segera memproses.";

/// Body of every order endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub success: bool,
    pub message: String,
}

impl OrderResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: ACCEPTED_MESSAGE.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Everything pulled out of an order request
#[derive(Debug, Default)]
pub struct Submission {
    pub form: OrderForm,
    pub proof: Option<StoredUpload>,
}

/// How the order fields are encoded in the request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Multipart,
    Json,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let essence = content_type.split(';').next().unwrap_or_default().trim();

    if essence == "multipart/form-data" {
        BodyKind::Multipart
    } else if essence == "application/json" || essence.ends_with("+json") {
        BodyKind::Json
    } else {
        BodyKind::Other
    }
}

/// POST /api/order
/// Accept an order together with its proof of payment
pub async fn submit_order(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<OrderResponse>, ApiError> {
    let submission = match body_kind(request.headers()) {
        BodyKind::Multipart => {
            let multipart = Multipart::from_request(request, &state)
                .await
                .map_err(|rejection| IntakeError::Multipart(rejection.body_text()))?;
            extract_submission(state.sink(), multipart).await?
        }
        BodyKind::Json => {
            let Json(fields) = Json::<Map<String, Value>>::from_request(request, &state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Submission {
                form: form_from_json(fields),
                proof: None,
            }
        }
        BodyKind::Other => {
            // Unparsed body: nothing to store, validate the empty form.
            tracing::debug!("Order request is neither multipart nor JSON");
            Submission::default()
        }
    };

    let order = submission
        .form
        .validate(submission.proof.as_ref().map(StoredUpload::info))?;

    state.recorder().record(&order).await?;

    if let Some(proof) = submission.proof {
        proof.keep();
    }

    tracing::info!(
        order_id = %order.order_id,
        proof = %order.proof_filename,
        "Order accepted"
    );

    Ok(Json(OrderResponse::accepted()))
}

/// Read all multipart fields, streaming the proof file to disk.
///
/// Unknown text fields and file fields other than `proof` are skipped.
/// A file part with an empty filename is treated as no file.
pub async fn extract_submission(
    sink: &UploadSink,
    mut multipart: Multipart,
) -> IntakeResult<Submission> {
    let mut submission = Submission::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, sink))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name {
            Some(original) if name == PROOF_FIELD && !original.is_empty() => {
                if submission.proof.is_some() {
                    return Err(IntakeError::DuplicateProof);
                }

                let mut writer = sink.begin(&name, &original).await?;
                while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, sink))? {
                    writer.write_chunk(&chunk).await?;
                }
                let stored = writer.finish().await?;

                tracing::debug!(
                    original = %original,
                    stored = %stored.info().filename,
                    size = stored.info().size,
                    "Stored proof file"
                );
                submission.proof = Some(stored);
            }
            Some(original) => {
                tracing::debug!(field = %name, file = %original, "Skipping file field");
            }
            None => {
                let value = field.text().await.map_err(|e| multipart_error(e, sink))?;
                if !submission.form.set(&name, value) {
                    tracing::debug!(field = %name, "Skipping unknown order field");
                }
            }
        }
    }

    Ok(submission)
}

/// Fill a form from a JSON object. Scalars other than strings keep their
/// JSON text (`50000` becomes `"50000"`), `null` counts as absent.
fn form_from_json(fields: Map<String, Value>) -> OrderForm {
    let mut form = OrderForm::new();
    for (name, value) in fields {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            other => other.to_string(),
        };
        if !form.set(&name, text) {
            tracing::debug!(field = %name, "Skipping unknown order field");
        }
    }
    form
}

/// The transport's body limit surfaces as a multipart error; report it
/// the same way as the sink's own limit.
fn multipart_error(err: MultipartError, sink: &UploadSink) -> IntakeError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::FileTooLarge {
            limit: sink.max_bytes(),
        }
    } else {
        IntakeError::Multipart(err.body_text())
    }
}
