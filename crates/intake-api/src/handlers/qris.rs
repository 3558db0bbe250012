//! Dynamic QRIS endpoint (placeholder)
//!
//! No payment provider is integrated. The endpoint checks that the
//! caller supplied the QRIS string and nominal, then returns the same
//! static image for every request.

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::response::Response;
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::AssetError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QrisQuery {
    /// Static QRIS payload the dynamic code would be derived from
    #[serde(default)]
    pub string: Option<String>,
    /// Amount to encode
    #[serde(default)]
    pub nominal: Option<String>,
}

/// GET /api/qrisdinamis?string=..&nominal=..
/// Return the placeholder QRIS image
pub async fn placeholder_qris(
    State(state): State<AppState>,
    Query(query): Query<QrisQuery>,
    request: Request,
) -> Result<Response, AssetError> {
    let (Some(string), Some(nominal)) = (present(query.string), present(query.nominal)) else {
        return Err(AssetError::MissingParameters);
    };

    let path = state.placeholder_qris();
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tracing::warn!(path = %path.display(), "QRIS placeholder image is missing");
        return Err(AssetError::PlaceholderMissing);
    }

    tracing::debug!(%string, %nominal, "Serving placeholder QRIS");

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => Ok(response.map(Body::new)),
        Err(never) => match never {},
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
