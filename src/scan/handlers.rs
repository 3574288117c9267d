use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::error::ScanError;
use crate::history;
use crate::state::AppState;

use super::dto::{RawCapture, ScanResult};
use super::encode::strip_data_url_prefix;
use super::orchestrator::{ScanSnapshot, SubmitError};

// 5MiB image ceiling plus multipart/base64 envelope overhead. Oversized
// images inside the envelope still reach the validator and fail as
// `upload`, not as an opaque 413.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scan", post(submit_scan).get(scan_status))
        .route("/scan/base64", post(submit_scan_base64))
        .route("/scan/reset", post(reset_scan))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        match self {
            SubmitError::AlreadyScanning => {
                (StatusCode::CONFLICT, self.to_string()).into_response()
            }
            SubmitError::Scan(err) => err.into_response(),
        }
    }
}

/// POST /scan (multipart, field `file`)
#[instrument(skip(state, mp))]
async fn submit_scan(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<ScanResult>, SubmitError> {
    let mut capture: Option<RawCapture> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ScanError::Upload(format!("failed to read upload: {e}")))?;
            capture = Some(RawCapture::new(data, content_type));
            break;
        }
    }
    let capture =
        capture.ok_or_else(|| ScanError::Upload("multipart field 'file' is required".into()))?;

    run_scan(&state, capture).await
}

#[derive(Debug, Deserialize)]
struct SubmitScanBase64 {
    image_b64: String,
    content_type: Option<String>,
}

/// POST /scan/base64 { image_b64, content_type? }
#[instrument(skip(state, body))]
async fn submit_scan_base64(
    State(state): State<AppState>,
    Json(body): Json<SubmitScanBase64>,
) -> Result<Json<ScanResult>, SubmitError> {
    let capture = decode_base64_capture(&body.image_b64, body.content_type.as_deref())?;
    run_scan(&state, capture).await
}

async fn run_scan(state: &AppState, capture: RawCapture) -> Result<Json<ScanResult>, SubmitError> {
    let result = state.scanner.submit(capture).await?;

    // History is best effort: a write failure never fails the scan.
    if let Err(e) = history::repo::insert_scan(&state.db, &result).await {
        warn!(error = %e, analysis_id = %result.analysis_id, "failed to record scan history");
    }

    Ok(Json(result))
}

/// GET /scan — current orchestrator snapshot.
#[instrument(skip(state))]
async fn scan_status(State(state): State<AppState>) -> Json<ScanSnapshot> {
    Json(state.scanner.snapshot())
}

/// POST /scan/reset — back to idle, dropping result/error and preview.
#[instrument(skip(state))]
async fn reset_scan(State(state): State<AppState>) -> StatusCode {
    state.scanner.reset();
    StatusCode::NO_CONTENT
}

fn decode_base64_capture(
    payload: &str,
    content_type: Option<&str>,
) -> Result<RawCapture, ScanError> {
    let bytes = STANDARD
        .decode(strip_data_url_prefix(payload))
        .map_err(|_| ScanError::Upload("invalid base64 image payload".into()))?;
    Ok(RawCapture::new(
        bytes,
        content_type.unwrap_or("image/jpeg"),
    ))
}
