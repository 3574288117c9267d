use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure classes for the scan pipeline. Every stage
/// classifies its own failure; nothing downstream reclassifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanErrorKind {
    Camera,
    Upload,
    Network,
    Analysis,
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// Device access denied, unsupported, or mid-stream failure.
    #[error("camera error: {0}")]
    Camera(String),

    /// Invalid input image (wrong type, too large) or unreadable data.
    #[error("{0}")]
    Upload(String),

    /// Transport-level failure reaching a remote endpoint, including timeouts.
    #[error("network error: {0}")]
    Network(String),

    /// A remote endpoint responded, but with a non-success status or an
    /// unparseable body.
    #[error("analysis failed: {0}")]
    Analysis(String),
}

impl ScanError {
    pub fn kind(&self) -> ScanErrorKind {
        match self {
            ScanError::Camera(_) => ScanErrorKind::Camera,
            ScanError::Upload(_) => ScanErrorKind::Upload,
            ScanError::Network(_) => ScanErrorKind::Network,
            ScanError::Analysis(_) => ScanErrorKind::Analysis,
        }
    }

    /// Kind-specific remediation hint shown alongside the message.
    pub fn hint(&self) -> &'static str {
        match self.kind() {
            ScanErrorKind::Camera => "check camera permissions and try again",
            ScanErrorKind::Upload => "use a JPEG or PNG photo under 5MB",
            ScanErrorKind::Network => "check your connection and retry",
            ScanErrorKind::Analysis => "retry with a clearer, well-lit photo",
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::Network(format!("request timed out: {err}"))
        } else {
            ScanError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScanErrorBody {
    pub message: String,
    pub kind: ScanErrorKind,
    pub hint: &'static str,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ScanErrorKind::Upload | ScanErrorKind::Camera => StatusCode::BAD_REQUEST,
            ScanErrorKind::Analysis => StatusCode::BAD_GATEWAY,
            ScanErrorKind::Network => StatusCode::GATEWAY_TIMEOUT,
        };
        let body = ScanErrorBody {
            message: self.to_string(),
            kind: self.kind(),
            hint: self.hint(),
        };
        (status, Json(body)).into_response()
    }
}
