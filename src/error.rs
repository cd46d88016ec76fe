use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Client-visible message for the missing-file case
pub const MSG_NO_FILE: &str = "No file uploaded.";
/// Client-visible message for every other pipeline failure
pub const MSG_PREDICTION_FAILED: &str = "An error occurred during prediction.";

/// Errors from the upload-validate-persist pipeline.
///
/// Each variant maps deterministically to a status code and fixed client
/// message; the underlying cause is logged server-side only.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("no file uploaded")]
    InputMissing,

    #[error("upload validation failed: {0}")]
    ValidationFailed(String),

    #[error("object store unavailable: {0}")]
    StoreUnavailable(anyhow::Error),

    #[error("record store unavailable: {0}")]
    RecordUnavailable(anyhow::Error),
}

/// JSON error body returned to the client
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl PredictError {
    /// Status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictError::InputMissing => StatusCode::BAD_REQUEST,
            PredictError::ValidationFailed(_)
            | PredictError::StoreUnavailable(_)
            | PredictError::RecordUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed client-visible message for this error
    pub fn client_message(&self) -> &'static str {
        match self {
            PredictError::InputMissing => MSG_NO_FILE,
            _ => MSG_PREDICTION_FAILED,
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        match &self {
            PredictError::InputMissing => {
                warn!("Request rejected: no file uploaded");
            }
            PredictError::ValidationFailed(reason) => {
                warn!(reason = %reason, "Upload validation failed");
                metrics::counter!("predict.uploads.rejected").increment(1);
            }
            PredictError::StoreUnavailable(cause) => {
                error!(error = %cause, "Object store operation failed");
            }
            PredictError::RecordUnavailable(cause) => {
                error!(error = %cause, "Record store operation failed");
            }
        }

        let body = ErrorBody {
            message: self.client_message().to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_missing_is_bad_request() {
        let err = PredictError::InputMissing;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "No file uploaded.");
    }

    #[test]
    fn test_other_errors_collapse_to_500() {
        let cases = [
            PredictError::ValidationFailed("bad extension".to_string()),
            PredictError::StoreUnavailable(anyhow::anyhow!("s3 down")),
            PredictError::RecordUnavailable(anyhow::anyhow!("db down")),
        ];

        for err in cases {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.client_message(), "An error occurred during prediction.");
        }
    }

    #[test]
    fn test_client_message_hides_cause() {
        let err = PredictError::StoreUnavailable(anyhow::anyhow!("bucket does not exist"));
        assert!(!err.client_message().contains("bucket"));
    }
}
