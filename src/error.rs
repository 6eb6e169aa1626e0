use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Terminal request errors. None of these are retried; each maps to a fixed
/// status code and a JSON body in the same shape as successful responses.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("method not allowed, only POST is accepted")]
    MethodNotAllowed,
    #[error("missing or invalid API key")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("failed to send email: {0}")]
    SendFailed(String),
}

impl RelayError {
    fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::SendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "status": "error",
            "message": self.to_string(),
        });
        if matches!(self, RelayError::SendFailed(_)) {
            body["error_code"] = json!("EMAIL_SEND_FAILED");
        }

        (self.status(), Json(body)).into_response()
    }
}
