use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

/// Client errors raised by application handlers. Every variant is recovered
/// locally as a 400 with an `{error}` body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid JSON body")]
    InvalidBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("rejected request: {}", self);
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Parse a JSON request body. An empty body reads as `{}`.
///
/// Syntax errors map to [`ApiError::InvalidBody`]; well-formed JSON of the wrong
/// shape maps to `ApiError::Validation(shape_error)`.
pub fn parse_json_body<T: DeserializeOwned>(body: &Bytes, shape_error: &str) -> Result<T, ApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        &b"{}"[..]
    } else {
        &body[..]
    };

    serde_json::from_slice(raw).map_err(|e| {
        if e.is_data() {
            ApiError::Validation(shape_error.to_owned())
        } else {
            ApiError::InvalidBody
        }
    })
}
