//! Error envelope shared by every endpoint.

use std::fmt::Display;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed client input.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("request timed out")]
    Timeout,

    /// A data operation failed on behalf of an otherwise well-formed request.
    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn unprocessable(err: impl Display) -> Self {
        Self::Unprocessable(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Bad Request",
            Self::NotFound(_) => "Resource Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::Timeout => "Request Timeout",
            Self::Unprocessable(_) => "Request cannot be processed",
            Self::Database(_) | Self::Internal(_) => "Server Error",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    message: &'static str,
    error: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(error = %self, "request rejected");
        }

        let body = ErrorEnvelope {
            success: false,
            message: self.message(),
            error: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

// Bodies that are not JSON at all are client errors, bodies with the wrong
// shape are treated like a failed write.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => Self::Unprocessable(err.body_text()),
            other => Self::BadRequest(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn envelope(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn every_variant_renders_the_documented_envelope() {
        let cases = [
            (ApiError::BadRequest("x".into()), 400, "Bad Request"),
            (ApiError::NotFound("x".into()), 404, "Resource Not Found"),
            (ApiError::MethodNotAllowed, 405, "Method Not Allowed"),
            (ApiError::Timeout, 408, "Request Timeout"),
            (
                ApiError::unprocessable("x"),
                422,
                "Request cannot be processed",
            ),
            (ApiError::Database(sqlx::Error::RowNotFound), 500, "Server Error"),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                500,
                "Server Error",
            ),
        ];
        for (err, code, message) in cases {
            let (status, body) = envelope(err).await;
            assert_eq!(status.as_u16(), code);
            assert_eq!(
                body,
                serde_json::json!({"success": false, "message": message, "error": code})
            );
        }
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let (_, body) = envelope(ApiError::Database(sqlx::Error::PoolTimedOut)).await;
        assert!(!body.to_string().contains("pool"));
    }
}
