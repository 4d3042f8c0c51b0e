//! API error types with IntoResponse
//!
//! Callers only ever see two failure shapes: 404 for a missing entry and
//! 500 for anything that went wrong reaching the store.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::extractors::BodyError;
use crate::db::DbError;

/// Reason attached to every 500 body; the cause is never exposed.
pub const STORE_DOWN_REASON: &str = "the store is down; store unavailable, manual restart required";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// No row matched the id (404)
    NotFound { id: String },

    /// Store failed (500, logged)
    StoreUnavailable { message: String, source: DbError },

    /// Body could not be read as an entry (500, logged)
    Body { message: String, source: BodyError },
}

impl ApiError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn store(message: impl Into<String>, source: DbError) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source,
        }
    }

    pub fn body(message: impl Into<String>, source: BodyError) -> Self {
        Self::Body {
            message: message.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::StoreUnavailable { .. } | Self::Body { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::NotFound { id } => {
                tracing::debug!(%id, "food waste entry not found");
                json!({ "message": format!("Food waste entry with id {} not found", id) })
            }
            Self::StoreUnavailable { message, source } => {
                // Log the actual error, return generic reason
                tracing::error!(error = %source, "{}", message);
                json!({ "message": message, "reason": STORE_DOWN_REASON })
            }
            Self::Body { message, source } => {
                tracing::warn!(error = %source, "{}", message);
                json!({ "message": message, "reason": STORE_DOWN_REASON })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = ApiError::not_found("9999").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Food waste entry with id 9999 not found");
        assert!(body.get("reason").is_none());
    }

    #[tokio::test]
    async fn store_error_is_500_without_cause() {
        let source = DbError::StoreUnavailable(sqlx::Error::PoolTimedOut);
        let response = ApiError::store("Server error for food_waste", source).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Server error for food_waste");
        assert_eq!(body["reason"], STORE_DOWN_REASON);
        assert!(!body.to_string().contains("timed out"));
    }
}
