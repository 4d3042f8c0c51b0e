//! Custom Axum extractors

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::error::STORE_DOWN_REASON;
use crate::models::EntryBody;

/// Create/update body, read leniently.
///
/// A request without a JSON content type, or with an empty body, yields an
/// entry with every field absent. Field values are not checked here; only a
/// JSON body that fails to parse is rejected.
#[derive(Debug)]
pub struct EntryJson(pub EntryBody);

/// Body that could not be turned into an [`EntryBody`]
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("failed to read body: {0}")]
    Read(#[from] BytesRejection),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request body rejected");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Server error - could not read request body",
                "reason": STORE_DOWN_REASON
            })),
        )
            .into_response()
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl<S> FromRequest<S> for EntryJson
where
    S: Send + Sync,
{
    type Rejection = BodyError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state).await?;

        if !json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(EntryBody::default()));
        }

        Ok(Self(serde_json::from_slice(&bytes)?))
    }
}
