//! Food waste entry endpoints
//!
//! Each handler runs exactly one store call. A zero row count on delete or
//! update is a 404, not an error; store failures are 500s.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{BodyError, EntryJson};
use crate::http::server::AppState;
use crate::models::{EntryBody, FoodWasteEntry};

/// Success body for writes
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// GET /foodwaste - list all entries
async fn list_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FoodWasteEntry>>, ApiError> {
    let entries = state
        .store
        .list()
        .await
        .map_err(|e| ApiError::store("Server error for food_waste", e))?;

    Ok(Json(entries))
}

/// POST /addfoodwaste - insert an entry
async fn add_entry(
    State(state): State<Arc<AppState>>,
    body: Result<EntryJson, BodyError>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let failed = |category: &str| {
        format!("Server error - could not add food waste entry for {}", category)
    };

    // A body that never parsed has no category to name
    let EntryJson(entry) =
        body.map_err(|e| ApiError::body(failed(&EntryBody::default().category_label()), e))?;
    let category = entry.category_label();

    let id = state
        .store
        .create(&entry)
        .await
        .map_err(|e| ApiError::store(failed(&category), e))?;

    tracing::debug!(id, %category, "food waste entry added");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Food waste entry for {} added successfully",
            category
        ))),
    ))
}

/// DELETE /deletefoodwaste/{id} - delete an entry
async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state.store.delete(&id).await.map_err(|e| {
        ApiError::store(
            format!("Server error - could not delete food waste entry with id {}", id),
            e,
        )
    })?;

    if removed == 0 {
        return Err(ApiError::not_found(id));
    }

    Ok(Json(MessageResponse::new(format!(
        "Food waste entry with id {} deleted successfully",
        id
    ))))
}

/// PUT /updatefoodwaste/{id} - replace an entry's fields
async fn update_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<EntryJson, BodyError>,
) -> Result<Json<MessageResponse>, ApiError> {
    let failed = format!("Server error - could not update food waste entry with id {}", id);

    let EntryJson(entry) = body.map_err(|e| ApiError::body(failed.clone(), e))?;

    let matched = state
        .store
        .update(&id, &entry)
        .await
        .map_err(|e| ApiError::store(failed, e))?;

    if matched == 0 {
        return Err(ApiError::not_found(id));
    }

    Ok(Json(MessageResponse::new(format!(
        "Food waste entry for {} updated successfully",
        entry.category_label()
    ))))
}

/// Entry routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/foodwaste", get(list_entries))
        .route("/addfoodwaste", post(add_entry))
        .route("/deletefoodwaste/{id}", delete(delete_entry))
        .route("/updatefoodwaste/{id}", put(update_entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use serde_json::json;

    fn state_with(store: Arc<MemoryStore>) -> State<Arc<AppState>> {
        State(Arc::new(AppState::new(store)))
    }

    fn dairy() -> EntryBody {
        EntryBody::new(json!("dairy"), json!(2.5), json!("expired"))
    }

    #[tokio::test]
    async fn add_returns_created_with_category() {
        let store = Arc::new(MemoryStore::new());

        let (status, Json(body)) = add_entry(state_with(store.clone()), Ok(EntryJson(dairy())))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.message, "Food waste entry for dairy added successfully");
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn add_with_missing_field_fails_naming_category() {
        let store = Arc::new(MemoryStore::new());
        let partial = EntryBody {
            weight: None,
            ..dairy()
        };

        let err = add_entry(state_with(store.clone()), Ok(EntryJson(partial)))
            .await
            .unwrap_err();

        match err {
            ApiError::StoreUnavailable { message, .. } => assert_eq!(
                message,
                "Server error - could not add food waste entry for dairy"
            ),
            other => panic!("expected store error, got {:?}", other),
        }
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn add_numeric_category_is_named_as_text() {
        let store = Arc::new(MemoryStore::new());
        let entry = EntryBody::new(json!(5), json!(1), json!("expired"));

        let (_, Json(body)) = add_entry(state_with(store), Ok(EntryJson(entry)))
            .await
            .unwrap();

        assert_eq!(body.message, "Food waste entry for 5 added successfully");
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = Arc::new(MemoryStore::new());

        let err = delete_entry(state_with(store), Path("9999".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound { ref id } if id == "9999"));
    }

    #[tokio::test]
    async fn update_on_store_failure_names_id() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);

        let err = update_entry(state_with(store), Path("3".to_string()), Ok(EntryJson(dairy())))
            .await
            .unwrap_err();

        match err {
            ApiError::StoreUnavailable { message, .. } => assert_eq!(
                message,
                "Server error - could not update food waste entry with id 3"
            ),
            other => panic!("expected store error, got {:?}", other),
        }
    }
}
