//! `/data` handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::document::{Document, Envelope, FieldUpdate};
use crate::state::AppState;

pub const SAVE_FAILED: &str = "Failed to save data";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// `GET /data`: the whole document.
pub async fn get_document(State(state): State<AppState>) -> Json<Document> {
    Json(state.store.load().await)
}

/// `POST /data`: set one field, `{key, value}`.
pub async fn update_field(
    State(state): State<AppState>,
    body: Result<Json<FieldUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(&rejection),
    };
    match state.store.update_field(&update.key, update.value).await {
        Ok(document) => Json(Envelope::ok(document)).into_response(),
        Err(e) => {
            error!(error = %e, key = %update.key, "field update failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::failed(SAVE_FAILED))).into_response()
        }
    }
}

/// `PUT /data`: replace the whole document.
pub async fn replace_document(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Response {
    let Json(document) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(&rejection),
    };
    match state.store.replace(document).await {
        Ok(saved) => Json(Envelope::ok(saved)).into_response(),
        Err(e) => {
            error!(error = %e, "document replace failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::failed(SAVE_FAILED))).into_response()
        }
    }
}

/// Unparseable or mistyped body: logged, answered 500 with a JSON error.
fn bad_body(rejection: &JsonRejection) -> Response {
    warn!(status = %rejection.status(), error = %rejection.body_text(), "rejected request body");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": INTERNAL_ERROR }))).into_response()
}

pub async fn method_not_allowed() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": "Method not allowed" })))
}

#[cfg(test)]
#[path = "data_test.rs"]
mod tests;
