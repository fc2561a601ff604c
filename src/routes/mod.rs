//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Serves the single remote document at `/data`, and again at `/api/data`
//! for clients configured with an `/api` base URL. Every response carries
//! permissive CORS headers so the static site can call it from any origin.

pub mod data;

use axum::Router;
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{MethodRouter, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";

fn data_routes() -> MethodRouter<AppState> {
    get(data::get_document)
        .post(data::update_field)
        .put(data::replace_document)
        .fallback(data::method_not_allowed)
}

/// The full HTTP surface.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/data", data_routes())
        .route("/api/data", data_routes())
        .route("/healthz", get(healthz))
        // Answers every OPTIONS request itself with 200 and an empty body.
        .layer(cors)
        // CorsLayer only lists methods and headers on preflights.
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
