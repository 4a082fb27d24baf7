use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use hoard_protocol::endpoints;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all hoard endpoints.
///
/// The blob routes are mounted both at the root and under `/api`.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.max_upload_bytes;
    Router::new()
        .merge(blob_routes())
        .nest(endpoints::API_PREFIX, blob_routes())
        .route(endpoints::STATS, get(handler::stats))
        .route(endpoints::HEALTH, get(handler::health))
        .fallback(handler::not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn blob_routes() -> Router<AppState> {
    Router::new()
        .route(&format!("{}/:id", endpoints::BLOB), get(handler::get_blob))
        .route(endpoints::UPLOAD, post(handler::upload))
        .route(endpoints::BLOBS, get(handler::list_blobs))
}
