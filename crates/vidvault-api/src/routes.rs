//! Route table.
//!
//! Every video operation except the shared fetch sits behind the
//! API-key gate; the shared fetch is gated only on a non-empty token.
//! Access logging wraps the whole table, including rejections.

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{health, videos};
use crate::middleware::{access_log, require_api_key, require_share_token};
use crate::state::AppState;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let key_routes = Router::new()
        .route("/videos/upload", post(videos::upload))
        .route("/videos/trim", post(videos::trim))
        .route("/videos/merge", post(videos::merge))
        .route("/videos/share", post(videos::share))
        .layer(from_fn_with_state(state.clone(), require_api_key));

    let shared_routes = Router::new()
        .route("/videos/shared/:token", get(videos::shared))
        .route("/videos/shared", get(videos::shared_token_required))
        .layer(from_fn(require_share_token));

    Router::new()
        .route("/health", get(health::health))
        .merge(key_routes)
        .merge(shared_routes)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size()))
        .layer(from_fn_with_state(state.clone(), access_log))
        .with_state(state)
}
