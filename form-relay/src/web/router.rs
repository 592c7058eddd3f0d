//! Route table.
//!
//! ```text
//! OPTIONS *      → 200, answered by the CORS layer
//! GET     /      → "Hello World"
//! POST    /      → submission pipeline
//! GET     /health
//! *       /      → 405 {"error":"Method not allowed"}
//! *       other  → 404 fallback
//! ```

use axum::{
    middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use super::cors::cors_layer;
use super::handlers::{health, method_not_allowed, not_found, root, submit, AppState};

/// Build the application router.
///
/// Explicit routes always win over the fallback; the CORS layer wraps both.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root).post(submit).fallback(method_not_allowed))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(middleware::from_fn(cors_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
