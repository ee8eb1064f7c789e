//! Axum router construction for the gateway.
//!
//! Two surfaces: the `WebSocket` upgrade endpoint at `GET /ws`, and the
//! built client assets served from the configured static directory for
//! every other path. Neither is part of the sync core — the endpoint
//! hands the socket straight to the connection tasks in [`crate::ws`].

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// - `GET /ws` -- upgrade to the realtime channel
/// - `GET /*` -- static client assets (`index.html` fallback per dir)
///
/// CORS is permissive for development; restrict it in production.
pub fn build_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
