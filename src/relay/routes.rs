use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{health_check, track, RelayState};

pub fn create_relay_router(state: Arc<RelayState>) -> Router {
    // The pixel is embedded on third-party pages.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        .route("/healthz", get(health_check))
        .route("/utm.gif", get(track))
        .layer(cors)
        .with_state(state)
}
