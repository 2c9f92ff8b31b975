//! Route definitions

use axum::{extract::State, routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::SessionStats;
use crate::pricing;
use crate::AppState;

pub mod sessions;

/// Build the full application router around `state`
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/pricing", pricing::router())
        .nest("/api/sessions", sessions::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<SessionStats> {
    Json(state.sessions.stats())
}
