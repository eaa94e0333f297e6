pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::scoring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // CV pool
        .route(
            "/api/v1/cvs",
            get(handlers::handle_list)
                .post(handlers::handle_upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/cvs/:filename",
            get(handlers::handle_download).delete(handlers::handle_delete),
        )
        // Scoring
        .route("/api/v1/score", post(handlers::handle_score))
        .route("/api/v1/rank", post(handlers::handle_rank))
        .with_state(state)
}
