pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::forms::artifacts::MAX_RESUME_BYTES;
use crate::forms::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/form",
            post(handlers::handle_create).get(handlers::handle_list),
        )
        .route(
            "/form/:id",
            get(handlers::handle_get)
                .patch(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        // Body limit sits above the artifact bound; oversized resumes are
        // rejected by the artifact constraint check.
        .layer(DefaultBodyLimit::max(MAX_RESUME_BYTES + 64 * 1024))
        .with_state(state)
}
