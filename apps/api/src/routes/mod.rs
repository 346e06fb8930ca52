pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dialogue::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/sessions", post(handlers::handle_start_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_reset_session),
        )
        .route(
            "/api/v1/sessions/:id/answers",
            post(handlers::handle_submit_answer),
        )
        .route("/api/v1/sessions/:id/finish", post(handlers::handle_finish))
        // Stored records
        .route("/api/v1/candidates", get(handlers::handle_list_candidates))
        .route("/api/v1/summaries", get(handlers::handle_list_summaries))
        .with_state(state)
}
