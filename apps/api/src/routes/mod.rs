pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers as pipeline;
use crate::scoring::handlers as scoring;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Pipeline runs
        .route("/api/v1/pipeline/runs", post(pipeline::handle_submit_run))
        .route("/api/v1/pipeline/runs/:run_id", get(pipeline::handle_get_run))
        .route("/api/v1/pipeline/step", post(pipeline::handle_run_step))
        // Standalone critique
        .route("/api/v1/critique", post(scoring::handle_critique))
        .with_state(state)
}
