//! Axum route handlers for pipeline runs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::jobs::{JobRecord, JobStatus};
use crate::pipeline::stage::StageName;
use crate::pipeline::state::{PipelineRequest, PipelineState};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitRunResponse {
    pub run_id: Uuid,
    pub status: JobStatus,
}

/// POST /api/v1/pipeline/runs
///
/// Queues a generate → review → analyze run and returns its handle.
pub async fn handle_submit_run(
    State(state): State<AppState>,
    Json(request): Json<PipelineRequest>,
) -> Result<(StatusCode, Json<SubmitRunResponse>), AppError> {
    request
        .validate(state.orchestrator.default_max_iterations())
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let run_id = state
        .jobs
        .submit(state.orchestrator.clone(), request)
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitRunResponse {
            run_id,
            status: JobStatus::Queued,
        }),
    ))
}

/// GET /api/v1/pipeline/runs/:run_id
pub async fn handle_get_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<JobRecord>, AppError> {
    state
        .jobs
        .get(run_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Pipeline run {run_id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub stage: String,
    pub state: PipelineState,
}

/// POST /api/v1/pipeline/step
///
/// Runs a single stage against a supplied state, for replay and diagnostics.
pub async fn handle_run_step(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> Result<Json<PipelineState>, AppError> {
    let stage: StageName = request.stage.parse().map_err(AppError::Validation)?;
    if !request.state.ground_truth.is_object() {
        return Err(AppError::Validation(
            "ground_truth must be a JSON object".to_string(),
        ));
    }

    info!("Single-step {stage} requested for user {}", request.state.user_id);
    let updated = state.orchestrator.run_step(request.state, stage).await;
    Ok(Json(updated))
}
