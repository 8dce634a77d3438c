use std::sync::Arc;

use crate::pipeline::jobs::JobRegistry;
use crate::pipeline::Orchestrator;
use crate::scoring::ScoringEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Stateless; one instance serves every run.
    pub orchestrator: Arc<Orchestrator>,
    /// Same engine the Analyzer stage scores with.
    pub scoring: Arc<ScoringEngine>,
    pub jobs: JobRegistry,
}
