//! In-process run registry: submit a run, get a handle, poll for the outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::models::resume::FinalResume;
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::state::{PipelineRequest, PipelineState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    /// The run's task panicked; pipeline failures never land here.
    Failed,
}

/// What a finished run hands back to the caller's persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub final_resume: Option<FinalResume>,
    pub overall_score: Option<f64>,
    pub iterations: u32,
    pub errors: Vec<String>,
}

impl From<PipelineState> for PipelineOutcome {
    fn from(state: PipelineState) -> Self {
        Self {
            final_resume: state.final_resume,
            overall_score: state.overall_score,
            iterations: state.iteration,
            errors: state.errors,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub run_id: Uuid,
    pub user_id: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PipelineOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How long finished records stay pollable. Queued and processing runs are
/// never evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub ttl: Duration,
    /// Finished records kept at most; the oldest go first.
    pub max_finished: usize,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_finished: 1000,
        }
    }
}

impl Retention {
    fn expired(&self, completed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // to_std fails only when completed_at is in the future
        now.signed_duration_since(completed_at)
            .to_std()
            .is_ok_and(|age| age >= self.ttl)
    }
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
    retention: Retention,
}

impl JobRegistry {
    pub fn with_retention(retention: Retention) -> Self {
        Self {
            jobs: Arc::default(),
            retention,
        }
    }

    /// Queues a run and starts it on its own task. Returns immediately.
    pub async fn submit(&self, orchestrator: Arc<Orchestrator>, request: PipelineRequest) -> Uuid {
        let run_id = Uuid::new_v4();
        let record = JobRecord {
            run_id,
            user_id: request.user_id.clone(),
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            completed_at: None,
            outcome: None,
            error: None,
        };
        {
            let mut jobs = self.jobs.write().await;
            let evicted = evict_finished(&mut jobs, &self.retention, Utc::now());
            if evicted > 0 {
                debug!("Evicted {evicted} finished run(s)");
            }
            jobs.insert(run_id, record);
        }
        info!("Queued pipeline run {run_id} for user {}", request.user_id);

        let registry = self.clone();
        tokio::spawn(async move {
            registry.update(run_id, |r| r.status = JobStatus::Processing).await;

            let run = tokio::spawn(async move { orchestrator.run(request).await });
            match run.await {
                Ok(state) => {
                    let outcome = PipelineOutcome::from(state);
                    info!(
                        "Pipeline run {run_id} completed: score={:?} errors={}",
                        outcome.overall_score,
                        outcome.errors.len()
                    );
                    registry
                        .update(run_id, |r| {
                            r.status = JobStatus::Completed;
                            r.completed_at = Some(Utc::now());
                            r.outcome = Some(outcome);
                        })
                        .await;
                }
                Err(e) => {
                    error!("Pipeline run {run_id} aborted: {e}");
                    registry
                        .update(run_id, |r| {
                            r.status = JobStatus::Failed;
                            r.completed_at = Some(Utc::now());
                            r.error = Some(e.to_string());
                        })
                        .await;
                }
            }
        });

        run_id
    }

    pub async fn get(&self, run_id: Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(&run_id).cloned()
    }

    async fn update(&self, run_id: Uuid, apply: impl FnOnce(&mut JobRecord)) {
        if let Some(record) = self.jobs.write().await.get_mut(&run_id) {
            apply(record);
        }
    }
}

/// Drops finished records past their TTL, then the oldest finished records
/// beyond `max_finished`. Returns how many were removed.
fn evict_finished(
    jobs: &mut HashMap<Uuid, JobRecord>,
    retention: &Retention,
    now: DateTime<Utc>,
) -> usize {
    let before = jobs.len();
    jobs.retain(|_, r| !r.completed_at.is_some_and(|at| retention.expired(at, now)));

    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .values()
        .filter_map(|r| r.completed_at.map(|at| (at, r.run_id)))
        .collect();
    if finished.len() > retention.max_finished {
        finished.sort_unstable();
        let excess = finished.len() - retention.max_finished;
        for (_, run_id) in finished.into_iter().take(excess) {
            jobs.remove(&run_id);
        }
    }

    before - jobs.len()
}
