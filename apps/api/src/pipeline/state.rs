//! The record threaded through the generate → review → analyze loop.
//!
//! Created once per run, owned exclusively by the orchestrator for the run's
//! duration, then handed back to the caller. Never shared across runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::ground_truth::GroundTruth;
use crate::models::resume::{AnalysisResult, FinalResume, GeneratedContent, ReviewFeedback};
use crate::pipeline::stage::StageName;

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Start,
    Generated,
    Reviewed,
    Analyzed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("ground_truth must be a JSON object")]
    GroundTruthNotObject,

    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    #[error("user_id cannot be empty")]
    MissingUserId,
}

/// Inputs for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub user_id: String,
    pub ground_truth: Value,
    #[serde(default)]
    pub job_description: Option<String>,
    /// Falls back to the orchestrator's configured ceiling.
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl PipelineRequest {
    pub fn validate(&self, default_max_iterations: u32) -> Result<(), StateError> {
        if self.user_id.trim().is_empty() {
            return Err(StateError::MissingUserId);
        }
        if !self.ground_truth.is_object() {
            return Err(StateError::GroundTruthNotObject);
        }
        if self.max_iterations.unwrap_or(default_max_iterations) == 0 {
            return Err(StateError::ZeroIterations);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub user_id: String,
    pub ground_truth: GroundTruth,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub generated_content: Option<GeneratedContent>,
    #[serde(default)]
    pub review_feedback: Option<ReviewFeedback>,
    #[serde(default)]
    pub analysis_result: Option<AnalysisResult>,
    #[serde(default)]
    pub current_step: Step,
    /// Generator invocations so far.
    #[serde(default)]
    pub iteration: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub should_regenerate: bool,
    /// Append-only, entries tagged `"<stage>: <message>"`.
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub final_resume: Option<FinalResume>,
    #[serde(default)]
    pub overall_score: Option<f64>,
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl PipelineState {
    /// Validated initial state for a run.
    pub fn new(request: PipelineRequest, default_max_iterations: u32) -> Result<Self, StateError> {
        request.validate(default_max_iterations)?;
        Ok(Self::initial(request, default_max_iterations))
    }

    /// Initial state without validation, carrying the construction error.
    pub fn rejected(request: PipelineRequest, default_max_iterations: u32, error: &StateError) -> Self {
        let mut state = Self::initial(request, default_max_iterations);
        state.errors.push(error.to_string());
        state
    }

    fn initial(request: PipelineRequest, default_max_iterations: u32) -> Self {
        Self {
            user_id: request.user_id,
            ground_truth: GroundTruth::new(request.ground_truth),
            job_description: request.job_description,
            generated_content: None,
            review_feedback: None,
            analysis_result: None,
            current_step: Step::Start,
            iteration: 0,
            max_iterations: request.max_iterations.unwrap_or(default_max_iterations),
            should_regenerate: false,
            errors: Vec::new(),
            final_resume: None,
            overall_score: None,
        }
    }

    /// The job description, if one was supplied and is not blank.
    pub fn job_description(&self) -> Option<&str> {
        self.job_description
            .as_deref()
            .filter(|jd| !jd.trim().is_empty())
    }

    pub fn record_error(&mut self, stage: StageName, message: impl fmt::Display) {
        self.errors.push(format!("{stage}: {message}"));
    }

    pub fn assemble_final_resume(&self) -> FinalResume {
        FinalResume {
            content: self.generated_content.clone(),
            review: self.review_feedback.clone(),
            analysis: self.analysis_result.clone(),
            score: self.overall_score,
            iterations: self.iteration,
            errors: self.errors.clone(),
        }
    }
}
