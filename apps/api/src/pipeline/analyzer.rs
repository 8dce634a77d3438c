//! Analyzer stage: fuses the deterministic relevance score with a
//! qualitative match assessment, then finalizes the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::llm_client::prompts::JSON_ONLY_FOOTER;
use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::models::resume::{AnalysisResult, MatchLevel};
use crate::pipeline::prompts::{
    ANALYZER_PROMPT_TEMPLATE, GENERAL_MARKETABILITY_INSTRUCTION, NOT_AVAILABLE,
};
use crate::pipeline::stage::{parse_structured, pretty_json, Stage, StageName};
use crate::pipeline::state::{PipelineState, Step};
use crate::scoring::{round2, ScoringEngine};

/// Score used when neither signal is available.
pub const NEUTRAL_MATCH_SCORE: f64 = 50.0;

/// Weights for fusing deterministic and model-assessed scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub deterministic: f64,
    pub qualitative: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            deterministic: 0.6,
            qualitative: 0.4,
        }
    }
}

impl FusionWeights {
    pub fn sums_to_one(&self) -> bool {
        (self.deterministic + self.qualitative - 1.0).abs() < 1e-9
    }

    pub fn fuse(&self, deterministic: f64, qualitative: f64) -> f64 {
        round2(self.deterministic * deterministic + self.qualitative * qualitative)
    }
}

pub struct AnalyzerStage {
    llm: Arc<dyn TextGenerator>,
    scoring: Arc<ScoringEngine>,
    fusion: FusionWeights,
}

impl AnalyzerStage {
    pub fn new(llm: Arc<dyn TextGenerator>, scoring: Arc<ScoringEngine>, fusion: FusionWeights) -> Self {
        if !fusion.sums_to_one() {
            warn!(
                "Analyzer fusion weights sum to {} (expected 1.0); overall scores may leave 0-100",
                fusion.deterministic + fusion.qualitative
            );
        }
        Self {
            llm,
            scoring,
            fusion,
        }
    }

    /// Engine score of the flattened content, when there is a job description
    /// and content to compare.
    async fn deterministic_score(&self, state: &PipelineState) -> Option<f64> {
        let jd = state.job_description()?;
        let content = state.generated_content.as_ref()?;
        if content.is_parse_error() {
            warn!("Scoring unparsed generator output as raw text");
        }
        let result = self.scoring.score(&content.to_plain_text(), jd).await;
        Some(result.overall_score)
    }
}

#[async_trait]
impl Stage for AnalyzerStage {
    fn name(&self) -> StageName {
        StageName::Analyzer
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let review = state.review_feedback.as_ref();
        let ats_score = review
            .map(|r| r.ats_score.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let quality = review
            .map(|r| format!("{:?}", r.overall_quality).to_lowercase())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        ANALYZER_PROMPT_TEMPLATE
            .replace("{resume_json}", &pretty_json(&state.generated_content))
            .replace(
                "{job_text}",
                state
                    .job_description()
                    .unwrap_or(GENERAL_MARKETABILITY_INSTRUCTION),
            )
            .replace("{ats_score}", &ats_score)
            .replace("{quality}", &quality)
            .replace("{footer}", JSON_ONLY_FOOTER)
    }

    async fn process(&self, mut state: PipelineState) -> PipelineState {
        info!("Analyzer stage processing for user {}", state.user_id);

        let nlp_score = self.deterministic_score(&state).await;
        let prompt = self.build_prompt(&state);

        let analysis = match self.llm.invoke(&prompt).await {
            Ok(raw) => match parse_structured::<AnalysisResult>(&raw) {
                Ok(mut analysis) => {
                    let llm_score = analysis.match_score.clamp(0.0, 100.0);
                    analysis.match_score = llm_score;
                    if let Some(nlp) = nlp_score {
                        analysis.nlp_score = Some(nlp);
                        analysis.llm_score = Some(llm_score);
                        analysis.match_score = self.fusion.fuse(nlp, llm_score);
                    }
                    analysis
                }
                Err(e) => {
                    warn!("Analyzer output did not parse: {e}");
                    AnalysisResult {
                        match_level: Some(MatchLevel::Moderate),
                        nlp_score,
                        raw_response: Some(strip_json_fences(&raw).to_string()),
                        parse_error: true,
                        error: Some("Analysis parsing failed".to_string()),
                        ..AnalysisResult::with_score(nlp_score.unwrap_or(NEUTRAL_MATCH_SCORE))
                    }
                }
            },
            Err(e) => {
                error!("Analyzer call failed: {e}");
                state.record_error(StageName::Analyzer, &e);
                AnalysisResult {
                    nlp_score,
                    error: Some(e.to_string()),
                    ..AnalysisResult::with_score(nlp_score.unwrap_or(NEUTRAL_MATCH_SCORE))
                }
            }
        };

        state.overall_score = Some(analysis.match_score);
        state.analysis_result = Some(analysis);
        state.current_step = Step::Analyzed;
        state.final_resume = Some(state.assemble_final_resume());

        info!(
            "Analyzer stage completed, score {:?} after {} iteration(s)",
            state.overall_score, state.iteration
        );
        state
    }
}
