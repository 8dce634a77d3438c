//! Reviewer stage: critiques generated content and decides whether the
//! Generator should run again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::llm_client::prompts::JSON_ONLY_FOOTER;
use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::models::resume::ReviewFeedback;
use crate::pipeline::prompts::{GENERAL_REVIEW_INSTRUCTION, REVIEWER_PROMPT_TEMPLATE};
use crate::pipeline::stage::{parse_structured, pretty_json, Stage, StageName};
use crate::pipeline::state::{PipelineState, Step};

pub struct ReviewerStage {
    llm: Arc<dyn TextGenerator>,
}

impl ReviewerStage {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage for ReviewerStage {
    fn name(&self) -> StageName {
        StageName::Reviewer
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let job_block = match state.job_description() {
            Some(jd) => format!("TARGET JOB DESCRIPTION:\n{jd}"),
            None => GENERAL_REVIEW_INSTRUCTION.to_string(),
        };

        REVIEWER_PROMPT_TEMPLATE
            .replace("{resume_json}", &pretty_json(&state.generated_content))
            .replace("{job_block}", &job_block)
            .replace("{footer}", JSON_ONLY_FOOTER)
    }

    async fn process(&self, mut state: PipelineState) -> PipelineState {
        info!("Reviewer stage processing for user {}", state.user_id);

        if state.generated_content.is_none() {
            warn!("No generated content to review");
            state.current_step = Step::Reviewed;
            return state;
        }

        let prompt = self.build_prompt(&state);

        let feedback = match self.llm.invoke(&prompt).await {
            Ok(raw) => match parse_structured::<ReviewFeedback>(&raw) {
                Ok(feedback) => feedback,
                Err(e) => {
                    warn!("Reviewer output did not parse: {e}");
                    ReviewFeedback::unparsed(strip_json_fences(&raw).to_string())
                }
            },
            Err(e) => {
                error!("Reviewer call failed: {e}");
                state.record_error(StageName::Reviewer, &e);
                ReviewFeedback::failed(e.to_string())
            }
        };

        state.should_regenerate = feedback.should_regenerate;
        info!(
            "Reviewer stage completed: quality={:?} ats={} regenerate={}",
            feedback.overall_quality, feedback.ats_score, feedback.should_regenerate
        );
        state.review_feedback = Some(feedback);
        state.current_step = Step::Reviewed;
        state
    }
}
