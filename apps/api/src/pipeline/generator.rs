//! Generator stage: ground truth (+ job description, + reviewer suggestions
//! on regeneration) → structured resume content.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::llm_client::prompts::JSON_ONLY_FOOTER;
use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::models::ground_truth::GroundTruth;
use crate::models::resume::{GeneratedContent, ResumeContent};
use crate::pipeline::prompts::{
    GENERAL_PURPOSE_INSTRUCTION, GENERATOR_PROMPT_TEMPLATE, SINGLE_PAGE_INSTRUCTION,
    SINGLE_PAGE_YEARS,
};
use crate::pipeline::stage::{parse_structured, pretty_json, Stage, StageName};
use crate::pipeline::state::{PipelineState, Step};

pub struct GeneratorStage {
    llm: Arc<dyn TextGenerator>,
}

impl GeneratorStage {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Prompt as of `today`, which drives the experience-years page guidance.
    pub fn build_prompt_at(&self, state: &PipelineState, today: NaiveDate) -> String {
        let job_block = match state.job_description() {
            Some(jd) => format!("TARGET JOB DESCRIPTION:\n{jd}"),
            None => GENERAL_PURPOSE_INSTRUCTION.to_string(),
        };

        let page_instruction = if state.ground_truth.experience_years(today) < SINGLE_PAGE_YEARS {
            SINGLE_PAGE_INSTRUCTION
        } else {
            ""
        };

        GENERATOR_PROMPT_TEMPLATE
            .replace("{career_data}", &pretty_json(state.ground_truth.as_value()))
            .replace("{job_block}", &job_block)
            .replace("{feedback_block}", &feedback_block(state))
            .replace("{page_instruction}", page_instruction)
            .replace("{footer}", JSON_ONLY_FOOTER)
    }
}

/// Prior reviewer suggestions, only when a regeneration was requested.
fn feedback_block(state: &PipelineState) -> String {
    let Some(review) = state.review_feedback.as_ref().filter(|_| state.should_regenerate) else {
        return String::new();
    };

    let mut block = String::from("\n\nPrevious feedback to incorporate:");
    if let Some(reason) = review.regeneration_reason.as_deref() {
        block.push_str(&format!("\nReason for revision: {reason}"));
    }
    for suggestion in &review.suggestions {
        block.push_str(&format!("\n- {suggestion}"));
    }
    if !review.missing_keywords.is_empty() {
        block.push_str(&format!(
            "\n- Work in these missing keywords where truthful: {}",
            review.missing_keywords.join(", ")
        ));
    }
    block
}

/// Ground truth copied verbatim into the content tree.
pub fn fallback_content(ground_truth: &GroundTruth) -> GeneratedContent {
    GeneratedContent::Structured(ResumeContent {
        header: ground_truth.object_or_empty("personal_info"),
        summary: None,
        experience: ground_truth.list("experience"),
        education: ground_truth.list("education"),
        skills: ground_truth.object_or_empty("skills"),
        certifications: ground_truth.list("certifications"),
        projects: ground_truth.list("projects"),
        fallback: true,
        extra: Default::default(),
    })
}

#[async_trait]
impl Stage for GeneratorStage {
    fn name(&self) -> StageName {
        StageName::Generator
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        self.build_prompt_at(state, Utc::now().date_naive())
    }

    async fn process(&self, mut state: PipelineState) -> PipelineState {
        info!("Generator stage processing for user {}", state.user_id);

        let prompt = self.build_prompt(&state);

        let content = match self.llm.invoke(&prompt).await {
            Ok(raw) => match parse_structured::<ResumeContent>(&raw) {
                Ok(content) => GeneratedContent::Structured(content),
                Err(e) => {
                    warn!("Generator output did not parse as resume content: {e}");
                    GeneratedContent::unparsed(strip_json_fences(&raw).to_string())
                }
            },
            Err(e) => {
                error!("Generator call failed: {e}");
                state.record_error(StageName::Generator, &e);
                fallback_content(&state.ground_truth)
            }
        };

        state.generated_content = Some(content);
        state.current_step = Step::Generated;
        state.iteration += 1;

        info!("Generator stage completed, iteration {}", state.iteration);
        state
    }
}
