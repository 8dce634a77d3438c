//! Pipeline orchestrator: sequences Generator → Reviewer → (Generator again
//! while the reviewer asks and the ceiling allows) → Analyzer.
//!
//! Stateless apart from the injected stages, so one instance serves every run.

use tracing::{error, info};

use crate::models::resume::GeneratedContent;
use crate::pipeline::stage::{Stage, StageName};
use crate::pipeline::state::{PipelineRequest, PipelineState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Generator,
    Reviewer,
    Analyzer,
    End,
}

/// Decision taken after the Reviewer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Regenerate,
    Analyze,
}

/// The only branch point of the loop.
pub fn after_review(state: &PipelineState) -> Transition {
    if state.should_regenerate && state.iteration < state.max_iterations {
        Transition::Regenerate
    } else {
        Transition::Analyze
    }
}

pub struct Orchestrator {
    generator: Box<dyn Stage>,
    reviewer: Box<dyn Stage>,
    analyzer: Box<dyn Stage>,
    default_max_iterations: u32,
}

impl Orchestrator {
    pub fn new(
        generator: Box<dyn Stage>,
        reviewer: Box<dyn Stage>,
        analyzer: Box<dyn Stage>,
        default_max_iterations: u32,
    ) -> Self {
        Self {
            generator,
            reviewer,
            analyzer,
            default_max_iterations,
        }
    }

    pub fn default_max_iterations(&self) -> u32 {
        self.default_max_iterations
    }

    /// Runs the full loop. Always returns a state: an invalid request comes
    /// back as the initial state with the construction error recorded.
    pub async fn run(&self, request: PipelineRequest) -> PipelineState {
        info!("Starting pipeline for user {}", request.user_id);

        let state = match PipelineState::new(request.clone(), self.default_max_iterations) {
            Ok(state) => state,
            Err(e) => {
                error!("Pipeline state construction failed: {e}");
                return PipelineState::rejected(request, self.default_max_iterations, &e);
            }
        };

        let state = self.drive(state).await;

        info!(
            "Pipeline completed for user {}: score={:?} iterations={} errors={} fallback={}",
            state.user_id,
            state.overall_score,
            state.iteration,
            state.errors.len(),
            state
                .generated_content
                .as_ref()
                .is_some_and(GeneratedContent::is_fallback)
        );
        state
    }

    async fn drive(&self, mut state: PipelineState) -> PipelineState {
        let mut node = Node::Generator;
        // Also bounded by our own count, in case a stage leaves `iteration` untouched.
        let mut generator_runs = 0u32;

        loop {
            node = match node {
                Node::Generator => {
                    state = self.generator.process(state).await;
                    generator_runs += 1;
                    Node::Reviewer
                }
                Node::Reviewer => {
                    state = self.reviewer.process(state).await;
                    match after_review(&state) {
                        Transition::Regenerate if generator_runs < state.max_iterations => {
                            info!(
                                "Reviewer requested regeneration (iteration {}/{})",
                                state.iteration, state.max_iterations
                            );
                            Node::Generator
                        }
                        _ => Node::Analyzer,
                    }
                }
                Node::Analyzer => {
                    state = self.analyzer.process(state).await;
                    Node::End
                }
                Node::End => return state,
            };
        }
    }

    /// Runs exactly one stage against a caller-supplied state.
    pub async fn run_step(&self, state: PipelineState, stage: StageName) -> PipelineState {
        let stage = match stage {
            StageName::Generator => &self.generator,
            StageName::Reviewer => &self.reviewer,
            StageName::Analyzer => &self.analyzer,
        };
        info!("Running single {} step for user {}", stage.name(), state.user_id);
        stage.process(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::pipeline::analyzer::{AnalyzerStage, FusionWeights, NEUTRAL_MATCH_SCORE};
    use crate::pipeline::generator::GeneratorStage;
    use crate::pipeline::reviewer::ReviewerStage;
    use crate::pipeline::state::Step;
    use crate::scoring::keywords::KeywordExtractor;
    use crate::scoring::{ScoringEngine, ScoringWeights};
    use crate::test_support::{
        analysis_json, generated_resume_json, review_json, sample_ground_truth, FailingGenerator,
        LetterEmbedder, ScriptedGenerator,
    };

    fn engine() -> Arc<ScoringEngine> {
        Arc::new(ScoringEngine::new(
            KeywordExtractor::new(None),
            Some(Arc::new(LetterEmbedder)),
            ScoringWeights::default(),
        ))
    }

    fn orchestrator(
        generator: Arc<ScriptedGenerator>,
        reviewer: Arc<ScriptedGenerator>,
        analyzer: Arc<ScriptedGenerator>,
    ) -> Orchestrator {
        Orchestrator::new(
            Box::new(GeneratorStage::new(generator)),
            Box::new(ReviewerStage::new(reviewer)),
            Box::new(AnalyzerStage::new(analyzer, engine(), FusionWeights::default())),
            3,
        )
    }

    fn failing_script() -> Arc<ScriptedGenerator> {
        Arc::new(ScriptedGenerator::new(vec![Err("connection refused".into())]))
    }

    fn request(ground_truth: Value, jd: Option<&str>, max_iterations: Option<u32>) -> PipelineRequest {
        PipelineRequest {
            user_id: "user-42".into(),
            ground_truth,
            job_description: jd.map(str::to_string),
            max_iterations,
        }
    }

    fn reviewing_state(should_regenerate: bool, iteration: u32, max_iterations: u32) -> PipelineState {
        let mut state =
            PipelineState::new(request(json!({}), None, Some(max_iterations)), 3).unwrap();
        state.should_regenerate = should_regenerate;
        state.iteration = iteration;
        state.current_step = Step::Reviewed;
        state
    }

    #[test]
    fn test_transition_rule_boundaries() {
        assert_eq!(after_review(&reviewing_state(true, 1, 3)), Transition::Regenerate);
        assert_eq!(after_review(&reviewing_state(true, 2, 3)), Transition::Regenerate);
        assert_eq!(after_review(&reviewing_state(true, 3, 3)), Transition::Analyze);
        assert_eq!(after_review(&reviewing_state(false, 1, 3)), Transition::Analyze);
        assert_eq!(after_review(&reviewing_state(true, 1, 1)), Transition::Analyze);
    }

    #[tokio::test]
    async fn test_happy_path_runs_each_stage_once() {
        let generator = Arc::new(ScriptedGenerator::repeating(&generated_resume_json()));
        let reviewer = Arc::new(ScriptedGenerator::repeating(&review_json(false)));
        let analyzer = Arc::new(ScriptedGenerator::repeating(&analysis_json(80.0)));
        let orch = orchestrator(generator.clone(), reviewer.clone(), analyzer.clone());

        let state = orch
            .run(request(sample_ground_truth(), Some("Rust and Python engineer on AWS"), None))
            .await;

        assert_eq!((generator.calls(), reviewer.calls(), analyzer.calls()), (1, 1, 1));
        assert_eq!(state.current_step, Step::Analyzed);
        assert_eq!(state.iteration, 1);
        assert!(state.errors.is_empty());

        let analysis = state.analysis_result.as_ref().unwrap();
        let nlp = analysis.nlp_score.unwrap();
        assert_eq!(analysis.llm_score, Some(80.0));
        assert_eq!(state.overall_score, Some(crate::scoring::round2(0.6 * nlp + 0.4 * 80.0)));

        let final_resume = state.final_resume.unwrap();
        assert_eq!(final_resume.score, state.overall_score);
        assert_eq!(final_resume.iterations, 1);
    }

    #[tokio::test]
    async fn test_fallback_content_still_reviewed() {
        let ground_truth = json!({
            "personal_info": {"name": "Sam Rivera", "email": "sam@example.com"},
            "experience": [],
            "education": [{"degree": "BA History"}],
            "skills": {"tools": ["Excel"]}
        });
        let reviewer = Arc::new(ScriptedGenerator::repeating(&review_json(false)));
        let orch = orchestrator(
            failing_script(),
            reviewer.clone(),
            Arc::new(ScriptedGenerator::repeating(&analysis_json(60.0))),
        );

        let state = orch.run(request(ground_truth.clone(), None, None)).await;

        let content = state.generated_content.as_ref().unwrap();
        assert!(content.is_fallback());
        let content = serde_json::to_value(content).unwrap();
        assert_eq!(content["header"], ground_truth["personal_info"]);
        assert_eq!(content["education"], ground_truth["education"]);
        assert_eq!(content["skills"], ground_truth["skills"]);
        assert_eq!(content["fallback"], json!(true));

        assert_eq!(reviewer.calls(), 1);
        assert!(!state.review_feedback.as_ref().unwrap().parse_error);
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].starts_with("generator: "));
        assert_eq!(state.overall_score, Some(60.0));
    }

    #[tokio::test]
    async fn test_total_outage_with_job_description_uses_deterministic_score() {
        let jd = "Rust engineer with AWS and Docker";
        let orch = orchestrator(failing_script(), failing_script(), failing_script());

        let state = orch.run(request(sample_ground_truth(), Some(jd), None)).await;

        assert_eq!(state.errors.len(), 3);
        assert!(state.errors[0].starts_with("generator: "));
        assert!(state.errors[1].starts_with("reviewer: "));
        assert!(state.errors[2].starts_with("analyzer: "));
        let content = state.generated_content.as_ref().unwrap();
        assert!(content.is_fallback());

        let expected = engine().score(&content.to_plain_text(), jd).await.overall_score;
        assert_eq!(state.overall_score, Some(expected));
        assert_eq!(state.iteration, 1);
        assert!(state.final_resume.is_some());
    }

    #[tokio::test]
    async fn test_total_outage_without_job_description_is_neutral() {
        let orch = orchestrator(failing_script(), failing_script(), failing_script());
        let state = orch.run(request(sample_ground_truth(), None, None)).await;

        assert_eq!(state.errors.len(), 3);
        assert_eq!(state.overall_score, Some(NEUTRAL_MATCH_SCORE));
        let final_resume = state.final_resume.unwrap();
        assert_eq!(final_resume.errors, state.errors);
        assert_eq!(final_resume.score, Some(NEUTRAL_MATCH_SCORE));
    }

    #[tokio::test]
    async fn test_regeneration_stops_at_ceiling() {
        let generator = Arc::new(ScriptedGenerator::repeating(&generated_resume_json()));
        let reviewer = Arc::new(ScriptedGenerator::new(vec![
            Ok(review_json(true)),
            Ok(review_json(true)),
            Ok(review_json(true)),
        ]));
        let analyzer = Arc::new(ScriptedGenerator::repeating(&analysis_json(70.0)));
        let orch = orchestrator(generator.clone(), reviewer.clone(), analyzer.clone());

        let state = orch.run(request(sample_ground_truth(), None, Some(3))).await;

        assert_eq!(generator.calls(), 3);
        assert_eq!(reviewer.calls(), 3);
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(state.iteration, 3);
        assert!(state.should_regenerate);
        assert_eq!(state.current_step, Step::Analyzed);
        assert_eq!(state.final_resume.unwrap().iterations, 3);
    }

    #[tokio::test]
    async fn test_regeneration_prompt_carries_reviewer_suggestions() {
        let generator = Arc::new(ScriptedGenerator::repeating(&generated_resume_json()));
        let reviewer = Arc::new(ScriptedGenerator::new(vec![
            Ok(review_json(true)),
            Ok(review_json(false)),
        ]));
        let orch = orchestrator(
            generator.clone(),
            reviewer,
            Arc::new(ScriptedGenerator::repeating(&analysis_json(70.0))),
        );

        let state = orch.run(request(sample_ground_truth(), None, None)).await;

        assert_eq!(state.iteration, 2);
        let prompts = generator.prompts();
        assert!(!prompts[0].contains("Previous feedback"));
        assert!(prompts[1].contains("- Quantify more achievements"));
    }

    #[tokio::test]
    async fn test_iteration_never_exceeds_ceiling() {
        for max in 1..=4 {
            let generator = Arc::new(ScriptedGenerator::repeating(&generated_resume_json()));
            let orch = orchestrator(
                generator.clone(),
                Arc::new(ScriptedGenerator::repeating(&review_json(true))),
                Arc::new(ScriptedGenerator::repeating(&analysis_json(50.0))),
            );
            let state = orch.run(request(json!({}), None, Some(max))).await;
            assert_eq!(state.iteration, max);
            assert_eq!(generator.calls(), max as usize);
            assert!(state.final_resume.is_some());
        }
    }

    #[tokio::test]
    async fn test_loop_bounded_when_stage_skips_counter() {
        struct NoCountGenerator;

        #[async_trait]
        impl Stage for NoCountGenerator {
            fn name(&self) -> StageName {
                StageName::Generator
            }
            fn build_prompt(&self, _state: &PipelineState) -> String {
                String::new()
            }
            async fn process(&self, mut state: PipelineState) -> PipelineState {
                state.generated_content = Some(GeneratedContent::unparsed("draft".into()));
                state.current_step = Step::Generated;
                state
            }
        }

        let orch = Orchestrator::new(
            Box::new(NoCountGenerator),
            Box::new(ReviewerStage::new(Arc::new(ScriptedGenerator::repeating(
                &review_json(true),
            )))),
            Box::new(AnalyzerStage::new(
                Arc::new(FailingGenerator),
                engine(),
                FusionWeights::default(),
            )),
            2,
        );

        let state = orch.run(request(json!({}), None, None)).await;
        assert_eq!(state.current_step, Step::Analyzed);
        assert_eq!(state.iteration, 0);
        assert!(state.should_regenerate);
    }

    #[tokio::test]
    async fn test_invalid_request_returns_annotated_initial_state() {
        let generator = Arc::new(ScriptedGenerator::repeating(&generated_resume_json()));
        let orch = orchestrator(generator.clone(), failing_script(), failing_script());

        let state = orch.run(request(json!([1, 2, 3]), None, None)).await;

        assert_eq!(generator.calls(), 0);
        assert_eq!(state.current_step, Step::Start);
        assert_eq!(state.errors, vec!["ground_truth must be a JSON object".to_string()]);
        assert!(state.final_resume.is_none());
    }

    #[tokio::test]
    async fn test_run_step_executes_single_stage() {
        let reviewer = Arc::new(ScriptedGenerator::repeating(&review_json(true)));
        let orch = orchestrator(failing_script(), reviewer.clone(), failing_script());

        let mut state = PipelineState::new(request(sample_ground_truth(), None, None), 3).unwrap();
        state.generated_content = Some(crate::pipeline::generator::fallback_content(
            &state.ground_truth,
        ));

        let state = orch.run_step(state, StageName::Reviewer).await;
        assert_eq!(reviewer.calls(), 1);
        assert_eq!(state.current_step, Step::Reviewed);
        assert!(state.should_regenerate);
        assert!(state.analysis_result.is_none());
    }
}
