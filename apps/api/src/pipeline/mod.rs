// Resume pipeline: Generator → Reviewer → (regenerate?) → Analyzer.
// Stages share one capability interface and never fail past their own
// boundary; the orchestrator owns the only branch point.

pub mod analyzer;
pub mod generator;
pub mod handlers;
pub mod jobs;
pub mod orchestrator;
pub mod prompts;
pub mod reviewer;
pub mod stage;
pub mod state;

pub use orchestrator::Orchestrator;
