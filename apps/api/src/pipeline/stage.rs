//! The capability shared by Generator, Reviewer and Analyzer.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::llm_client::strip_json_fences;
use crate::pipeline::state::PipelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Generator,
    Reviewer,
    Analyzer,
}

impl StageName {
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Generator => "generator",
            StageName::Reviewer => "reviewer",
            StageName::Analyzer => "analyzer",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generator" => Ok(StageName::Generator),
            "reviewer" => Ok(StageName::Reviewer),
            "analyzer" => Ok(StageName::Analyzer),
            other => Err(format!("Unknown step: {other}")),
        }
    }
}

/// A unit that turns one pipeline state into the next.
///
/// `process` never fails: call and parse failures are recorded in
/// `state.errors` and replaced by deterministic fallback output so
/// downstream stages always receive usable input.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> StageName;

    fn build_prompt(&self, state: &PipelineState) -> String;

    async fn process(&self, state: PipelineState) -> PipelineState;
}

/// Strict parse of model output after stripping code fences.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_json_fences(raw))
}

/// Pretty JSON for prompt embedding.
pub fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
