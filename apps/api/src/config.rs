use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::LlmProvider;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    /// Provider default model when unset.
    pub llm_model: Option<String>,
    pub llm_temperature: f32,
    /// Attempts per stage call. 1 = single call, no transport retry.
    pub llm_max_attempts: u32,
    pub embedding_api_url: Option<String>,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub tagger_api_url: Option<String>,
    pub pipeline: PipelineDefaults,
    /// Seconds a finished run stays pollable.
    pub job_retention_secs: u64,
    pub job_max_finished: usize,
    pub port: u16,
    pub rust_log: String,
}

/// Tunable heuristics for the pipeline and scoring engine.
///
/// These are carried as defaults, not invariants: the weight pairs are expected
/// to sum to 1.0 but only a warning is logged when they do not.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDefaults {
    pub max_iterations: u32,
    pub keyword_weight: f64,
    pub semantic_weight: f64,
    pub deterministic_weight: f64,
    pub qualitative_weight: f64,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            keyword_weight: 0.3,
            semantic_weight: 0.7,
            deterministic_weight: 0.6,
            qualitative_weight: 0.4,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PipelineDefaults::default();
        let pipeline = PipelineDefaults {
            max_iterations: env_or("PIPELINE_MAX_ITERATIONS", defaults.max_iterations)?,
            keyword_weight: env_or("SCORING_KEYWORD_WEIGHT", defaults.keyword_weight)?,
            semantic_weight: env_or("SCORING_SEMANTIC_WEIGHT", defaults.semantic_weight)?,
            deterministic_weight: env_or(
                "ANALYZER_DETERMINISTIC_WEIGHT",
                defaults.deterministic_weight,
            )?,
            qualitative_weight: env_or("ANALYZER_QUALITATIVE_WEIGHT", defaults.qualitative_weight)?,
        };
        if pipeline.max_iterations == 0 {
            bail!("PIPELINE_MAX_ITERATIONS must be at least 1");
        }

        Ok(Config {
            llm_provider: env_or("LLM_PROVIDER", LlmProvider::Anthropic)?,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_model: optional_env("LLM_MODEL"),
            llm_temperature: env_or("LLM_TEMPERATURE", 0.7)?,
            llm_max_attempts: env_or("LLM_MAX_ATTEMPTS", 1)?,
            embedding_api_url: optional_env("EMBEDDING_API_URL"),
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| "all-MiniLM-L6-v2".to_string()),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            tagger_api_url: optional_env("TAGGER_API_URL"),
            pipeline,
            job_retention_secs: env_or("JOB_RETENTION_SECS", 3600)?,
            job_max_finished: env_or("JOB_MAX_FINISHED", 1000)?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns `None` for unset or blank variables.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults_match_documented_heuristics() {
        let d = PipelineDefaults::default();
        assert_eq!(d.max_iterations, 3);
        assert!((d.keyword_weight + d.semantic_weight - 1.0).abs() < f64::EPSILON);
        assert!((d.deterministic_weight + d.qualitative_weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_value_accepts_numbers() {
        let v: f64 = parse_value("SCORING_KEYWORD_WEIGHT", " 0.25 ").unwrap();
        assert!((v - 0.25).abs() < f64::EPSILON);
        let port: u16 = parse_value("PORT", "9090").unwrap();
        assert_eq!(port, 9090);
    }

    #[test]
    fn test_parse_value_error_names_the_variable() {
        let err = parse_value::<u16>("PORT", "not-a-port").unwrap_err();
        assert!(format!("{err:#}").contains("PORT"));
    }

    #[test]
    fn test_parse_value_provider() {
        let p: LlmProvider = parse_value("LLM_PROVIDER", "openai").unwrap();
        assert_eq!(p, LlmProvider::OpenAi);
        assert!(parse_value::<LlmProvider>("LLM_PROVIDER", "cohere").is_err());
    }
}
