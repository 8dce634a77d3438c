//! In-crate test doubles for the external capabilities.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm_client::{LlmError, TextGenerator};
use crate::scoring::semantic::{Embedder, EmbeddingError};
use crate::scoring::tagger::{EntityTagger, TaggedSpan, TaggingError};

// ────────────────────────────────────────────────────────────────────────────
// Text generation
// ────────────────────────────────────────────────────────────────────────────

/// Replays scripted responses in order, repeating the last one once the
/// script is exhausted. `Err(msg)` entries become API errors.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn repeating(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.script.lock().unwrap().pop_front();
        let step = match next {
            Some(step) => {
                *self.last.lock().unwrap() = Some(step.clone());
                step
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("script is empty".to_string())),
        };

        step.map_err(|message| LlmError::Api {
            status: 503,
            message,
        })
    }
}

/// Every call fails.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn invoke(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Embedding
// ────────────────────────────────────────────────────────────────────────────

/// 26-dimensional letter-frequency vectors. Identical text gives identical
/// vectors; text without letters gives the zero vector.
pub struct LetterEmbedder;

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut counts = vec![0.0_f32; 26];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            counts[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Ok(counts)
    }
}

/// Delegates to `LetterEmbedder`, remembering the length in chars of every input.
#[derive(Default)]
pub struct RecordingEmbedder {
    lengths: Mutex<Vec<usize>>,
}

impl RecordingEmbedder {
    pub fn lengths(&self) -> Vec<usize> {
        self.lengths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for RecordingEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.lengths.lock().unwrap().push(text.chars().count());
        LetterEmbedder.encode(text).await
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn encode(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: 503,
            message: "model not loaded".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entity tagging
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same spans for every input.
pub struct FixedTagger {
    spans: Vec<TaggedSpan>,
}

impl FixedTagger {
    pub fn new(spans: Vec<TaggedSpan>) -> Self {
        Self { spans }
    }
}

#[async_trait]
impl EntityTagger for FixedTagger {
    async fn tag(&self, _text: &str) -> Result<Vec<TaggedSpan>, TaggingError> {
        Ok(self.spans.clone())
    }
}

/// Tags nothing, remembering the length in chars of every input.
#[derive(Default)]
pub struct RecordingTagger {
    lengths: Mutex<Vec<usize>>,
}

impl RecordingTagger {
    pub fn lengths(&self) -> Vec<usize> {
        self.lengths.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityTagger for RecordingTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedSpan>, TaggingError> {
        self.lengths.lock().unwrap().push(text.chars().count());
        Ok(Vec::new())
    }
}

pub struct FailingTagger;

#[async_trait]
impl EntityTagger for FailingTagger {
    async fn tag(&self, _text: &str) -> Result<Vec<TaggedSpan>, TaggingError> {
        Err(TaggingError::Api {
            status: 500,
            message: "tagger crashed".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub fn sample_ground_truth() -> Value {
    json!({
        "personal_info": {
            "name": "Jordan Lee",
            "email": "jordan@example.com",
            "title": "Backend Engineer"
        },
        "experience": [{
            "title": "Software Engineer",
            "company": "Acme",
            "start_date": "2021-03",
            "end_date": "present",
            "description": "Built Rust and Python services on AWS",
            "achievements": ["Cut p99 latency by 40%"]
        }],
        "education": [{"degree": "BSc Computer Science", "institution": "State University"}],
        "skills": {"languages": ["Rust", "Python"], "cloud": ["AWS", "Docker"]},
        "certifications": [],
        "projects": []
    })
}

/// A well-formed generator response.
pub fn generated_resume_json() -> String {
    json!({
        "header": {"name": "Jordan Lee", "title": "Backend Engineer"},
        "summary": "Backend engineer building Rust and Python services on AWS.",
        "experience": [{
            "title": "Software Engineer",
            "company": "Acme",
            "description": "Built Rust and Python services on AWS",
            "achievements": ["Cut p99 latency by 40%"]
        }],
        "education": [{"degree": "BSc Computer Science"}],
        "skills": {"languages": ["Rust", "Python"], "cloud": ["AWS", "Docker"]}
    })
    .to_string()
}

pub fn review_json(should_regenerate: bool) -> String {
    json!({
        "overall_quality": if should_regenerate { "fair" } else { "excellent" },
        "ats_score": if should_regenerate { 55 } else { 88 },
        "strengths": ["Clear structure"],
        "weaknesses": [],
        "suggestions": ["Quantify more achievements"],
        "missing_keywords": ["Kubernetes"],
        "should_regenerate": should_regenerate,
        "regeneration_reason": if should_regenerate { Value::from("Needs metrics") } else { Value::Null }
    })
    .to_string()
}

pub fn analysis_json(match_score: f64) -> String {
    json!({
        "match_score": match_score,
        "match_level": "strong",
        "matching_qualifications": ["Rust", "AWS"],
        "gaps": ["Kubernetes"],
        "recommendations": ["Mention container orchestration"],
        "competitive_assessment": "Competitive for mid-level roles",
        "key_strengths": ["Systems programming"],
        "interview_tips": ["Prepare a latency war story"]
    })
    .to_string()
}
