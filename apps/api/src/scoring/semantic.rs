//! Semantic similarity via dense embeddings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::scoring::truncate_chars;

/// Characters of each document sent for embedding.
pub const MAX_EMBEDDING_CHARS: usize = 10_000;

/// Similarity reported when the embedding capability is unavailable.
pub const NEUTRAL_SIMILARITY: f64 = 0.5;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Embedding API returned no vectors")]
    Empty,

    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Cosine similarity of two vectors. Zero-norm vectors yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Cosine similarity of the two documents' embeddings, clamped to [0, 1].
///
/// Never fails: a missing embedder or any embedding error yields
/// `NEUTRAL_SIMILARITY`.
pub async fn semantic_similarity(embedder: Option<&dyn Embedder>, a: &str, b: &str) -> f64 {
    let Some(embedder) = embedder else {
        warn!("No embedding service configured, using neutral semantic similarity");
        return NEUTRAL_SIMILARITY;
    };

    match embed_pair(embedder, a, b).await {
        Ok(sim) => sim.clamp(0.0, 1.0),
        Err(e) => {
            error!("Semantic similarity calculation failed: {e}");
            NEUTRAL_SIMILARITY
        }
    }
}

async fn embed_pair(embedder: &dyn Embedder, a: &str, b: &str) -> Result<f64, EmbeddingError> {
    let va = embedder.encode(truncate_chars(a, MAX_EMBEDDING_CHARS)).await?;
    let vb = embedder.encode(truncate_chars(b, MAX_EMBEDDING_CHARS)).await?;
    cosine_similarity(&va, &vb)
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible embeddings endpoint
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Embedder backed by any service speaking the `/embeddings` wire format
/// (OpenAI, text-embeddings-inference, LiteLLM, ...).
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            url,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(EmbeddingError::Empty)
    }
}
