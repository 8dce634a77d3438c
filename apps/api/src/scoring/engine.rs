//! Hybrid scoring: `keyword_weight * jaccard + semantic_weight * cosine`, scaled to 0–100.
//!
//! The engine is a pure function of its two inputs and weights, apart from
//! the injected read-only embedding and tagging capabilities.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scoring::feedback::{analyze_formatting, qualitative_feedback};
use crate::scoring::keywords::{jaccard_similarity, KeywordExtractor};
use crate::scoring::semantic::{semantic_similarity, Embedder};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub keyword: f64,
    pub semantic: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword: 0.3,
            semantic: 0.7,
        }
    }
}

impl ScoringWeights {
    pub fn sums_to_one(&self) -> bool {
        (self.keyword + self.semantic - 1.0).abs() < 1e-9
    }
}

/// Score breakdown for one resume / JD pair. All scores are 0–100, rounded to
/// 2 decimals; keyword lists are sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueScore {
    pub overall_score: f64,
    pub keyword_score: f64,
    pub semantic_score: f64,
    pub matched_keywords: Vec<String>,
    /// In the JD but not in the resume.
    pub missing_keywords: Vec<String>,
    pub resume_keywords: Vec<String>,
    pub jd_keywords: Vec<String>,
}

/// Scores plus advisory feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedCritique {
    pub scores: CritiqueScore,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub formatting_notes: Vec<String>,
}

pub struct ScoringEngine {
    extractor: KeywordExtractor,
    embedder: Option<Arc<dyn Embedder>>,
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(
        extractor: KeywordExtractor,
        embedder: Option<Arc<dyn Embedder>>,
        weights: ScoringWeights,
    ) -> Self {
        if !weights.sums_to_one() {
            warn!(
                "Scoring weights sum to {} (expected 1.0); fused scores may leave 0-100",
                weights.keyword + weights.semantic
            );
        }
        Self {
            extractor,
            embedder,
            weights,
        }
    }

    /// Scores `resume` against `jd` with the engine's configured weights.
    pub async fn score(&self, resume: &str, jd: &str) -> CritiqueScore {
        self.score_with_weights(resume, jd, self.weights).await
    }

    pub async fn score_with_weights(
        &self,
        resume: &str,
        jd: &str,
        weights: ScoringWeights,
    ) -> CritiqueScore {
        let resume_keywords = self.extractor.extract(resume).await;
        let jd_keywords = self.extractor.extract(jd).await;

        let jaccard = jaccard_similarity(&resume_keywords, &jd_keywords);
        let cosine = semantic_similarity(self.embedder.as_deref(), resume, jd).await;
        let fused = weights.keyword * jaccard + weights.semantic * cosine;

        debug!(jaccard, cosine, fused, "Hybrid score computed");

        CritiqueScore {
            overall_score: to_percent(fused),
            keyword_score: to_percent(jaccard),
            semantic_score: to_percent(cosine),
            matched_keywords: resume_keywords.intersection(&jd_keywords).cloned().collect(),
            missing_keywords: jd_keywords.difference(&resume_keywords).cloned().collect(),
            resume_keywords: resume_keywords.into_iter().collect(),
            jd_keywords: jd_keywords.into_iter().collect(),
        }
    }

    /// Score, qualitative feedback, and formatting notes in one pass.
    pub async fn full_critique(&self, resume: &str, jd: &str) -> DetailedCritique {
        let scores = self.score(resume, jd).await;
        let feedback = qualitative_feedback(resume, &scores);
        let formatting_notes = analyze_formatting(resume);

        DetailedCritique {
            scores,
            strengths: feedback.strengths,
            weaknesses: feedback.weaknesses,
            recommendations: feedback.recommendations,
            formatting_notes,
        }
    }
}

/// 0–1 fraction to a 0–100 score rounded to 2 decimals.
fn to_percent(fraction: f64) -> f64 {
    round2(fraction * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
