//! Stage output records attached to the pipeline state.
//!
//! Each record is produced once by its stage and never mutated afterwards.
//! Parse failures are represented explicitly (`parse_error` + raw text) rather
//! than dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ────────────────────────────────────────────────────────────────────────────
// Generator output
// ────────────────────────────────────────────────────────────────────────────

/// Structured resume content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeContent {
    pub header: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub experience: Vec<Value>,
    pub education: Vec<Value>,
    pub skills: Value,
    #[serde(default)]
    pub certifications: Vec<Value>,
    #[serde(default)]
    pub projects: Vec<Value>,
    /// Set when the content was copied from ground truth after a failed call.
    #[serde(default, skip_serializing_if = "is_false")]
    pub fallback: bool,
    /// Any additional sections the model produced.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Generator text that could not be parsed into `ResumeContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnparsedContent {
    pub raw_content: String,
    pub parse_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedContent {
    Structured(ResumeContent),
    Unparsed(UnparsedContent),
}

impl GeneratedContent {
    pub fn unparsed(raw_content: String) -> Self {
        GeneratedContent::Unparsed(UnparsedContent {
            raw_content,
            parse_error: true,
        })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GeneratedContent::Structured(c) if c.fallback)
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, GeneratedContent::Unparsed(_))
    }

    /// Flattens the content to plain text for scoring.
    ///
    /// Uses summary, experience (`"<title> at <company>"`, description,
    /// achievements) and skills; unparsed output contributes its raw text.
    pub fn to_plain_text(&self) -> String {
        match self {
            GeneratedContent::Unparsed(u) => u.raw_content.clone(),
            GeneratedContent::Structured(c) => {
                let mut parts: Vec<String> = Vec::new();

                if let Some(summary) = &c.summary {
                    parts.push(summary.clone());
                }

                for exp in &c.experience {
                    let title = exp.get("title").and_then(value_text).unwrap_or_default();
                    let company = exp.get("company").and_then(value_text).unwrap_or_default();
                    if !title.is_empty() || !company.is_empty() {
                        parts.push(format!("{title} at {company}"));
                    }
                    if let Some(desc) = exp.get("description").and_then(value_text) {
                        parts.push(desc);
                    }
                    if let Some(Value::Array(achievements)) = exp.get("achievements") {
                        parts.extend(achievements.iter().filter_map(value_text));
                    }
                }

                match &c.skills {
                    Value::Object(categories) => {
                        for list in categories.values() {
                            if let Value::Array(items) = list {
                                parts.extend(items.iter().filter_map(value_text));
                            }
                        }
                    }
                    Value::Array(items) => parts.extend(items.iter().filter_map(value_text)),
                    _ => {}
                }

                parts
                    .into_iter()
                    .filter(|p| !p.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ────────────────────────────────────────────────────────────────────────────
// Reviewer output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFeedback {
    pub overall_quality: QualityRating,
    pub ats_score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    pub should_regenerate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regeneration_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub parse_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewFeedback {
    /// Neutral verdict used whenever the review could not be obtained.
    /// Never requests regeneration.
    pub fn neutral() -> Self {
        Self {
            overall_quality: QualityRating::Good,
            ats_score: 70.0,
            strengths: vec!["Content generated successfully".to_string()],
            weaknesses: vec![],
            suggestions: vec![],
            missing_keywords: vec![],
            should_regenerate: false,
            regeneration_reason: None,
            raw_response: None,
            parse_error: false,
            error: None,
        }
    }

    pub fn unparsed(raw_response: String) -> Self {
        Self {
            weaknesses: vec!["Review parsing failed".to_string()],
            raw_response: Some(raw_response),
            parse_error: true,
            ..Self::neutral()
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            weaknesses: vec!["Review unavailable".to_string()],
            error: Some(error),
            ..Self::neutral()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLevel {
    Excellent,
    Strong,
    Moderate,
    Weak,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub match_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_level: Option<MatchLevel>,
    #[serde(default)]
    pub matching_qualifications: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_assessment: Option<String>,
    #[serde(default)]
    pub key_strengths: Vec<String>,
    #[serde(default)]
    pub interview_tips: Vec<String>,
    /// Deterministic engine score, when a job description was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp_score: Option<f64>,
    /// Model-assessed score before fusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub parse_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Minimal result carrying only a score.
    pub fn with_score(match_score: f64) -> Self {
        Self {
            match_score,
            match_level: None,
            matching_qualifications: vec![],
            gaps: vec![],
            recommendations: vec![],
            competitive_assessment: None,
            key_strengths: vec![],
            interview_tips: vec![],
            nlp_score: None,
            llm_score: None,
            raw_response: None,
            parse_error: false,
            error: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Final record
// ────────────────────────────────────────────────────────────────────────────

/// Assembled once per run by the Analyzer, whatever happened upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResume {
    pub content: Option<GeneratedContent>,
    pub review: Option<ReviewFeedback>,
    pub analysis: Option<AnalysisResult>,
    pub score: Option<f64>,
    pub iterations: u32,
    pub errors: Vec<String>,
}
