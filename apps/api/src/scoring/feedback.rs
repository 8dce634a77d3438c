//! Advisory feedback derived deterministically from scores and resume text.
//! No external calls.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scoring::engine::CritiqueScore;

const MIN_WORDS: usize = 200;
const MAX_WORDS: usize = 1500;
/// Missing keywords named in a single recommendation.
const MAX_NAMED_KEYWORDS: usize = 5;

const ACTION_VERBS: &[&str] = &[
    "achieved",
    "developed",
    "led",
    "managed",
    "created",
    "implemented",
    "increased",
    "reduced",
    "improved",
    "designed",
    "built",
    "launched",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitativeFeedback {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Threshold rules over the scores, keyword sets and resume length.
pub fn qualitative_feedback(resume_text: &str, scores: &CritiqueScore) -> QualitativeFeedback {
    let mut fb = QualitativeFeedback::default();

    // Overall alignment
    if scores.overall_score >= 80.0 {
        fb.strengths
            .push("Excellent overall match with the job requirements".to_string());
    } else if scores.overall_score >= 60.0 {
        fb.strengths
            .push("Good alignment with core job requirements".to_string());
    } else if scores.overall_score >= 40.0 {
        fb.weaknesses
            .push("Moderate alignment - some key areas need improvement".to_string());
    } else {
        fb.weaknesses.push(
            "Low alignment with job requirements - significant gaps identified".to_string(),
        );
    }

    // Keyword coverage
    let named_missing: Vec<&str> = scores
        .missing_keywords
        .iter()
        .take(MAX_NAMED_KEYWORDS)
        .map(String::as_str)
        .collect();

    if scores.keyword_score >= 70.0 {
        fb.strengths
            .push("Strong keyword coverage matching the job description".to_string());
    } else if scores.keyword_score < 40.0 {
        fb.weaknesses
            .push("Limited keyword overlap with job requirements".to_string());
        if named_missing.is_empty() {
            fb.recommendations.push(
                "Consider incorporating more relevant keywords from the job description"
                    .to_string(),
            );
        } else {
            fb.recommendations.push(format!(
                "Consider incorporating more relevant keywords from the job description, such as: {}",
                named_missing.join(", ")
            ));
        }
    }

    if scores.missing_keywords.len() > 10 {
        fb.recommendations.push(format!(
            "Key skills to add or highlight: {}",
            named_missing.join(", ")
        ));
    }

    if scores.matched_keywords.len() >= 5 {
        let top: Vec<&str> = scores
            .matched_keywords
            .iter()
            .take(MAX_NAMED_KEYWORDS)
            .map(String::as_str)
            .collect();
        fb.strengths
            .push(format!("Strong matches found: {}", top.join(", ")));
    }

    // Semantic alignment
    if scores.semantic_score >= 75.0 {
        fb.strengths.push(
            "Resume content is semantically aligned with the role expectations".to_string(),
        );
    } else if scores.semantic_score < 50.0 {
        fb.weaknesses.push(
            "Resume content could better reflect the role's context and language".to_string(),
        );
        fb.recommendations.push(
            "Consider rephrasing accomplishments to align with industry terminology".to_string(),
        );
    }

    // Length
    let word_count = resume_text.split_whitespace().count();
    if word_count < MIN_WORDS {
        fb.weaknesses
            .push("Resume appears too brief - consider adding more detail".to_string());
        fb.recommendations
            .push("Expand on key accomplishments and responsibilities".to_string());
    } else if word_count > MAX_WORDS {
        fb.weaknesses
            .push("Resume may be too detailed for initial screening".to_string());
        fb.recommendations
            .push("Consider condensing to highlight most relevant experience".to_string());
    }

    fb
}

struct FormattingPatterns {
    sections: Vec<(&'static str, Regex)>,
    quantified: Regex,
}

fn patterns() -> &'static FormattingPatterns {
    static PATTERNS: OnceLock<FormattingPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let section = |label, pattern: &str| {
            (
                label,
                Regex::new(pattern).expect("section pattern is a valid regex"),
            )
        };
        FormattingPatterns {
            sections: vec![
                section("Summary", r"(?i)(summary|objective|profile)"),
                section("Experience", r"(?i)(experience|employment|work history)"),
                section("Education", r"(?i)(education|academic)"),
                section("Skills", r"(?i)(skills|competencies|technologies)"),
            ],
            quantified: Regex::new(r"\d+%|\$\d+|\d+\s*(years?|months?)")
                .expect("quantified pattern is a valid regex"),
        }
    })
}

/// Structural suggestions for the resume text, or a single "well-structured"
/// note when nothing applies.
pub fn analyze_formatting(resume_text: &str) -> Vec<String> {
    let p = patterns();
    let mut notes = Vec::new();

    for (label, re) in &p.sections {
        if !re.is_match(resume_text) {
            notes.push(format!("Consider adding a clear '{label}' section"));
        }
    }

    if !resume_text.contains('•') && !resume_text.contains('-') {
        notes.push("Use bullet points to improve readability and ATS parsing".to_string());
    }

    if !p.quantified.is_match(resume_text) {
        notes.push(
            "Add quantifiable achievements (percentages, dollar amounts, timeframes)".to_string(),
        );
    }

    if !has_leading_action_verb(resume_text) {
        notes.push("Start bullet points with strong action verbs".to_string());
    }

    if notes.is_empty() {
        notes.push("Resume formatting appears well-structured".to_string());
    }
    notes
}

/// True when any line (after bullet markers) opens with an action verb.
fn has_leading_action_verb(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '•' | '*'))
            .to_lowercase();
        let first = line
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .unwrap_or("");
        ACTION_VERBS.contains(&first)
    })
}
