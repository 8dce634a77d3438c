//! Axum route handlers for the standalone critique API.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::scoring::DetailedCritique;
use crate::state::AppState;

/// Below this many characters the resume text is treated as unextractable.
const MIN_RESUME_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CritiqueRequest {
    pub resume_text: String,
    pub job_title: String,
    pub job_description: String,
    #[serde(default)]
    pub requirements: Option<String>,
}

/// POST /api/v1/critique
///
/// Scores a resume against a job posting and returns scores, qualitative
/// feedback and formatting notes.
pub async fn handle_critique(
    State(state): State<AppState>,
    Json(request): Json<CritiqueRequest>,
) -> Result<Json<DetailedCritique>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if request.resume_text.trim().chars().count() < MIN_RESUME_CHARS {
        return Err(AppError::UnprocessableEntity(
            "Insufficient resume text to critique".to_string(),
        ));
    }

    let jd_text = compose_jd_text(
        &request.job_title,
        &request.job_description,
        request.requirements.as_deref(),
    );

    let critique = state
        .scoring
        .full_critique(&request.resume_text, &jd_text)
        .await;

    info!(
        "Critique completed: overall={:.2} keyword={:.2} semantic={:.2}",
        critique.scores.overall_score, critique.scores.keyword_score, critique.scores.semantic_score
    );

    Ok(Json(critique))
}

/// `"<title>\n\n<description>"`, plus a requirements block when present.
pub fn compose_jd_text(title: &str, description: &str, requirements: Option<&str>) -> String {
    let mut jd = format!("{title}\n\n{description}");
    if let Some(req) = requirements.filter(|r| !r.trim().is_empty()) {
        jd.push_str("\n\nRequirements:\n");
        jd.push_str(req);
    }
    jd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_jd_text_without_requirements() {
        assert_eq!(
            compose_jd_text("Rust Engineer", "Build services.", None),
            "Rust Engineer\n\nBuild services."
        );
    }

    #[test]
    fn test_compose_jd_text_with_requirements() {
        assert_eq!(
            compose_jd_text("Rust Engineer", "Build services.", Some("5y Rust")),
            "Rust Engineer\n\nBuild services.\n\nRequirements:\n5y Rust"
        );
    }

    #[test]
    fn test_compose_jd_text_ignores_blank_requirements() {
        assert_eq!(compose_jd_text("T", "D", Some("  ")), "T\n\nD");
    }

    #[test]
    fn test_critique_request_requirements_optional() {
        let req: CritiqueRequest = serde_json::from_value(serde_json::json!({
            "resume_text": "x",
            "job_title": "t",
            "job_description": "d"
        }))
        .unwrap();
        assert!(req.requirements.is_none());
    }
}
