//! Entity / noun-phrase tagging capability.
//!
//! The core only consumes `TaggedSpan`s; filtering by entity label and phrase
//! length happens in `candidate_keyword` so it stays deterministic and testable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Entity labels that carry keyword signal.
pub const KEYWORD_ENTITY_LABELS: &[&str] = &["ORG", "PRODUCT", "GPE", "EVENT", "WORK_OF_ART"];

/// Longest noun phrase (in tokens) kept as a keyword.
const MAX_PHRASE_TOKENS: usize = 3;

#[derive(Debug, Error)]
pub enum TaggingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tagger returned status {status}: {message}")]
    Api { status: u16, message: String },
}

/// A span produced by the tagging service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaggedSpan {
    Entity { text: String, label: String },
    NounPhrase { text: String },
}

#[async_trait]
pub trait EntityTagger: Send + Sync {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedSpan>, TaggingError>;
}

/// Normalizes a span into a keyword, or drops it.
///
/// Entities are kept only for `KEYWORD_ENTITY_LABELS`; noun phrases only when
/// 1–3 tokens long and longer than 2 characters.
pub fn candidate_keyword(span: &TaggedSpan) -> Option<String> {
    match span {
        TaggedSpan::Entity { text, label } => {
            if !KEYWORD_ENTITY_LABELS.contains(&label.as_str()) {
                return None;
            }
            let keyword = text.trim().to_lowercase();
            (!keyword.is_empty()).then_some(keyword)
        }
        TaggedSpan::NounPhrase { text } => {
            let tokens = text.split_whitespace().count();
            if !(1..=MAX_PHRASE_TOKENS).contains(&tokens) {
                return None;
            }
            let keyword = text.trim().to_lowercase();
            (keyword.chars().count() > 2).then_some(keyword)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP sidecar implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TagResponse {
    #[serde(default)]
    entities: Vec<EntityDto>,
    #[serde(default)]
    noun_chunks: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EntityDto {
    text: String,
    label: String,
}

/// Tagger backed by an NLP sidecar exposing `POST {base}/entities`.
pub struct HttpEntityTagger {
    client: Client,
    endpoint: String,
}

impl HttpEntityTagger {
    pub fn new(base_url: &str) -> Result<Self, TaggingError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            endpoint: format!("{}/entities", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl EntityTagger for HttpEntityTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedSpan>, TaggingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TagRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaggingError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: TagResponse = response.json().await?;
        let spans = body
            .entities
            .into_iter()
            .map(|e| TaggedSpan::Entity {
                text: e.text,
                label: e.label,
            })
            .chain(
                body.noun_chunks
                    .into_iter()
                    .map(|text| TaggedSpan::NounPhrase { text }),
            )
            .collect();
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(text: &str, label: &str) -> TaggedSpan {
        TaggedSpan::Entity {
            text: text.to_string(),
            label: label.to_string(),
        }
    }

    fn phrase(text: &str) -> TaggedSpan {
        TaggedSpan::NounPhrase {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_org_entity_is_lowercased() {
        assert_eq!(candidate_keyword(&entity("Stripe", "ORG")), Some("stripe".into()));
    }

    #[test]
    fn test_person_entity_is_dropped() {
        assert_eq!(candidate_keyword(&entity("Ada Lovelace", "PERSON")), None);
    }

    #[test]
    fn test_noun_phrase_length_bounds() {
        assert_eq!(
            candidate_keyword(&phrase("distributed systems")),
            Some("distributed systems".into())
        );
        assert_eq!(candidate_keyword(&phrase("a very long noun phrase")), None);
        assert_eq!(candidate_keyword(&phrase("it")), None);
    }

    #[test]
    fn test_span_serde_shape() {
        let json = serde_json::to_value(entity("Berlin", "GPE")).unwrap();
        assert_eq!(json["kind"], "entity");
        assert_eq!(json["label"], "GPE");
    }

    #[test]
    fn test_tag_response_defaults_missing_lists() {
        let body: TagResponse = serde_json::from_str(r#"{"entities": []}"#).unwrap();
        assert!(body.noun_chunks.is_empty());
    }
}
