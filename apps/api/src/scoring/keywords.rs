//! Keyword extraction and overlap.
//!
//! Keywords = static domain dictionary (boundary-anchored match on lowercased text)
//! ∪ tagged entities and short noun phrases. Overlap is Jaccard similarity.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::warn;

use crate::scoring::tagger::{candidate_keyword, EntityTagger};
use crate::scoring::truncate_chars;

/// Upper bound on characters sent to the tagging service.
const MAX_TAGGING_CHARS: usize = 100_000;

/// Domain terms matched case-insensitively on word boundaries.
pub const TECH_SKILLS: &[&str] = &[
    // Programming languages
    "python", "javascript", "typescript", "java", "c++", "c#", "ruby", "go", "golang",
    "rust", "swift", "kotlin", "php", "scala", "r", "matlab", "perl", "shell", "bash",
    // Web frameworks
    "react", "reactjs", "angular", "vue", "vuejs", "django", "flask", "fastapi",
    "express", "nodejs", "node.js", "nextjs", "next.js", "spring", "rails", "laravel",
    // Data science & ML
    "tensorflow", "pytorch", "keras", "scikit-learn", "sklearn", "pandas", "numpy",
    "matplotlib", "seaborn", "jupyter", "machine learning", "deep learning", "nlp",
    "computer vision", "data science", "data analysis", "statistics",
    // Cloud & DevOps
    "aws", "azure", "gcp", "google cloud", "docker", "kubernetes", "k8s", "terraform",
    "jenkins", "ci/cd", "github actions", "gitlab", "circleci", "ansible", "puppet",
    // Databases
    "sql", "mysql", "postgresql", "postgres", "mongodb", "redis", "elasticsearch",
    "dynamodb", "cassandra", "oracle", "sqlite", "neo4j", "graphql",
    // Tools & practices
    "git", "github", "jira", "confluence", "agile", "scrum", "kanban", "rest", "restful",
    "api", "microservices", "serverless", "linux", "unix", "windows server",
    // Soft skills
    "leadership", "communication", "teamwork", "problem solving", "analytical",
    "project management", "time management", "presentation", "collaboration",
];

/// Compiled dictionary patterns, built once per process.
fn dictionary() -> &'static [(&'static str, Regex)] {
    static DICTIONARY: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    DICTIONARY.get_or_init(|| {
        TECH_SKILLS
            .iter()
            .map(|term| {
                let pattern = term_pattern(term);
                let re = Regex::new(&pattern).expect("escaped dictionary term is a valid regex");
                (*term, re)
            })
            .collect()
    })
}

/// `\b` only holds next to a word character, so terms starting or ending in
/// a symbol (`c++`, `c#`) are anchored on a non-word character or the text edge.
fn term_pattern(term: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let start = if is_word(term.chars().next()) { r"\b" } else { r"(?:^|\W)" };
    let end = if is_word(term.chars().last()) { r"\b" } else { r"(?:\W|$)" };
    format!("{start}{}{end}", regex::escape(term))
}

/// Dictionary terms present in `text`.
pub fn dictionary_keywords(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    dictionary()
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(term, _)| (*term).to_string())
        .collect()
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`; 0.0 when either set is empty.
pub fn jaccard_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Extracts normalized keywords from free text.
#[derive(Clone, Default)]
pub struct KeywordExtractor {
    tagger: Option<Arc<dyn EntityTagger>>,
}

impl KeywordExtractor {
    pub fn new(tagger: Option<Arc<dyn EntityTagger>>) -> Self {
        Self { tagger }
    }

    /// Dictionary matches plus tagged candidates. Tagging failures are logged
    /// and leave the dictionary matches as the result.
    pub async fn extract(&self, text: &str) -> BTreeSet<String> {
        let mut keywords = dictionary_keywords(text);

        if let Some(tagger) = &self.tagger {
            match tagger.tag(truncate_chars(text, MAX_TAGGING_CHARS)).await {
                Ok(spans) => keywords.extend(spans.iter().filter_map(candidate_keyword)),
                Err(e) => warn!("Entity tagging failed, using dictionary keywords only: {e}"),
            }
        }

        keywords
    }
}
