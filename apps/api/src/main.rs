mod config;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod scoring;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::pipeline::analyzer::{AnalyzerStage, FusionWeights};
use crate::pipeline::generator::GeneratorStage;
use crate::pipeline::jobs::{JobRegistry, Retention};
use crate::pipeline::reviewer::ReviewerStage;
use crate::pipeline::Orchestrator;
use crate::routes::build_router;
use crate::scoring::keywords::KeywordExtractor;
use crate::scoring::semantic::{Embedder, HttpEmbedder};
use crate::scoring::tagger::{EntityTagger, HttpEntityTagger};
use crate::scoring::{ScoringEngine, ScoringWeights};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fitloop API v{}", env!("CARGO_PKG_VERSION"));

    // Text generation, shared by all three stages
    let llm = LlmClient::new(
        config.llm_provider,
        config.llm_api_key.clone(),
        config.llm_model.clone(),
        config.llm_temperature,
        config.llm_max_attempts,
    )?;
    info!(
        "LLM client initialized (provider: {}, model: {})",
        llm.provider(),
        llm.model()
    );
    let llm: Arc<dyn TextGenerator> = Arc::new(llm);

    // Scoring engine collaborators; absent services degrade to neutral scores
    let tagger: Option<Arc<dyn EntityTagger>> = match &config.tagger_api_url {
        Some(url) => {
            info!("Entity tagger at {url}");
            Some(Arc::new(HttpEntityTagger::new(url)?))
        }
        None => {
            warn!("TAGGER_API_URL not set; keywords come from the skills dictionary only");
            None
        }
    };
    let embedder: Option<Arc<dyn Embedder>> = match &config.embedding_api_url {
        Some(url) => {
            info!("Embedding service at {url} (model: {})", config.embedding_model);
            Some(Arc::new(HttpEmbedder::new(
                url.clone(),
                config.embedding_model.clone(),
                config.embedding_api_key.clone(),
            )?))
        }
        None => {
            warn!("EMBEDDING_API_URL not set; semantic similarity will be neutral");
            None
        }
    };

    let defaults = &config.pipeline;
    let scoring = Arc::new(ScoringEngine::new(
        KeywordExtractor::new(tagger),
        embedder,
        ScoringWeights {
            keyword: defaults.keyword_weight,
            semantic: defaults.semantic_weight,
        },
    ));

    let orchestrator = Orchestrator::new(
        Box::new(GeneratorStage::new(llm.clone())),
        Box::new(ReviewerStage::new(llm.clone())),
        Box::new(AnalyzerStage::new(
            llm,
            scoring.clone(),
            FusionWeights {
                deterministic: defaults.deterministic_weight,
                qualitative: defaults.qualitative_weight,
            },
        )),
        defaults.max_iterations,
    );
    info!("Pipeline ready (max iterations: {})", defaults.max_iterations);

    // Build app state
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        scoring,
        jobs: JobRegistry::with_retention(Retention {
            ttl: Duration::from_secs(config.job_retention_secs),
            max_finished: config.job_max_finished,
        }),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
