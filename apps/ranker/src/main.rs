use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ranker::config::{AppConfig, EmbeddingBackend};
use ranker::extract::{DocumentExtractor, OcrEngine};
use ranker::nlp::rules::RuleBasedPipeline;
use ranker::nlp::LanguagePipeline;
use ranker::routes::build_router;
use ranker::scoring::ScoringEngine;
use ranker::semantic::{LexicalEmbedder, SemanticMatcher, SentenceEmbedder};
use ranker::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = AppConfig::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ranker v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload_dir.display()))?;
    info!("Upload directory: {}", config.upload_dir.display());

    // Model loading is blocking (file I/O, possibly a Hub download)
    let engine_config = config.clone();
    let engine = tokio::task::spawn_blocking(move || build_engine(&engine_config))
        .await
        .context("engine construction task panicked")??;

    let state = AppState {
        engine: Arc::new(engine),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs every model-backed service once and wires them into the engine.
fn build_engine(config: &AppConfig) -> Result<ScoringEngine> {
    let extractor = DocumentExtractor::new(build_ocr(config)?);
    let nlp = build_nlp(config)?;
    info!("NLP pipeline: {}", nlp.name());
    let matcher = SemanticMatcher::new(build_embedder(config)?);
    info!("Embedding model: {}", matcher.model_name());

    Ok(ScoringEngine::new(extractor, nlp, matcher, config.scoring.clone()))
}

#[cfg(feature = "ocr")]
fn build_ocr(config: &AppConfig) -> Result<Option<Arc<dyn OcrEngine>>> {
    use ranker::extract::ocr_backend::OcrsBackend;

    match (&config.ocr_detection_model, &config.ocr_recognition_model) {
        (Some(detection), Some(recognition)) => {
            let backend = OcrsBackend::load(detection, recognition).context("Failed to load OCR models")?;
            info!("OCR engine initialized");
            Ok(Some(Arc::new(backend)))
        }
        _ => {
            warn!("OCR_DETECTION_MODEL / OCR_RECOGNITION_MODEL not set; image CVs will be unreadable");
            Ok(None)
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn build_ocr(_config: &AppConfig) -> Result<Option<Arc<dyn OcrEngine>>> {
    warn!("Built without the `ocr` feature; image CVs will be unreadable");
    Ok(None)
}

#[cfg(feature = "candle")]
fn build_nlp(config: &AppConfig) -> Result<Arc<dyn LanguagePipeline>> {
    use ranker::nlp::bert::BertNerPipeline;

    match &config.ner_model_dir {
        Some(dir) => {
            let pipeline = BertNerPipeline::load(dir).context("Failed to load NER model")?;
            Ok(Arc::new(pipeline))
        }
        None => Ok(Arc::new(RuleBasedPipeline::new())),
    }
}

#[cfg(not(feature = "candle"))]
fn build_nlp(config: &AppConfig) -> Result<Arc<dyn LanguagePipeline>> {
    if config.ner_model_dir.is_some() {
        warn!("NER_MODEL_DIR ignored: built without the `candle` feature");
    }
    Ok(Arc::new(RuleBasedPipeline::new()))
}

fn build_embedder(config: &AppConfig) -> Result<Arc<dyn SentenceEmbedder>> {
    match config.embedding_backend {
        #[cfg(feature = "candle")]
        EmbeddingBackend::Candle => {
            use ranker::semantic::candle::CandleEmbedder;

            let embedder = CandleEmbedder::load(config.embedding_model_dir.as_deref())
                .context("Failed to load embedding model")?;
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingBackend::Candle => {
            warn!("EMBEDDING_BACKEND=candle requires the `candle` feature; using lexical embeddings");
            Ok(Arc::new(LexicalEmbedder::new()))
        }
        EmbeddingBackend::Lexical => Ok(Arc::new(LexicalEmbedder::new())),
    }
}
