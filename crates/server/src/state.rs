//! # Application State
//!
//! The shared application state (`AppState`) and the logic for building it at
//! startup. It holds the configuration and the wired library components, so
//! every handler works with the same RAG client, ingestion pipeline and
//! dialogue engine.

use crate::config::{AppConfig, SessionStoreKind};
use leadrag::{
    dialogue::{
        DialogueEngine, DialogueSettings, InMemorySessionStore, SessionStore, SqliteSessionStore,
    },
    ingest::{ChunkingSettings, IngestionPipeline},
    leads::LeadRecorder,
    providers::{
        ai::{AiProvider, ChatCompletionProvider, Embedder, HttpEmbedder, RetryPolicy},
        db::sqlite::SqliteProvider,
    },
    RagClient, RagClientBuilder, Retriever,
};
use std::{path::Path, sync::Arc, time::Duration};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// The database backing documents, leads and (optionally) sessions.
    pub sqlite_provider: Arc<SqliteProvider>,
    pub rag: Arc<RagClient>,
    pub ingestion: Arc<IngestionPipeline>,
    pub dialogue: Arc<DialogueEngine>,
}

/// Builds the shared application state from the configuration.
///
/// Opens the SQLite database (creating its directory and schema if needed) and
/// wires the completion and embedding clients into the library components.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    if let Some(parent) = Path::new(&config.db_url).parent() {
        if !parent.as_os_str().is_empty() && config.db_url != ":memory:" {
            std::fs::create_dir_all(parent)?;
        }
    }
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    sqlite_provider.initialize_schema().await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");

    let completion = &config.completion;
    let ai_provider: Arc<dyn AiProvider> = Arc::new(ChatCompletionProvider::new(
        completion.api_url.clone(),
        completion.api_key.clone(),
        completion.model_name.clone(),
        Duration::from_secs(completion.timeout_secs),
    )?);

    let embedding = &config.embedding;
    let embedder: Arc<dyn Embedder> = Arc::new(
        HttpEmbedder::new(
            embedding.api_url.clone(),
            embedding.model_name.clone(),
            embedding.api_key.clone(),
            Duration::from_secs(embedding.timeout_secs),
        )?
        .with_retry(RetryPolicy {
            max_attempts: embedding.max_attempts,
            base_delay: Duration::from_millis(embedding.base_delay_ms),
            max_delay: Duration::from_millis(embedding.max_delay_ms),
        }),
    );

    let retriever = Retriever::new(
        Arc::clone(&embedder),
        Arc::new(sqlite_provider.clone()),
    )
    .with_top_k(config.retrieval.top_k)
    .with_threshold(config.retrieval.threshold);

    let mut rag_builder = RagClientBuilder::new()
        .ai_provider(ai_provider)
        .retriever(retriever)
        .temperature(completion.temperature)
        .max_tokens(completion.max_tokens);
    if let Some(persona) = &config.assistant.persona {
        rag_builder = rag_builder.persona(persona.clone());
    }
    let rag = Arc::new(rag_builder.build()?);

    let ingestion = IngestionPipeline::new(
        Arc::clone(&embedder),
        Arc::new(sqlite_provider.clone()),
        ChunkingSettings {
            chunk_size: config.chunking.chunk_size,
            overlap: config.chunking.overlap,
        },
    )
    .with_expected_dimension(embedding.dimension);

    let sessions: Arc<dyn SessionStore> = match config.dialogue.session_store {
        SessionStoreKind::Memory => Arc::new(InMemorySessionStore::new()),
        SessionStoreKind::Sqlite => Arc::new(SqliteSessionStore::new(sqlite_provider.clone())),
    };
    let dialogue = DialogueEngine::new(
        Arc::clone(&rag),
        sessions,
        LeadRecorder::new(Arc::new(sqlite_provider.clone())),
        DialogueSettings {
            use_rag: config.dialogue.use_rag,
            knowledge_owner_id: config.dialogue.knowledge_owner_id.clone(),
            intent_detection: config.dialogue.intent_detection,
        },
    );
    info!(
        model = %completion.model_name,
        session_store = ?config.dialogue.session_store,
        "Dialogue engine ready."
    );

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
        rag,
        ingestion: Arc::new(ingestion),
        dialogue: Arc::new(dialogue),
    })
}
