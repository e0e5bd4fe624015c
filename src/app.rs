//! Process-level dependency wiring.
//!
//! Every pipeline entry point takes an [`App`]: the config, the SQLite
//! pool, and trait-object handles for the four external collaborators.
//! Clients are constructed once here, at bootstrap, and injected — no
//! module-level globals.

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::completion::{CompletionModel, GeminiCompletion};
use crate::config::Config;
use crate::db;
use crate::embedding::{EmbeddingModel, GeminiEmbeddings};
use crate::pinecone::PineconeStore;
use crate::storage::{FsObjectStore, ObjectStore};
use crate::vector::{InMemoryVectorStore, VectorStore};

pub struct App {
    pub config: Config,
    pub pool: SqlitePool,
    pub objects: Arc<dyn ObjectStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub embeddings: Arc<dyn EmbeddingModel>,
    pub completions: Arc<dyn CompletionModel>,
}

impl App {
    /// Build the production wiring: SQLite metadata store, filesystem
    /// object store, Gemini models, and Pinecone when an index host is
    /// configured (an in-process store otherwise).
    pub async fn bootstrap(config: Config) -> Result<App> {
        let pool = db::connect(&config.db.path).await?;
        db::run_migrations(&pool).await?;

        let objects: Arc<dyn ObjectStore> =
            Arc::new(FsObjectStore::new(config.storage.root.clone()));

        let vectors: Arc<dyn VectorStore> = match &config.pinecone.index_host {
            Some(host) => Arc::new(PineconeStore::new(host, config.pinecone.timeout_secs)?),
            None => {
                tracing::warn!(
                    "no pinecone.index_host configured; using a non-persistent in-memory vector store"
                );
                Arc::new(InMemoryVectorStore::new())
            }
        };

        let embeddings: Arc<dyn EmbeddingModel> = Arc::new(GeminiEmbeddings::new(
            &config.gemini.embedding_model,
            config.gemini.timeout_secs,
        )?);
        let completions: Arc<dyn CompletionModel> = Arc::new(GeminiCompletion::new(
            &config.gemini.chat_model,
            config.gemini.timeout_secs,
        )?);

        Ok(App {
            config,
            pool,
            objects,
            vectors,
            embeddings,
            completions,
        })
    }

    /// The tenant's vector-store namespace. One namespace holds every
    /// document the tenant owns; documents are told apart by metadata.
    pub fn namespace(&self) -> &str {
        &self.config.tenant.user_id
    }
}
