//! Vector store gateway: scoped retrievers with ingest-on-miss.
//!
//! `get_retriever` hands back a similarity-search handle scoped either to
//! one document or, for the reserved id [`ALL_DOCUMENTS`], to the whole
//! tenant namespace. Whether a document is already indexed is decided by
//! a single-key probe for chunk identity `{doc_id}-0` — deliberately
//! cheap, at the cost of not noticing a partially ingested document.
//!
//! The probe and the ingestion it may trigger are not atomic: two
//! concurrent callers can both see "absent" and both ingest. The write is
//! idempotent by chunk id, so the race is accepted rather than locked
//! around.

use std::sync::Arc;

use anyhow::Result;

use crate::app::App;
use crate::embedding::{embed_query, EmbeddingModel};
use crate::error::PipelineError;
use crate::ingest::ingest_document;
use crate::models::ScoredChunk;
use crate::vector::VectorStore;

/// Reserved document id selecting a cross-document retrieval scope.
/// It is a retrieval mode, not a namespace: the search simply runs with
/// no document filter.
pub const ALL_DOCUMENTS: &str = "ALL";

/// A scoped query interface over the vector store.
pub struct Retriever {
    vectors: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingModel>,
    namespace: String,
    document_filter: Option<String>,
    top_k: usize,
}

impl Retriever {
    /// Embed the query and return the top-k most similar chunks within
    /// this retriever's scope, ranked by descending similarity.
    pub async fn search(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let vector = embed_query(self.embeddings.as_ref(), query).await?;
        self.vectors
            .query(
                &self.namespace,
                &vector,
                self.top_k,
                self.document_filter.as_deref(),
            )
            .await
    }
}

/// Return a retriever for `document_id`, ingesting the document first if
/// it is not yet indexed. For [`ALL_DOCUMENTS`] no existence check or
/// ingestion happens; the retriever spans every indexed document.
pub async fn get_retriever(app: &App, document_id: &str) -> Result<Retriever, PipelineError> {
    let namespace = app.namespace().to_string();
    let top_k = app.config.retrieval.top_k;

    if document_id == ALL_DOCUMENTS {
        tracing::debug!(namespace, "retriever over all documents");
        return Ok(Retriever {
            vectors: app.vectors.clone(),
            embeddings: app.embeddings.clone(),
            namespace,
            document_filter: None,
            top_k,
        });
    }

    let probe_id = format!("{document_id}-0");
    let indexed = app
        .vectors
        .fetch(&namespace, &probe_id)
        .await
        .map_err(PipelineError::Other)?
        .is_some();

    if indexed {
        tracing::debug!(document_id, "document already indexed, reusing");
    } else {
        ingest_document(app, document_id).await?;
    }

    Ok(Retriever {
        vectors: app.vectors.clone(),
        embeddings: app.embeddings.clone(),
        namespace,
        document_filter: Some(document_id.to_string()),
        top_k,
    })
}
