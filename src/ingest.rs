//! Document ingestion pipeline.
//!
//! `ingest_document` runs the full flow for one document: resolve its
//! metadata row, fetch the raw bytes from object storage, parse into
//! page-scoped text, split into overlapping chunks, embed each chunk in
//! order, and batch-upsert the surviving records into the tenant's vector
//! namespace.
//!
//! Embedding is sequential by design — one chunk completes before the
//! next starts — which bounds throughput but avoids amplifying provider
//! rate limits. A chunk whose embedding fails is dropped from the batch;
//! its identity is not recycled, so the id sequence keeps a hole where it
//! was.

use crate::app::App;
use crate::chunk::split_pages;
use crate::embedding::embed_documents;
use crate::error::PipelineError;
use crate::metadata;
use crate::models::{VectorMetadata, VectorRecord};
use crate::parse::parse_pages;

/// Counters reported after an ingestion run.
#[derive(Debug, Clone, Copy)]
pub struct IngestSummary {
    pub chunks: usize,
    pub indexed: usize,
    pub dropped: usize,
}

pub async fn ingest_document(app: &App, document_id: &str) -> Result<IngestSummary, PipelineError> {
    let namespace = app.namespace();

    let doc = metadata::get_document(&app.pool, namespace, document_id)
        .await
        .map_err(PipelineError::Other)?
        .ok_or_else(|| PipelineError::SourceNotFound {
            document_id: document_id.to_string(),
            reason: "no document record".to_string(),
        })?;

    let bytes = app
        .objects
        .fetch(&doc.storage_path)
        .await
        .map_err(PipelineError::Other)?
        .ok_or_else(|| PipelineError::SourceNotFound {
            document_id: document_id.to_string(),
            reason: format!("object missing at {}", doc.storage_path),
        })?;

    let pages =
        parse_pages(&bytes, &doc.content_type).map_err(|e| PipelineError::ParseFailure {
            document_id: document_id.to_string(),
            reason: e.to_string(),
        })?;

    let chunks = split_pages(document_id, &doc.name, &pages, &app.config.chunking);
    tracing::info!(
        document_id,
        pages = pages.len(),
        chunks = chunks.len(),
        "split document"
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embed_documents(app.embeddings.as_ref(), &texts).await;

    let mut records = Vec::with_capacity(chunks.len());
    for (chunk, values) in chunks.iter().zip(vectors) {
        let Some(values) = values else {
            continue;
        };
        records.push(VectorRecord {
            id: chunk.vector_id(),
            values,
            metadata: VectorMetadata {
                text: chunk.text.clone(),
                document_id: chunk.document_id.clone(),
                file_name: chunk.file_name.clone(),
                page_number: chunk.page_number,
            },
        });
    }

    let summary = IngestSummary {
        chunks: chunks.len(),
        indexed: records.len(),
        dropped: chunks.len() - records.len(),
    };

    // One batch write. Small documents fit comfortably; splitting into
    // sub-batches is an operational concern for large uploads, not a
    // correctness one.
    app.vectors
        .upsert(namespace, records)
        .await
        .map_err(PipelineError::Other)?;

    tracing::info!(
        document_id,
        indexed = summary.indexed,
        dropped = summary.dropped,
        "ingestion complete"
    );
    Ok(summary)
}
