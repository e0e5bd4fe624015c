//! Document deletion across all four stores.
//!
//! Removes the raw object, the metadata row, and the chat log, then
//! considers vector cleanup. The vector database only offers bulk
//! deletion at namespace granularity and the tenant namespace is shared
//! by all of the tenant's documents, so the namespace is wiped only once
//! the last document is gone. Index statistics are consulted first so an
//! empty index is never asked to delete. Vector cleanup failures are
//! logged and swallowed — the document is already unreachable through the
//! gateway at that point.

use crate::app::App;
use crate::error::PipelineError;
use crate::metadata;

pub async fn delete_document(app: &App, document_id: &str) -> Result<(), PipelineError> {
    let namespace = app.namespace();

    let doc = metadata::get_document(&app.pool, namespace, document_id)
        .await
        .map_err(PipelineError::Other)?
        .ok_or_else(|| PipelineError::SourceNotFound {
            document_id: document_id.to_string(),
            reason: "no document record".to_string(),
        })?;

    app.objects
        .delete(&doc.storage_path)
        .await
        .map_err(PipelineError::Other)?;

    metadata::delete_document(&app.pool, namespace, document_id)
        .await
        .map_err(PipelineError::Other)?;

    let removed = metadata::delete_chat(&app.pool, namespace, document_id)
        .await
        .map_err(PipelineError::Other)?;
    if removed == 0 {
        tracing::debug!(document_id, "no chat messages to delete");
    }

    let remaining = metadata::count_documents(&app.pool, namespace)
        .await
        .map_err(PipelineError::Other)?;
    if remaining > 0 {
        tracing::debug!(
            document_id,
            remaining,
            "tenant still owns documents, keeping vector namespace"
        );
        return Ok(());
    }

    match app.vectors.namespaces().await {
        Ok(names) if names.iter().any(|n| n == namespace) => {
            if let Err(e) = app.vectors.delete_all(namespace).await {
                tracing::error!(error = %e, "failed to delete vector namespace");
            }
        }
        Ok(_) => {
            tracing::debug!(namespace, "no vector namespace to delete");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to check vector index stats");
        }
    }

    Ok(())
}
