//! Error taxonomy for the ingestion and answering pipeline.
//!
//! Only three conditions are allowed to reach the caller as hard failures:
//! a missing source, an unparseable source, and an exhausted completion
//! retry budget during ingestion-adjacent work. Everything inside the
//! conversational answer path is absorbed into a fallback (see `chat`).

use thiserror::Error;

/// Hard failures surfaced by the ingestion pipeline and gateway.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document's metadata row or its raw bytes are missing.
    #[error("source not found for document '{document_id}': {reason}")]
    SourceNotFound { document_id: String, reason: String },

    /// The raw bytes could not be parsed into text pages.
    #[error("failed to parse document '{document_id}': {reason}")]
    ParseFailure { document_id: String, reason: String },

    /// Every configured completion attempt was rate-limited.
    #[error("completion retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single completion call's failure mode.
///
/// `RateLimited` is the only retryable variant; the retry loop in
/// `completion` propagates `Provider` immediately.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("rate limited by completion provider")]
    RateLimited,

    #[error("completion provider error: {0}")]
    Provider(String),
}
