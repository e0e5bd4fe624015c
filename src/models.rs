//! Core data models used throughout askdoc.
//!
//! These types represent the documents, chunks, vector records, and chat
//! messages that flow through the ingestion and answering pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered document, stored in SQLite.
///
/// Created when a file is uploaded; immutable thereafter. The raw bytes live
/// in object storage at `storage_path`, not in this row.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    /// Display name shown in citations (e.g. `"report.pdf"`).
    pub name: String,
    /// Object-store key for the raw bytes.
    pub storage_path: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: i64,
}

/// A page-scoped text segment produced by the parsing layer.
#[derive(Debug, Clone)]
pub struct Page {
    pub text: String,
    /// 1-based page number within the source document.
    pub page_number: u32,
}

/// A fixed-size, overlapping slice of a document's text.
///
/// `index` is the chunk's position in the post-split sequence and is assigned
/// at split time, before any embedding happens. It never changes afterwards,
/// so the identity `{document_id}-{index}` stays stable even when a chunk is
/// dropped from indexing because its embedding failed.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub document_id: String,
    pub file_name: String,
    /// 0-based position in the post-split sequence.
    pub index: usize,
    pub text: String,
    pub page_number: u32,
}

impl DocumentChunk {
    /// Deterministic vector-record identity: `{document_id}-{index}`.
    pub fn vector_id(&self) -> String {
        format!("{}-{}", self.document_id, self.index)
    }
}

/// Metadata persisted alongside each embedding in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorMetadata {
    pub text: String,
    #[serde(rename = "docId")]
    pub document_id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
}

/// A (id, embedding, metadata) triple stored under a namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// A chunk returned by similarity search, ranked by descending score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub score: f32,
    pub metadata: VectorMetadata,
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    Human,
    Ai,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::Human => "human",
            ChatRole::Ai => "ai",
        }
    }

    pub fn from_str(s: &str) -> ChatRole {
        match s {
            "human" => ChatRole::Human,
            "ai" => ChatRole::Ai,
            other => {
                tracing::warn!(role = other, "unrecognized chat role, treating as assistant");
                ChatRole::Ai
            }
        }
    }
}

/// One turn in the append-only chat log keyed by (tenant, document).
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_roles_round_trip_and_default_to_assistant() {
        assert_eq!(ChatRole::from_str("human"), ChatRole::Human);
        assert_eq!(ChatRole::from_str("ai"), ChatRole::Ai);
        assert_eq!(ChatRole::from_str(ChatRole::Human.as_str()), ChatRole::Human);
        assert_eq!(ChatRole::from_str(ChatRole::Ai.as_str()), ChatRole::Ai);
        // A corrupted row degrades to the assistant role (with a warn).
        assert_eq!(ChatRole::from_str("moderator"), ChatRole::Ai);
    }
}
