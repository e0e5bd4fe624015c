//! Vector database collaborator: namespace-scoped storage and search.
//!
//! The [`VectorStore`] trait covers exactly what the pipeline uses:
//! batched upsert, fetch-by-id (the cheap `{doc}-0` existence probe),
//! filtered similarity search, namespace-level delete, and the index
//! statistics consulted before bulk deletion.
//!
//! [`InMemoryVectorStore`] is the default backend and the test double:
//! `RwLock`-guarded maps with brute-force cosine ranking. The hosted
//! backend lives in [`crate::pinecone`].

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{ScoredChunk, VectorRecord};

/// Namespace-scoped vector storage and similarity search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite records by id. Writes are idempotent by record
    /// id, which is what makes the concurrent check-then-ingest race safe.
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()>;

    async fn fetch(&self, namespace: &str, id: &str) -> Result<Option<VectorRecord>>;

    /// Top-k most similar records, optionally filtered to one document id.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Delete every record in a namespace.
    async fn delete_all(&self, namespace: &str) -> Result<()>;

    /// Names of non-empty namespaces, from index-level statistics.
    async fn namespaces(&self) -> Result<Vec<String>>;
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

/// In-memory vector store for local use and tests.
#[derive(Default)]
pub struct InMemoryVectorStore {
    namespaces: RwLock<HashMap<String, HashMap<String, VectorRecord>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut namespaces = self.namespaces.write().unwrap();
        let ns = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            ns.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn fetch(&self, namespace: &str, id: &str) -> Result<Option<VectorRecord>> {
        let namespaces = self.namespaces.read().unwrap();
        Ok(namespaces
            .get(namespace)
            .and_then(|ns| ns.get(id))
            .cloned())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let namespaces = self.namespaces.read().unwrap();
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredChunk> = ns
            .values()
            .filter(|r| document_id.map_or(true, |d| r.metadata.document_id == d))
            .map(|r| ScoredChunk {
                score: cosine_similarity(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_all(&self, namespace: &str) -> Result<()> {
        let mut namespaces = self.namespaces.write().unwrap();
        namespaces.remove(namespace);
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        let namespaces = self.namespaces.read().unwrap();
        Ok(namespaces
            .iter()
            .filter(|(_, ns)| !ns.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VectorMetadata;

    fn record(id: &str, document_id: &str, values: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: VectorMetadata {
                text: format!("text for {id}"),
                document_id: document_id.to_string(),
                file_name: "f.pdf".to_string(),
                page_number: 1,
            },
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_id() {
        let store = InMemoryVectorStore::new();
        store
            .upsert("ns", vec![record("d-0", "d", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert("ns", vec![record("d-0", "d", vec![0.0, 1.0])])
            .await
            .unwrap();

        let fetched = store.fetch("ns", "d-0").await.unwrap().unwrap();
        assert_eq!(fetched.values, vec![0.0, 1.0]);
        assert_eq!(store.namespaces().await.unwrap(), vec!["ns".to_string()]);
    }

    #[tokio::test]
    async fn query_ranks_by_similarity_and_honors_filter() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(
                "ns",
                vec![
                    record("a-0", "a", vec![1.0, 0.0]),
                    record("a-1", "a", vec![0.9, 0.1]),
                    record("b-0", "b", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let all = store.query("ns", &[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].score >= all[1].score);

        let only_b = store.query("ns", &[1.0, 0.0], 10, Some("b")).await.unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].metadata.document_id, "b");
    }

    #[tokio::test]
    async fn missing_namespace_queries_empty() {
        let store = InMemoryVectorStore::new();
        assert!(store
            .query("nope", &[1.0], 5, None)
            .await
            .unwrap()
            .is_empty());
        assert!(store.fetch("nope", "x-0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_all_clears_the_namespace() {
        let store = InMemoryVectorStore::new();
        store
            .upsert("ns", vec![record("a-0", "a", vec![1.0])])
            .await
            .unwrap();
        store.delete_all("ns").await.unwrap();
        assert!(store.namespaces().await.unwrap().is_empty());
    }
}
