//! Pinecone implementation of the [`VectorStore`] trait.
//!
//! Talks to a Pinecone index over its data-plane REST API using the index
//! host from the config and the `PINECONE_API_KEY` environment variable:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | upsert | `POST {host}/vectors/upsert` |
//! | fetch | `GET {host}/vectors/fetch?ids={id}&namespace={ns}` |
//! | query | `POST {host}/query` (with `$eq` metadata filter) |
//! | delete_all | `POST {host}/vectors/delete` (`deleteAll: true`) |
//! | namespaces | `POST {host}/describe_index_stats` |

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::models::{ScoredChunk, VectorMetadata, VectorRecord};
use crate::vector::VectorStore;

pub struct PineconeStore {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeStore {
    pub fn new(index_host: &str, timeout_secs: u64) -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| anyhow!("PINECONE_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            host: index_host.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Pinecone request to {path} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("Pinecone {path} returned {status}: {detail}");
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let body = serde_json::json!({
            "namespace": namespace,
            "vectors": records,
        });
        self.post("/vectors/upsert", body).await?;
        Ok(())
    }

    async fn fetch(&self, namespace: &str, id: &str) -> Result<Option<VectorRecord>> {
        let response = self
            .client
            .get(format!("{}/vectors/fetch", self.host))
            .header("Api-Key", &self.api_key)
            .query(&[("ids", id), ("namespace", namespace)])
            .send()
            .await
            .context("Pinecone fetch request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("Pinecone fetch returned {status}: {detail}");
        }

        let json: serde_json::Value = response.json().await?;
        let Some(vector) = json.pointer(&format!("/vectors/{id}")) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(vector.clone())?))
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let mut body = serde_json::json!({
            "namespace": namespace,
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(doc_id) = document_id {
            body["filter"] = serde_json::json!({ "docId": { "$eq": doc_id } });
        }

        let json = self.post("/query", body).await?;
        let matches = json
            .get("matches")
            .and_then(|m| m.as_array())
            .cloned()
            .unwrap_or_default();

        let mut chunks = Vec::with_capacity(matches.len());
        for m in matches {
            let score = m.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32;
            let metadata: VectorMetadata = serde_json::from_value(
                m.get("metadata")
                    .cloned()
                    .ok_or_else(|| anyhow!("Pinecone match missing metadata"))?,
            )?;
            chunks.push(ScoredChunk { score, metadata });
        }
        Ok(chunks)
    }

    async fn delete_all(&self, namespace: &str) -> Result<()> {
        let body = serde_json::json!({
            "namespace": namespace,
            "deleteAll": true,
        });
        self.post("/vectors/delete", body).await?;
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        let json = self.post("/describe_index_stats", serde_json::json!({})).await?;
        Ok(json
            .get("namespaces")
            .and_then(|n| n.as_object())
            .map(|n| n.keys().cloned().collect())
            .unwrap_or_default())
    }
}
