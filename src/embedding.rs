//! Embedding model abstraction and the Gemini implementation.
//!
//! Defines the [`EmbeddingModel`] trait plus the two call shapes the
//! pipeline needs — one interface, two capabilities:
//!
//! - [`embed_documents`] — embed a batch of chunk texts, one provider call
//!   per text, in order. A failed call is logged and recorded as `None`;
//!   it never aborts the batch and is never retried. Retry policy lives in
//!   the completion client only: a chunk whose embedding fails is simply
//!   not indexed, while a failed completion loses a user-visible answer.
//! - [`embed_query`] — embed a single query string, propagating failure.
//!
//! The concrete backend is the Gemini `embedContent` REST endpoint.
//! `GEMINI_API_KEY` must be set in the environment.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Text → fixed-length vector, implemented once per embedding provider.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embed chunk texts in document order, dropping failures.
///
/// The result has one slot per input; `None` marks a chunk the provider
/// failed on. Callers pair slots with their original positions so that
/// chunk identities stay keyed on the split position, not on a post-filter
/// counter.
pub async fn embed_documents(
    model: &dyn EmbeddingModel,
    texts: &[String],
) -> Vec<Option<Vec<f32>>> {
    let mut out = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        match model.embed(text).await {
            Ok(vector) => out.push(Some(vector)),
            Err(e) => {
                tracing::warn!(chunk = i, error = %e, "embedding failed, dropping chunk");
                out.push(None);
            }
        }
    }
    out
}

/// Embed a single query string. Unlike document embedding, a failure here
/// propagates: there is no useful retrieval without a query vector.
pub async fn embed_query(model: &dyn EmbeddingModel, text: &str) -> Result<Vec<f32>> {
    model.embed(text).await
}

/// Embedding client for the Gemini `embedContent` API.
pub struct GeminiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiEmbeddings {
    pub fn new(model: &str, timeout_secs: u64) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl EmbeddingModel for GeminiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("embedContent request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("embedContent returned {}: {}", status, detail);
        }

        let json: serde_json::Value = response.json().await?;
        let values = json
            .get("embedding")
            .and_then(|e| e.get("values"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("embedContent response missing embedding.values"))?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| anyhow!("non-numeric value in embedding"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails on a fixed set of inputs, succeeds on everything else.
    struct FlakyModel {
        fail_on: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingModel for FlakyModel {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.iter().any(|f| f == text) {
                bail!("provider error");
            }
            Ok(vec![text.len() as f32])
        }
    }

    #[tokio::test]
    async fn failed_document_embedding_becomes_none() {
        let model = FlakyModel {
            fail_on: vec!["bad".to_string()],
            calls: AtomicUsize::new(0),
        };
        let texts = vec!["ok".to_string(), "bad".to_string(), "fine".to_string()];

        let result = embed_documents(&model, &texts).await;

        assert_eq!(result.len(), 3);
        assert!(result[0].is_some());
        assert!(result[1].is_none());
        assert!(result[2].is_some());
        // One call per text: no retries at this layer.
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn query_embedding_failure_propagates() {
        let model = FlakyModel {
            fail_on: vec!["q".to_string()],
            calls: AtomicUsize::new(0),
        };
        assert!(embed_query(&model, "q").await.is_err());
        assert!(embed_query(&model, "other").await.is_ok());
    }
}
