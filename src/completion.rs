//! Chat-completion model abstraction with rate-limit retry.
//!
//! [`CompletionModel`] is the single-call seam; [`complete_with_retry`]
//! wraps it in the pipeline's backoff policy. Only a rate-limit signal is
//! retried — up to `max_attempts` calls with an exponential delay starting
//! at `base_delay_ms` and doubling after each rate-limited attempt. Any
//! other provider failure propagates immediately, and an all-rate-limited
//! run surfaces [`PipelineError::RetriesExhausted`].
//!
//! The client holds no request-scoped state; it serves both query
//! rephrasing and final answer generation.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::error::{CompletionError, PipelineError};

/// Prompt → text, implemented once per completion provider.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Call the model with bounded exponential-backoff retry on rate limits.
pub async fn complete_with_retry(
    model: &dyn CompletionModel,
    prompt: &str,
    max_attempts: u32,
    base_delay_ms: u64,
) -> Result<String, PipelineError> {
    let mut delay = Duration::from_millis(base_delay_ms);

    for attempt in 1..=max_attempts {
        match model.complete(prompt).await {
            Ok(text) => return Ok(text.trim().to_string()),
            Err(CompletionError::RateLimited) => {
                if attempt == max_attempts {
                    break;
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(CompletionError::Provider(msg)) => {
                return Err(PipelineError::Other(anyhow!(
                    "completion provider error: {msg}"
                )));
            }
        }
    }

    Err(PipelineError::RetriesExhausted {
        attempts: max_attempts,
    })
}

/// Completion client for the Gemini `generateContent` API.
///
/// HTTP 429 is mapped to [`CompletionError::RateLimited`]; every other
/// failure is a provider error.
pub struct GeminiCompletion {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiCompletion {
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
impl CompletionModel for GeminiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider(format!(
                "generateContent returned {status}: {detail}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Provider(format!("invalid response body: {e}")))?;

        json.get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| {
                CompletionError::Provider("generateContent response missing text".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rate-limits the first `limit_first` calls, then succeeds.
    struct RateLimitedModel {
        limit_first: usize,
        calls: AtomicUsize,
    }

    impl RateLimitedModel {
        fn new(limit_first: usize) -> Self {
            Self {
                limit_first,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for RateLimitedModel {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.limit_first {
                Err(CompletionError::RateLimited)
            } else {
                Ok("  answer  ".to_string())
            }
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl CompletionModel for BrokenModel {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Err(CompletionError::Provider("boom".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_backoffs() {
        let model = RateLimitedModel::new(2);
        let started = tokio::time::Instant::now();

        let text = complete_with_retry(&model, "p", 3, 1000).await.unwrap();

        assert_eq!(text, "answer");
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        // Two delays: 1000 ms then 2000 ms.
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_when_every_attempt_is_rate_limited() {
        let model = RateLimitedModel::new(usize::MAX);

        let err = complete_with_retry(&model, "p", 3, 1000).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::RetriesExhausted { attempts: 3 }
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_error_is_not_retried() {
        let started = tokio::time::Instant::now();

        let err = complete_with_retry(&BrokenModel, "p", 3, 1000)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Other(_)));
        // Fails fast: no backoff sleeps happened.
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
