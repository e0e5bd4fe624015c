use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub tenant: TenantConfig,
    pub db: DbConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub pinecone: PineconeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TenantConfig {
    /// Tenant identifier; also the vector-store namespace for every document
    /// this tenant owns.
    pub user_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for the filesystem object store.
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        ChunkingConfig {
            chunk_chars: default_chunk_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_chunk_chars() -> usize {
    2000
}
fn default_overlap_chars() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Ranked chunks returned by similarity search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Most recent chat messages fed into the rephrasing prompt.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        RetrievalConfig {
            top_k: default_top_k(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_top_k() -> usize {
    30
}
fn default_history_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Rate-limit retry budget for chat completions.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}
fn default_chat_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct PineconeConfig {
    /// Index host, e.g. `https://askdoc-xxxx.svc.us-east-1.pinecone.io`.
    /// When unset the in-memory vector store is used.
    pub index_host: Option<String>,
    #[serde(default = "default_pinecone_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        PineconeConfig {
            index_host: None,
            timeout_secs: default_pinecone_timeout_secs(),
        }
    }
}

fn default_pinecone_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tenant]
            user_id = "t1"
            [db]
            path = "data/askdoc.db"
            [storage]
            root = "data/objects"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_chars, 2000);
        assert_eq!(config.chunking.overlap_chars, 500);
        assert_eq!(config.retrieval.top_k, 30);
        assert_eq!(config.retrieval.history_limit, 5);
        assert_eq!(config.gemini.max_attempts, 3);
        assert_eq!(config.gemini.base_delay_ms, 1000);
        assert!(config.pinecone.index_host.is_none());
        assert_eq!(config.pinecone.timeout_secs, 30);
    }

    #[test]
    fn pinecone_timeout_is_independent_of_the_model_timeout() {
        let config: Config = toml::from_str(
            r#"
            [tenant]
            user_id = "t1"
            [db]
            path = "data/askdoc.db"
            [storage]
            root = "data/objects"
            [gemini]
            timeout_secs = 120
            [pinecone]
            index_host = "https://askdoc.example.pinecone.io"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.gemini.timeout_secs, 120);
        assert_eq!(config.pinecone.timeout_secs, 10);
    }
}
