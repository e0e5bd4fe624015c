//! # askdoc
//!
//! Retrieval-augmented question answering over uploaded documents.
//!
//! Documents are chunked, embedded, and indexed into a per-tenant vector
//! namespace; questions are rephrased against conversation history, used
//! to retrieve relevant chunks, and answered by a completion model that
//! must cite its sources.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────┐   ┌──────────────┐
//! │ Object   │──▶│ Ingestion          │──▶│ Vector store  │
//! │ storage  │   │ parse→chunk→embed │   │ (namespace)   │
//! └──────────┘   └───────────────────┘   └──────┬───────┘
//!                                               │
//!              ┌─────────────────────────────────┤
//!              ▼                                 ▼
//!         ┌─────────┐   rephrase → retrieve → generate
//!         │  Chat   │◀──────────────────────────────────
//!         │  log    │        (cited answer)
//!         └─────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`storage`] | Object storage collaborator |
//! | [`parse`] | Bytes → page-scoped text |
//! | [`chunk`] | Overlapping text splitter |
//! | [`embedding`] | Embedding model seam + Gemini client |
//! | [`completion`] | Completion model seam, retry, Gemini client |
//! | [`vector`] | Vector store seam + in-memory backend |
//! | [`pinecone`] | Pinecone vector store backend |
//! | [`ingest`] | Ingestion pipeline |
//! | [`retriever`] | Scoped retrievers, ingest-on-miss gateway |
//! | [`chat`] | Conversational orchestrator |
//! | [`delete`] | Cross-store document deletion |

pub mod app;
pub mod chat;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod db;
pub mod delete;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod metadata;
pub mod models;
pub mod parse;
pub mod pinecone;
pub mod retriever;
pub mod storage;
pub mod vector;
