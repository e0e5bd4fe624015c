//! Metadata store: document registry and per-document chat logs.
//!
//! Thin sqlx layer over the two SQLite tables created in [`crate::db`].
//! Chat timestamps are stored as unix milliseconds so that consecutive
//! messages within the same second keep their insertion order.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::models::{ChatMessage, ChatRole, Document};

pub async fn insert_document(pool: &SqlitePool, tenant_id: &str, doc: &Document) -> Result<()> {
    sqlx::query(
        "INSERT INTO documents (id, tenant_id, name, storage_path, content_type, size, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&doc.id)
    .bind(tenant_id)
    .bind(&doc.name)
    .bind(&doc.storage_path)
    .bind(&doc.content_type)
    .bind(doc.size)
    .bind(doc.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_document(
    pool: &SqlitePool,
    tenant_id: &str,
    document_id: &str,
) -> Result<Option<Document>> {
    let row = sqlx::query(
        "SELECT id, name, storage_path, content_type, size, created_at
         FROM documents WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(document_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Document {
        id: r.get("id"),
        name: r.get("name"),
        storage_path: r.get("storage_path"),
        content_type: r.get("content_type"),
        size: r.get("size"),
        created_at: r.get("created_at"),
    }))
}

pub async fn list_documents(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query(
        "SELECT id, name, storage_path, content_type, size, created_at
         FROM documents WHERE tenant_id = ? ORDER BY created_at",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Document {
            id: r.get("id"),
            name: r.get("name"),
            storage_path: r.get("storage_path"),
            content_type: r.get("content_type"),
            size: r.get("size"),
            created_at: r.get("created_at"),
        })
        .collect())
}

pub async fn delete_document(pool: &SqlitePool, tenant_id: &str, document_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM documents WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(document_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_documents(pool: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn append_message(
    pool: &SqlitePool,
    tenant_id: &str,
    document_id: &str,
    role: ChatRole,
    message: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO chat_messages (tenant_id, document_id, role, message, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(tenant_id)
    .bind(document_id)
    .bind(role.as_str())
    .bind(message)
    .bind(Utc::now().timestamp_millis())
    .execute(pool)
    .await?;
    Ok(())
}

/// Load the `limit` most recent messages for a conversation, returned in
/// chronological order (the query walks newest-first, then the page is
/// reversed for prompt construction).
pub async fn recent_messages(
    pool: &SqlitePool,
    tenant_id: &str,
    document_id: &str,
    limit: usize,
) -> Result<Vec<ChatMessage>> {
    let rows = sqlx::query(
        "SELECT role, message, created_at FROM chat_messages
         WHERE tenant_id = ? AND document_id = ?
         ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(tenant_id)
    .bind(document_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let mut messages: Vec<ChatMessage> = rows
        .into_iter()
        .map(|r| {
            let role: String = r.get("role");
            let ts: i64 = r.get("created_at");
            ChatMessage {
                role: ChatRole::from_str(&role),
                message: r.get("message"),
                created_at: DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_else(Utc::now),
            }
        })
        .collect();
    messages.reverse();
    Ok(messages)
}

/// Load a whole conversation in chronological order.
pub async fn list_messages(
    pool: &SqlitePool,
    tenant_id: &str,
    document_id: &str,
) -> Result<Vec<ChatMessage>> {
    let rows = sqlx::query(
        "SELECT role, message, created_at FROM chat_messages
         WHERE tenant_id = ? AND document_id = ?
         ORDER BY created_at, id",
    )
    .bind(tenant_id)
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            let role: String = r.get("role");
            let ts: i64 = r.get("created_at");
            ChatMessage {
                role: ChatRole::from_str(&role),
                message: r.get("message"),
                created_at: DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_else(Utc::now),
            }
        })
        .collect())
}

/// Delete every message in a conversation. One statement covers the
/// original's batched per-row delete.
pub async fn delete_chat(pool: &SqlitePool, tenant_id: &str, document_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM chat_messages WHERE tenant_id = ? AND document_id = ?")
        .bind(tenant_id)
        .bind(document_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
