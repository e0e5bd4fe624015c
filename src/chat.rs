//! Conversational orchestrator: rephrase → retrieve → generate.
//!
//! `answer` runs one question through the two-stage protocol:
//!
//! 1. Load the most recent chat messages for the conversation (newest 5,
//!    presented oldest-first).
//! 2. Ask the completion model to rewrite the question as a standalone
//!    query; any failure falls back to the raw question.
//! 3. Retrieve ranked chunks through the gateway. Zero hits trigger the
//!    whole-document fallback: the source is fetched and re-chunked fresh,
//!    bypassing the vector store, so an answer is always attempted.
//! 4. Generate the final answer from `[Source: file, Page N]`-annotated
//!    context, with instructions to answer only from that context and cite
//!    every claim. A generation failure yields a fixed apology string.
//!
//! Only ingestion-stage failures (missing source, unparseable source,
//! exhausted completion retries while ingesting) escape as errors;
//! everything else is absorbed. `ask` wraps `answer` and owns chat-log
//! persistence — the orchestrator itself never writes messages.

use crate::app::App;
use crate::chunk::split_pages;
use crate::completion::complete_with_retry;
use crate::error::PipelineError;
use crate::metadata;
use crate::models::{ChatMessage, ChatRole, DocumentChunk, ScoredChunk};
use crate::parse::parse_pages;
use crate::retriever::{get_retriever, ALL_DOCUMENTS};

/// Returned instead of an error when final generation fails.
pub const APOLOGY: &str = "I'm sorry, I encountered an error while generating a response.";

/// A context passage ready for prompt assembly, whichever path produced it.
pub struct ContextChunk {
    pub text: String,
    pub file_name: String,
    pub page_number: u32,
}

impl From<ScoredChunk> for ContextChunk {
    fn from(c: ScoredChunk) -> Self {
        ContextChunk {
            text: c.metadata.text,
            file_name: c.metadata.file_name,
            page_number: c.metadata.page_number,
        }
    }
}

impl From<DocumentChunk> for ContextChunk {
    fn from(c: DocumentChunk) -> Self {
        ContextChunk {
            text: c.text,
            file_name: c.file_name,
            page_number: c.page_number,
        }
    }
}

fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                ChatRole::Human => "Human",
                ChatRole::Ai => "AI",
            };
            format!("{}: {}", speaker, m.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking the model to rewrite a follow-up question so retrieval
/// does not depend on pronoun or context resolution.
pub fn rephrase_prompt(history: &[ChatMessage], question: &str) -> String {
    format!(
        "Given the following conversation history:\n{}\n\n\
         And the latest user question:\n\"{}\"\n\n\
         Reformulate the question to be standalone and include all necessary \
         context from the conversation history.\n\
         Only output the reformulated question, nothing else.",
        format_history(history),
        question
    )
}

/// Prompt for the final, citation-constrained answer.
pub fn answer_prompt(history: &[ChatMessage], context: &[ContextChunk], question: &str) -> String {
    let context_text = context
        .iter()
        .map(|c| {
            format!(
                "[Source: {}, Page {}]: {}",
                c.file_name, c.page_number, c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an AI assistant answering questions about documents.\n\n\
         Conversation history:\n{}\n\n\
         Context information from the documents:\n{}\n\n\
         Based on the above context and conversation history, answer the \
         following question.\n\n\
         IMPORTANT:\n\
         - You are a knowledge base assistant.\n\
         - Answer using ONLY the context provided above.\n\
         - You must cite your sources for every fact you state.\n\
         - Citations must be in the format [Source: Filename, Page X].\n\
         - If the answer is not in the context, say you don't know.\n\n\
         Question:\n\"{}\"",
        format_history(history),
        context_text,
        question
    )
}

/// Re-fetch and re-chunk the source document, bypassing the vector store.
/// Used when retrieval comes back empty; any failure here degrades to an
/// empty context rather than an error.
async fn whole_document_chunks(app: &App, document_id: &str) -> Vec<DocumentChunk> {
    let result: anyhow::Result<Vec<DocumentChunk>> = async {
        let doc = metadata::get_document(&app.pool, app.namespace(), document_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no document record for {document_id}"))?;
        let bytes = app
            .objects
            .fetch(&doc.storage_path)
            .await?
            .ok_or_else(|| anyhow::anyhow!("object missing at {}", doc.storage_path))?;
        let pages = parse_pages(&bytes, &doc.content_type)?;
        Ok(split_pages(document_id, &doc.name, &pages, &app.config.chunking))
    }
    .await;

    match result {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::warn!(document_id, error = %e, "whole-document fallback failed");
            Vec::new()
        }
    }
}

/// Answer a question about one document (or about every document, with
/// the `ALL` scope). Returns the generated text; the caller persists the
/// exchange.
pub async fn answer(app: &App, document_id: &str, question: &str) -> Result<String, PipelineError> {
    let retriever = get_retriever(app, document_id).await?;

    let history = match metadata::recent_messages(
        &app.pool,
        app.namespace(),
        document_id,
        app.config.retrieval.history_limit,
    )
    .await
    {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load chat history, continuing without it");
            Vec::new()
        }
    };

    let retry = &app.config.gemini;
    let query = match complete_with_retry(
        app.completions.as_ref(),
        &rephrase_prompt(&history, question),
        retry.max_attempts,
        retry.base_delay_ms,
    )
    .await
    {
        Ok(rephrased) if !rephrased.is_empty() => {
            tracing::debug!(original = question, rephrased, "query rephrased");
            rephrased
        }
        Ok(_) => question.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "rephrasing failed, using the raw question");
            question.to_string()
        }
    };

    let retrieved = match retriever.search(&query).await {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::warn!(error = %e, "retrieval failed, falling back to whole document");
            Vec::new()
        }
    };

    let context: Vec<ContextChunk> = if retrieved.is_empty() {
        // Empty retrieval is not an error. For a single document the whole
        // source becomes the context; the cross-document scope has no
        // single source to re-read, so it proceeds with none.
        if document_id == ALL_DOCUMENTS {
            Vec::new()
        } else {
            whole_document_chunks(app, document_id)
                .await
                .into_iter()
                .map(ContextChunk::from)
                .collect()
        }
    } else {
        retrieved.into_iter().map(ContextChunk::from).collect()
    };

    tracing::info!(document_id, context_chunks = context.len(), "generating answer");

    match complete_with_retry(
        app.completions.as_ref(),
        &answer_prompt(&history, &context, &query),
        retry.max_attempts,
        retry.base_delay_ms,
    )
    .await
    {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::error!(error = %e, "answer generation failed");
            Ok(APOLOGY.to_string())
        }
    }
}

/// Ask-and-persist wrapper: records the human question, generates the
/// reply, records the reply. Two rows per successful call.
pub async fn ask(app: &App, document_id: &str, question: &str) -> Result<String, PipelineError> {
    metadata::append_message(
        &app.pool,
        app.namespace(),
        document_id,
        ChatRole::Human,
        question,
    )
    .await
    .map_err(PipelineError::Other)?;

    let reply = answer(app, document_id, question).await?;

    metadata::append_message(&app.pool, app.namespace(), document_id, ChatRole::Ai, &reply)
        .await
        .map_err(PipelineError::Other)?;

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(role: ChatRole, text: &str) -> ChatMessage {
        ChatMessage {
            role,
            message: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn history_is_rendered_in_order_with_speaker_tags() {
        let history = vec![
            msg(ChatRole::Human, "what is chapter 2 about?"),
            msg(ChatRole::Ai, "it covers revenue."),
        ];
        let prompt = rephrase_prompt(&history, "and chapter 3?");

        let human_at = prompt.find("Human: what is chapter 2 about?").unwrap();
        let ai_at = prompt.find("AI: it covers revenue.").unwrap();
        assert!(human_at < ai_at);
        assert!(prompt.contains("\"and chapter 3?\""));
    }

    #[test]
    fn answer_prompt_annotates_context_with_source_and_page() {
        let context = vec![ContextChunk {
            text: "revenue was $5M".to_string(),
            file_name: "report.pdf".to_string(),
            page_number: 2,
        }];
        let prompt = answer_prompt(&[], &context, "what was the revenue?");

        assert!(prompt.contains("[Source: report.pdf, Page 2]: revenue was $5M"));
        assert!(prompt.contains("Answer using ONLY the context provided above."));
        assert!(prompt.contains("say you don't know"));
    }
}
