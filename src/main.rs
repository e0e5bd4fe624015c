//! # askdoc CLI
//!
//! Command-line interface for the askdoc pipeline.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `askdoc init` | Create the SQLite database and run schema migrations |
//! | `askdoc add <file>` | Upload a file and register it as a document |
//! | `askdoc documents` | List registered documents |
//! | `askdoc ingest <doc-id>` | Chunk, embed, and index a document |
//! | `askdoc ask <doc-id> "<q>"` | Ask a question (use `ALL` to span every document) |
//! | `askdoc history <doc-id>` | Print the stored conversation |
//! | `askdoc delete <doc-id>` | Delete a document everywhere |
//!
//! All commands accept `--config` pointing to a TOML configuration file;
//! see `config/askdoc.example.toml`.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use askdoc::app::App;
use askdoc::chat;
use askdoc::config::Config;
use askdoc::db;
use askdoc::delete;
use askdoc::ingest;
use askdoc::metadata;
use askdoc::models::{ChatRole, Document};
use askdoc::parse;

#[derive(Parser)]
#[command(name = "askdoc", about = "Ask questions about your documents", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "askdoc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and run schema migrations.
    Init,
    /// Upload a file into object storage and register it.
    Add {
        /// Path to the file to upload.
        file: PathBuf,
        /// Display name; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
    },
    /// List registered documents.
    Documents,
    /// Chunk, embed, and index a document.
    Ingest { document_id: String },
    /// Ask a question about a document (or `ALL` for every document).
    Ask {
        document_id: String,
        question: String,
    },
    /// Print the conversation stored for a document.
    History { document_id: String },
    /// Delete a document from storage, metadata, chat, and the index.
    Delete { document_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("askdoc=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Init => {
            let pool = db::connect(&config.db.path).await?;
            db::run_migrations(&pool).await?;
            println!("Initialized database at {}", config.db.path.display());
        }
        Command::Add { file, name } => {
            let app = App::bootstrap(config).await?;
            let doc = add_document(&app, &file, name).await?;
            println!("Added {} ({})", doc.name, doc.id);
        }
        Command::Documents => {
            let app = App::bootstrap(config).await?;
            let docs = metadata::list_documents(&app.pool, app.namespace()).await?;
            if docs.is_empty() {
                println!("No documents.");
            }
            for d in docs {
                println!("{}  {}  {} bytes", d.id, d.name, d.size);
            }
        }
        Command::Ingest { document_id } => {
            let app = App::bootstrap(config).await?;
            let summary = ingest::ingest_document(&app, &document_id).await?;
            println!(
                "Indexed {} of {} chunks ({} dropped)",
                summary.indexed, summary.chunks, summary.dropped
            );
        }
        Command::Ask {
            document_id,
            question,
        } => {
            let app = App::bootstrap(config).await?;
            let reply = chat::ask(&app, &document_id, &question).await?;
            println!("{reply}");
        }
        Command::History { document_id } => {
            let app = App::bootstrap(config).await?;
            let messages =
                metadata::list_messages(&app.pool, app.namespace(), &document_id).await?;
            if messages.is_empty() {
                println!("No messages.");
            }
            for m in messages {
                let speaker = match m.role {
                    ChatRole::Human => "you",
                    ChatRole::Ai => "askdoc",
                };
                println!("[{}] {}: {}", m.created_at.format("%Y-%m-%d %H:%M"), speaker, m.message);
            }
        }
        Command::Delete { document_id } => {
            let app = App::bootstrap(config).await?;
            delete::delete_document(&app, &document_id).await?;
            println!("Deleted {document_id}");
        }
    }

    Ok(())
}

async fn add_document(app: &App, file: &PathBuf, name: Option<String>) -> Result<Document> {
    let bytes = std::fs::read(file)?;
    let file_name = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    });

    let content_type = match file.extension().and_then(|e| e.to_str()) {
        Some("pdf") => parse::MIME_PDF,
        Some("md") => parse::MIME_MARKDOWN,
        Some("txt") | None => parse::MIME_TEXT,
        Some(other) => bail!("unsupported file extension: .{other}"),
    };

    let id = Uuid::new_v4().to_string();
    let storage_path = format!("{}/{}", app.namespace(), id);
    app.objects.put(&storage_path, &bytes).await?;

    let doc = Document {
        id,
        name: file_name,
        storage_path,
        content_type: content_type.to_string(),
        size: bytes.len() as i64,
        created_at: chrono::Utc::now().timestamp(),
    };
    metadata::insert_document(&app.pool, app.namespace(), &doc).await?;
    Ok(doc)
}
