//! Subcommand implementations.
//!
//! Each takes the store and an output writer so tests can run them against a
//! `MemoryStore` and a `Vec<u8>`.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};

use folio_editor::EditorEvent;
use folio_store::DocumentStore;
use folio_sync::{SessionConfig, SyncedEditor};
use folio_types::{DocumentId, DocumentKind, Mood, NewDocument, resolve_document_prefix};

use crate::render;
use crate::script::{self, Command};

/// Resolve a user-typed id or unique prefix against the store.
pub async fn resolve(store: &dyn DocumentStore, query: &str) -> Result<DocumentId> {
    let ids = store
        .list_documents(None)
        .await?
        .into_iter()
        .map(|s| s.id);
    Ok(resolve_document_prefix(ids, query)?)
}

/// What `folio new` was asked for.
#[derive(Debug, Default)]
pub struct NewOptions {
    pub journal: bool,
    pub title: String,
    pub tags: Vec<String>,
    pub mood: Option<Mood>,
    pub date: Option<NaiveDate>,
}

impl NewOptions {
    /// Journal entries start from the daily template; a given title wins.
    fn into_new_document(self, today: NaiveDate) -> NewDocument {
        if !self.journal {
            return NewDocument::note(self.title).with_tags(self.tags);
        }
        let mut new = NewDocument::journal_for(
            self.date.unwrap_or(today),
            self.mood.unwrap_or_default(),
        );
        if !self.title.is_empty() {
            new.title = self.title;
        }
        new
    }
}

/// Create a document and print its id.
///
/// There is one journal entry per day: asking for a day that already has one
/// prints that entry's id instead.
pub async fn new_document(
    store: &dyn DocumentStore,
    options: NewOptions,
    out: &mut impl Write,
) -> Result<DocumentId> {
    let new = options.into_new_document(Local::now().date_naive());

    if let (DocumentKind::Journal, Some(date)) = (new.kind, new.date) {
        let existing = store
            .list_documents(Some(DocumentKind::Journal))
            .await?
            .into_iter()
            .find(|s| s.date == Some(date));
        if let Some(entry) = existing {
            tracing::info!(document_id = %entry.id, %date, "journal entry exists for day");
            writeln!(out, "{}", entry.id)?;
            return Ok(entry.id);
        }
    }

    let doc = store.create_document(new).await?;
    writeln!(out, "{}", doc.id)?;
    Ok(doc.id)
}

pub async fn list(
    store: &dyn DocumentStore,
    kind: Option<DocumentKind>,
    out: &mut impl Write,
) -> Result<()> {
    let docs = store.list_documents(kind).await?;
    if docs.is_empty() {
        writeln!(out, "no documents")?;
    }
    for summary in &docs {
        writeln!(out, "{}", render::summary(summary))?;
    }
    Ok(())
}

pub async fn show(store: &dyn DocumentStore, query: &str, out: &mut impl Write) -> Result<()> {
    let id = resolve(store, query).await?;
    let doc = store
        .get_document(id)
        .await?
        .with_context(|| format!("document {id} vanished"))?;
    write!(out, "{}", render::document(&doc))?;
    Ok(())
}

pub async fn delete(store: &dyn DocumentStore, query: &str, out: &mut impl Write) -> Result<()> {
    let id = resolve(store, query).await?;
    store.delete_document(id).await?;
    writeln!(out, "deleted {id}")?;
    Ok(())
}

/// Run an editing script against a document, then close the session.
///
/// The session is closed (and pending edits flushed) even when a line fails.
pub async fn edit(
    store: Arc<dyn DocumentStore>,
    query: &str,
    config: SessionConfig,
    script_text: &str,
    out: &mut impl Write,
) -> Result<()> {
    let lines = script::parse(script_text)?;
    let id = resolve(store.as_ref(), query).await?;
    let mut session = SyncedEditor::open(store, id, config).await?;
    tracing::debug!(document_id = %id, lines = lines.len(), "running edit script");

    let outcome = run_script(&mut session, &lines, out).await;
    let closed = session.close().await;

    outcome?;
    closed.context("final save failed")?;
    writeln!(out, "saved")?;
    Ok(())
}

async fn run_script(
    session: &mut SyncedEditor,
    lines: &[script::Line],
    out: &mut impl Write,
) -> Result<()> {
    for line in lines {
        match &line.command {
            Command::Block { position, action } => {
                let Some(id) = script::block_at(session.blocks(), *position) else {
                    bail!(
                        "line {}: no block at position {position} (document has {})",
                        line.number,
                        session.blocks().len()
                    );
                };
                session.dispatch(&action.event(id));
            }
            Command::AddBlock => {
                session.dispatch(&EditorEvent::AddBlock);
            }
            Command::ClickOutside => {
                session.dispatch(&EditorEvent::ClickOutside);
            }
            Command::Title(title) => session.set_title(title.as_str()),
            Command::Wait(duration) => tokio::time::sleep(*duration).await,
            Command::Flush => {
                let result = session.flush().await;
                writeln!(out, "{}", render::status(&session.status()))?;
                result.with_context(|| format!("line {}: flush failed", line.number))?;
            }
            Command::Show => {
                let title = session.title();
                writeln!(out, "{}", if title.is_empty() { "(untitled)" } else { title })?;
                write!(out, "{}", render::rows(&session.rows(), &session.editor().palette()))?;
                writeln!(out, "-- {}", render::status(&session.status()))?;
            }
        }
        // Focus is consumed the way a view would after re-rendering.
        let _ = session.take_focus();
    }
    Ok(())
}
