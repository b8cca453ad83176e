//! An open document: editor plus autosave.

use std::sync::Arc;

use tokio::sync::watch;

use folio_editor::{BlockView, EditEffect, Editor, EditorConfig, EditorEvent};
use folio_store::{DocumentStore, StoreError};
use folio_types::{Block, BlockId, DocumentId, DocumentKind, SessionId};

use crate::autosave::{AutosaveConfig, AutosaveError, AutosaveHandle, SaveState};

/// Errors from [`SyncedEditor::open`].
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Settings for an editing session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub editor: EditorConfig,
    pub autosave: AutosaveConfig,
}

/// A document opened for editing, with changes autosaved behind it.
///
/// Dropping a `SyncedEditor` without [`SyncedEditor::close`] still writes
/// pending changes: the worker notices its last handle is gone and flushes.
#[derive(Debug)]
pub struct SyncedEditor {
    session_id: SessionId,
    document_id: DocumentId,
    kind: DocumentKind,
    title: String,
    editor: Editor,
    autosave: AutosaveHandle,
}

impl SyncedEditor {
    /// Load `id` from `store` and start autosaving it.
    ///
    /// A missing document is [`OpenError::NotFound`] and starts no worker.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        id: DocumentId,
        config: SessionConfig,
    ) -> Result<Self, OpenError> {
        let doc = store
            .get_document(id)
            .await?
            .ok_or(OpenError::NotFound(id))?;

        let session_id = SessionId::new();
        let editor = Editor::new(doc.blocks, config.editor);
        let autosave = AutosaveHandle::spawn(store, id, config.autosave);
        tracing::info!(
            %session_id,
            document_id = %id,
            blocks = editor.blocks().len(),
            "opened document"
        );

        Ok(Self {
            session_id,
            document_id: id,
            kind: doc.kind,
            title: doc.title,
            editor,
            autosave,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        self.editor.blocks()
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn rows(&self) -> Vec<BlockView<'_>> {
        self.editor.rows()
    }

    pub fn take_focus(&mut self) -> Option<BlockId> {
        self.editor.take_focus()
    }

    /// Apply an editor event and hand any block change to autosave.
    ///
    /// Editing never fails because saving does; a dead worker is logged.
    pub fn dispatch(&mut self, event: &EditorEvent) -> EditEffect {
        let effect = self.editor.dispatch(event);
        if effect.is_changed() {
            if let Err(e) = self.autosave.blocks_changed(self.editor.blocks().to_vec()) {
                tracing::warn!(
                    document_id = %self.document_id,
                    error = %e,
                    "change not queued for autosave"
                );
            }
        }
        effect
    }

    /// Rename the document. Saved through the same debounced write as blocks.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if title == self.title {
            return;
        }
        self.title = title;
        if let Err(e) = self.autosave.title_changed(self.title.clone()) {
            tracing::warn!(
                document_id = %self.document_id,
                error = %e,
                "title not queued for autosave"
            );
        }
    }

    pub fn status(&self) -> SaveState {
        self.autosave.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.autosave.subscribe()
    }

    /// Write pending changes now.
    pub async fn flush(&self) -> Result<(), AutosaveError> {
        self.autosave.flush().await
    }

    /// Flush and stop autosave.
    pub async fn close(self) -> Result<(), AutosaveError> {
        tracing::info!(
            session_id = %self.session_id,
            document_id = %self.document_id,
            "closing document"
        );
        self.autosave.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::MemoryStore;
    use folio_types::NewDocument;

    #[tokio::test(start_paused = true)]
    async fn test_open_missing_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let id = DocumentId::new();
        let err = SyncedEditor::open(store, id, SessionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OpenError::NotFound(missing) if missing == id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_loads_document() {
        let store = Arc::new(MemoryStore::new());
        let doc = store
            .create_document(NewDocument::journal("Tuesday"))
            .await
            .unwrap();
        let session = SyncedEditor::open(store.clone(), doc.id, SessionConfig::default())
            .await
            .unwrap();
        assert_eq!(session.title(), "Tuesday");
        assert_eq!(session.kind(), DocumentKind::Journal);
        assert_eq!(session.blocks().len(), 1);
        session.close().await.unwrap();
        assert!(store.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_only_events_do_not_save() {
        let store = Arc::new(MemoryStore::new());
        let doc = store.create_document(NewDocument::note("t")).await.unwrap();
        let mut session = SyncedEditor::open(store.clone(), doc.id, SessionConfig::default())
            .await
            .unwrap();
        let first = session.blocks()[0].id.clone();

        let effect = session.dispatch(&EditorEvent::MenuButton { id: first });
        assert_eq!(effect, EditEffect::StateOnly);
        session.close().await.unwrap();
        assert!(store.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_same_title_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let doc = store.create_document(NewDocument::note("same")).await.unwrap();
        let mut session = SyncedEditor::open(store.clone(), doc.id, SessionConfig::default())
            .await
            .unwrap();
        session.set_title("same");
        assert!(!session.status().pending);
        session.close().await.unwrap();
        assert_eq!(store.title_write_count(), 0);
    }
}
