//! Document store trait.
//!
//! The store is a dumb keyed container: it persists whatever block sequence
//! it is handed and stamps `updated_at`. It never merges, never checks a
//! version, and never reorders. Last write wins.

use std::cmp::Ordering;

use async_trait::async_trait;

use folio_types::{Block, Document, DocumentId, DocumentKind, DocumentSummary, NewDocument};

use crate::error::StoreResult;

/// Acknowledgement of a successful write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Unix millis stamped by the store. Strictly increases per document.
    pub updated_at: u64,
}

/// Durable storage of documents keyed by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Fetch a document. `Ok(None)` when the id is unknown.
    async fn get_document(&self, id: DocumentId) -> StoreResult<Option<Document>>;

    /// Summaries of all documents, optionally filtered by kind.
    ///
    /// Ordered newest `updated_at` first. A journal listing orders by `date`
    /// first (latest day first, undated last).
    async fn list_documents(
        &self,
        kind: Option<DocumentKind>,
    ) -> StoreResult<Vec<DocumentSummary>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create a document. The store assigns the id and timestamps.
    async fn create_document(&self, new: NewDocument) -> StoreResult<Document>;

    /// Overwrite the block sequence of `id` wholesale.
    ///
    /// `NotFound` if the id is unknown.
    async fn replace_blocks(&self, id: DocumentId, blocks: &[Block]) -> StoreResult<WriteReceipt>;

    /// Overwrite the title of `id`.
    async fn set_title(&self, id: DocumentId, title: &str) -> StoreResult<WriteReceipt>;

    /// Remove a document. `NotFound` if the id is unknown.
    async fn delete_document(&self, id: DocumentId) -> StoreResult<()>;
}

/// Next `updated_at` for a document last stamped at `previous`.
pub(crate) fn next_stamp(previous: u64) -> u64 {
    folio_types::now_millis().max(previous + 1)
}

/// Sort a listing the way [`DocumentStore::list_documents`] promises.
pub(crate) fn sort_listing(docs: &mut [DocumentSummary], kind: Option<DocumentKind>) {
    docs.sort_by(|a, b| {
        let by_day = match kind {
            Some(DocumentKind::Journal) => b.date.cmp(&a.date),
            _ => Ordering::Equal,
        };
        by_day
            .then(b.updated_at.cmp(&a.updated_at))
            .then(b.id.cmp(&a.id))
    });
}
