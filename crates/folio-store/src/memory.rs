//! In-memory document store.
//!
//! Ephemeral, and instrumented for tests: every write is logged with the
//! (tokio) instant it landed, writes can be slowed or made to fail, and the
//! peak number of concurrent writes is tracked so callers can assert that
//! writes were never pipelined.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use folio_types::{Block, Document, DocumentId, DocumentKind, DocumentSummary, NewDocument};

use crate::error::{StoreError, StoreResult};
use crate::ops::{DocumentStore, WriteReceipt, next_stamp, sort_listing};

/// What a logged write changed.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteKind {
    Blocks(Vec<Block>),
    Title(String),
}

/// One write as the store saw it.
#[derive(Clone, Debug)]
pub struct WriteRecord {
    pub id: DocumentId,
    pub kind: WriteKind,
    /// When the write was accepted (after any injected latency).
    pub at: Instant,
}

impl WriteRecord {
    /// The block payload, for block writes.
    pub fn blocks(&self) -> Option<&[Block]> {
        match &self.kind {
            WriteKind::Blocks(blocks) => Some(blocks),
            WriteKind::Title(_) => None,
        }
    }
}

/// In-memory store.
///
/// Thread-safe via internal locks. All data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<DocumentId, Document>>,
    log: Mutex<Vec<WriteRecord>>,
    latency: Mutex<Duration>,
    fail_next: AtomicUsize,
    unavailable: Mutex<Option<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document as-is, bypassing normalization and stamps.
    pub fn insert(&self, doc: Document) {
        self.docs.write().insert(doc.id, doc);
    }

    // ── Fault injection ─────────────────────────────────────────────────

    /// Delay every write by `latency` (tokio time, so paused tests advance it).
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Make the next `n` writes fail with `Unavailable`.
    pub fn fail_next_writes(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Make every write fail until [`Self::set_available`] is called.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        *self.unavailable.lock() = Some(reason.into());
    }

    pub fn set_available(&self) {
        *self.unavailable.lock() = None;
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// Every accepted write, in order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.log.lock().clone()
    }

    /// Number of accepted block writes.
    pub fn block_write_count(&self) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|w| matches!(w.kind, WriteKind::Blocks(_)))
            .count()
    }

    /// Number of accepted title writes.
    pub fn title_write_count(&self) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|w| matches!(w.kind, WriteKind::Title(_)))
            .count()
    }

    /// Highest number of writes that were ever in progress at once.
    pub fn peak_concurrent_writes(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Current stored blocks of `id`, if present.
    pub fn blocks_of(&self, id: DocumentId) -> Option<Vec<Block>> {
        self.docs.read().get(&id).map(|d| d.blocks.clone())
    }

    /// Run one write through latency and failure injection.
    async fn write(
        &self,
        id: DocumentId,
        kind: WriteKind,
        apply: impl FnOnce(&mut Document),
    ) -> StoreResult<WriteReceipt> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let result = self.write_now(id, kind, apply);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Apply and stamp under one lock, so the receipt is this write's stamp.
    fn write_now(
        &self,
        id: DocumentId,
        kind: WriteKind,
        apply: impl FnOnce(&mut Document),
    ) -> StoreResult<WriteReceipt> {
        if let Some(reason) = self.unavailable.lock().clone() {
            return Err(StoreError::Unavailable(reason));
        }
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }

        let mut docs = self.docs.write();
        let doc = docs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply(doc);
        doc.updated_at = next_stamp(doc.updated_at);
        let receipt = WriteReceipt {
            updated_at: doc.updated_at,
        };

        self.log.lock().push(WriteRecord {
            id,
            kind,
            at: Instant::now(),
        });
        Ok(receipt)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.docs.read().get(&id).cloned())
    }

    async fn list_documents(
        &self,
        kind: Option<DocumentKind>,
    ) -> StoreResult<Vec<DocumentSummary>> {
        let mut out: Vec<DocumentSummary> = self
            .docs
            .read()
            .values()
            .filter(|d| kind.is_none_or(|k| d.kind == k))
            .map(Document::summary)
            .collect();
        sort_listing(&mut out, kind);
        Ok(out)
    }

    async fn create_document(&self, new: NewDocument) -> StoreResult<Document> {
        let doc = new.into_document(DocumentId::new(), folio_types::now_millis());
        self.docs.write().insert(doc.id, doc.clone());
        tracing::debug!(id = %doc.id, kind = %doc.kind, "created document (memory)");
        Ok(doc)
    }

    async fn replace_blocks(&self, id: DocumentId, blocks: &[Block]) -> StoreResult<WriteReceipt> {
        let payload = blocks.to_vec();
        self.write(id, WriteKind::Blocks(payload.clone()), move |doc| {
            doc.blocks = payload;
        })
        .await
    }

    async fn set_title(&self, id: DocumentId, title: &str) -> StoreResult<WriteReceipt> {
        let title = title.to_string();
        self.write(id, WriteKind::Title(title.clone()), move |doc| {
            doc.title = title;
        })
        .await
    }

    async fn delete_document(&self, id: DocumentId) -> StoreResult<()> {
        self.docs
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
