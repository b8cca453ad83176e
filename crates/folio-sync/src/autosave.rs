//! Debounced autosave worker.
//!
//! Each open document gets one worker task. The editor reports every change
//! through an [`AutosaveHandle`]; the worker coalesces them and writes the
//! freshest state once input has been quiet for the debounce window.
//!
//! ```text
//!   AutosaveHandle (Clone)       mpsc        AutosaveWorker (tokio task)
//!   ┌──────────────────────┐  ─────────▶  ┌──────────────────────────────┐
//!   │ .blocks_changed()    │              │ pending { blocks, title }    │
//!   │ .title_changed()     │              │ Debouncer (one deadline)     │
//!   │ .flush() .shutdown() │  ◀─────────  │ at most one write in flight  │
//!   └──────────────────────┘   oneshot    └──────────────┬───────────────┘
//!              ▲                                         │ spawn
//!              │ watch<SaveState>                        ▼
//!              └──────────────────────────────  store.replace_blocks()
//! ```
//!
//! Rules the worker keeps:
//! - every change re-arms the window, so a burst produces one write;
//! - a write carries the pending state at the moment it starts, never a
//!   snapshot from when the window was armed;
//! - writes are never pipelined: a window that elapses while a write is in
//!   flight queues one follow-up write behind it;
//! - failed writes are not retried. Their content stays pending and rides
//!   along with the next change's write;
//! - when every handle is dropped the worker flushes before exiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use folio_store::DocumentStore;
use folio_types::{Block, DocumentId};

use crate::constants::DEFAULT_DEBOUNCE;
use crate::debounce::Debouncer;

// ============================================================================
// Public types
// ============================================================================

/// Errors surfaced to callers of [`AutosaveHandle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutosaveError {
    /// The most recent write failed.
    #[error("save failed: {0}")]
    Store(String),
    /// The worker is gone.
    #[error("autosave worker shut down")]
    Shutdown,
}

/// Coarse save status for a save indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    /// The last write succeeded (or nothing was ever written).
    #[default]
    Saved,
    /// A write is in flight.
    Saving,
    /// The last write failed.
    Error,
}

/// Snapshot published on every status change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveState {
    pub status: SaveStatus,
    /// Changes exist that no successful write has covered yet.
    pub pending: bool,
    /// `updated_at` of the last successful write.
    pub last_saved_at: Option<u64>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    pub debounce: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

// ============================================================================
// Commands (internal)
// ============================================================================

enum AutosaveCommand {
    Blocks(Vec<Block>),
    Title(String),
    Flush {
        reply: oneshot::Sender<Result<(), AutosaveError>>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<(), AutosaveError>>,
    },
}

/// Not-yet-written state. `None` fields have nothing new.
#[derive(Debug, Default)]
struct Pending {
    blocks: Option<Vec<Block>>,
    title: Option<String>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.blocks.is_none() && self.title.is_none()
    }

    /// Put back the content of a failed write, unless newer content arrived.
    fn restore(&mut self, failed: Pending) {
        if self.blocks.is_none() {
            self.blocks = failed.blocks;
        }
        if self.title.is_none() {
            self.title = failed.title;
        }
    }
}

/// Result of one write task.
struct WriteOutcome {
    result: Result<u64, String>,
    /// What was attempted, kept so a failure can be folded back into pending.
    payload: Pending,
}

// ============================================================================
// Handle
// ============================================================================

/// Cheap, cloneable handle to a document's autosave worker.
///
/// The worker runs until [`AutosaveHandle::shutdown`] is called or every
/// handle is dropped; either way pending changes are written first.
#[derive(Clone)]
pub struct AutosaveHandle {
    document_id: DocumentId,
    tx: mpsc::UnboundedSender<AutosaveCommand>,
    state: watch::Receiver<SaveState>,
}

impl std::fmt::Debug for AutosaveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveHandle")
            .field("document_id", &self.document_id)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl AutosaveHandle {
    /// Spawn a worker for `document_id` on the current tokio runtime.
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        document_id: DocumentId,
        config: AutosaveConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SaveState::default());
        let worker = AutosaveWorker {
            store,
            document_id,
            rx,
            state_tx,
            pending: Pending::default(),
            debouncer: Debouncer::new(config.debounce),
            in_flight: None,
            queued: false,
            waiters: Vec::new(),
        };
        tokio::spawn(worker.run());
        tracing::debug!(
            %document_id,
            debounce_ms = config.debounce.as_millis() as u64,
            "autosave started"
        );
        Self {
            document_id,
            tx,
            state,
        }
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    /// Report the full current block sequence.
    pub fn blocks_changed(&self, blocks: Vec<Block>) -> Result<(), AutosaveError> {
        self.tx
            .send(AutosaveCommand::Blocks(blocks))
            .map_err(|_| AutosaveError::Shutdown)
    }

    /// Report the current title.
    pub fn title_changed(&self, title: impl Into<String>) -> Result<(), AutosaveError> {
        self.tx
            .send(AutosaveCommand::Title(title.into()))
            .map_err(|_| AutosaveError::Shutdown)
    }

    /// Write pending changes now and wait for the write.
    ///
    /// Returns the error of that write if it failed.
    pub async fn flush(&self) -> Result<(), AutosaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AutosaveCommand::Flush { reply })
            .map_err(|_| AutosaveError::Shutdown)?;
        rx.await.map_err(|_| AutosaveError::Shutdown)?
    }

    /// Flush, then stop the worker. Other clones become inert.
    pub async fn shutdown(self) -> Result<(), AutosaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AutosaveCommand::Shutdown { reply })
            .map_err(|_| AutosaveError::Shutdown)?;
        rx.await.map_err(|_| AutosaveError::Shutdown)?
    }

    /// Current save state.
    pub fn status(&self) -> SaveState {
        self.state.borrow().clone()
    }

    /// Watch save state changes. The channel closes when the worker exits.
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.state.clone()
    }
}

// ============================================================================
// Worker
// ============================================================================

struct AutosaveWorker {
    store: Arc<dyn DocumentStore>,
    document_id: DocumentId,
    rx: mpsc::UnboundedReceiver<AutosaveCommand>,
    state_tx: watch::Sender<SaveState>,
    pending: Pending,
    debouncer: Debouncer,
    in_flight: Option<JoinHandle<WriteOutcome>>,
    /// A write is due but waits for the in-flight one to finish.
    queued: bool,
    /// Flush callers waiting for the forced write to land.
    waiters: Vec<oneshot::Sender<Result<(), AutosaveError>>>,
}

impl AutosaveWorker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(AutosaveCommand::Shutdown { reply }) => {
                        let result = self.drain().await;
                        let _ = reply.send(result);
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        if let Err(e) = self.drain().await {
                            tracing::warn!(
                                document_id = %self.document_id,
                                error = %e,
                                "final autosave failed"
                            );
                        }
                        break;
                    }
                },
                _ = self.debouncer.fired() => {
                    self.debouncer.cancel();
                    tracing::debug!(document_id = %self.document_id, "debounce window elapsed");
                    self.write_due();
                }
                outcome = join_in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.finish(outcome);
                }
            }
        }
        tracing::debug!(document_id = %self.document_id, "autosave stopped");
    }

    fn handle_command(&mut self, cmd: AutosaveCommand) {
        match cmd {
            AutosaveCommand::Blocks(blocks) => {
                self.pending.blocks = Some(blocks);
                self.touched();
            }
            AutosaveCommand::Title(title) => {
                self.pending.title = Some(title);
                self.touched();
            }
            AutosaveCommand::Flush { reply } => {
                if self.pending.is_empty() && self.in_flight.is_none() {
                    let _ = reply.send(self.last_result());
                    return;
                }
                self.debouncer.cancel();
                self.waiters.push(reply);
                self.write_due();
            }
            // Handled in run(): it needs to await.
            AutosaveCommand::Shutdown { reply } => {
                let _ = reply.send(Err(AutosaveError::Shutdown));
            }
        }
    }

    /// A change arrived: restart the quiet window.
    fn touched(&mut self) {
        let deadline = self.debouncer.arm();
        tracing::trace!(document_id = %self.document_id, ?deadline, "write scheduled");
        self.publish(|s| s.pending = true);
    }

    /// Write now, or queue behind the write in flight.
    fn write_due(&mut self) {
        if self.in_flight.is_some() {
            self.queued = true;
            return;
        }
        self.start_write();
    }

    fn start_write(&mut self) {
        self.queued = false;
        let payload = std::mem::take(&mut self.pending);
        if payload.is_empty() {
            self.answer_waiters();
            return;
        }

        let store = Arc::clone(&self.store);
        let id = self.document_id;
        tracing::debug!(
            document_id = %id,
            blocks = payload.blocks.as_ref().map(Vec::len),
            title = payload.title.is_some(),
            "autosave write started"
        );
        self.in_flight = Some(tokio::spawn(write_payload(store, id, payload)));
        self.publish(|s| s.status = SaveStatus::Saving);
    }

    fn finish(&mut self, outcome: WriteOutcome) {
        match outcome.result {
            Ok(updated_at) => {
                tracing::info!(document_id = %self.document_id, updated_at, "autosaved");
                let pending = !self.pending.is_empty();
                self.publish(|s| {
                    s.status = SaveStatus::Saved;
                    s.pending = pending;
                    s.last_saved_at = Some(updated_at);
                    s.last_error = None;
                });
            }
            Err(message) => {
                tracing::warn!(
                    document_id = %self.document_id,
                    error = %message,
                    "autosave failed"
                );
                self.pending.restore(outcome.payload);
                self.publish(|s| {
                    s.status = SaveStatus::Error;
                    s.pending = true;
                    s.last_error = Some(message);
                });
            }
        }

        if self.queued {
            self.start_write();
        } else {
            self.answer_waiters();
        }
    }

    /// Write everything still pending and wait for it.
    async fn drain(&mut self) -> Result<(), AutosaveError> {
        self.debouncer.cancel();
        if let Some(handle) = self.in_flight.take() {
            let outcome = await_write(handle).await;
            self.queued = false;
            self.finish(outcome);
        }
        if !self.pending.is_empty() {
            self.start_write();
            if let Some(handle) = self.in_flight.take() {
                let outcome = await_write(handle).await;
                self.finish(outcome);
            }
        }
        self.answer_waiters();
        self.last_result()
    }

    fn last_result(&self) -> Result<(), AutosaveError> {
        let state = self.state_tx.borrow();
        match (&state.status, &state.last_error) {
            (SaveStatus::Error, Some(message)) => Err(AutosaveError::Store(message.clone())),
            _ => Ok(()),
        }
    }

    fn answer_waiters(&mut self) {
        if self.waiters.is_empty() {
            return;
        }
        let result = self.last_result();
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
    }

    fn publish(&self, update: impl FnOnce(&mut SaveState)) {
        self.state_tx.send_modify(update);
    }
}

/// Resolve with the in-flight write's outcome; pending forever when idle.
async fn join_in_flight(in_flight: &mut Option<JoinHandle<WriteOutcome>>) -> WriteOutcome {
    match in_flight {
        Some(handle) => joined(handle.await),
        None => std::future::pending().await,
    }
}

async fn await_write(handle: JoinHandle<WriteOutcome>) -> WriteOutcome {
    joined(handle.await)
}

fn joined(result: Result<WriteOutcome, tokio::task::JoinError>) -> WriteOutcome {
    result.unwrap_or_else(|e| WriteOutcome {
        result: Err(format!("write task failed: {e}")),
        payload: Pending::default(),
    })
}

/// One store round trip: blocks first, then title.
async fn write_payload(
    store: Arc<dyn DocumentStore>,
    id: DocumentId,
    payload: Pending,
) -> WriteOutcome {
    let mut updated_at = None;

    if let Some(blocks) = &payload.blocks {
        match store.replace_blocks(id, blocks).await {
            Ok(receipt) => updated_at = Some(receipt.updated_at),
            Err(e) => {
                return WriteOutcome {
                    result: Err(e.to_string()),
                    payload,
                };
            }
        }
    }

    if let Some(title) = &payload.title {
        match store.set_title(id, title).await {
            Ok(receipt) => updated_at = Some(receipt.updated_at),
            Err(e) => {
                // Blocks landed; only the title goes back to pending.
                let payload = Pending {
                    blocks: None,
                    title: payload.title,
                };
                return WriteOutcome {
                    result: Err(e.to_string()),
                    payload,
                };
            }
        }
    }

    WriteOutcome {
        result: Ok(updated_at.unwrap_or_default()),
        payload: Pending::default(),
    }
}
