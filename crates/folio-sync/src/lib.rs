//! Autosave for Folio documents.
//!
//! The editor is local and synchronous; persistence is not. This crate sits
//! between them:
//!
//! - [`Debouncer`]: one cancellable deadline on tokio's clock.
//! - [`AutosaveHandle`]: a per-document worker that coalesces changes and
//!   writes the freshest state once input pauses, one write at a time.
//! - [`SyncedEditor`]: an [`folio_editor::Editor`] wired to an autosave worker.
//!
//! Save status is published as a [`SaveState`] on a `watch` channel for
//! whatever renders the save indicator.

pub mod autosave;
pub mod constants;
pub mod debounce;
pub mod session;

pub use autosave::{AutosaveConfig, AutosaveError, AutosaveHandle, SaveState, SaveStatus};
pub use constants::DEFAULT_DEBOUNCE;
pub use debounce::Debouncer;
pub use session::{OpenError, SessionConfig, SyncedEditor};
