//! Document storage for Folio.
//!
//! [`DocumentStore`] is the only seam between the editor and persistence. It
//! is deliberately small: fetch by id, overwrite blocks by id, plus the
//! create/list/title/delete calls the note and journal screens need.
//!
//! Backends:
//! - [`MemoryStore`]: ephemeral, instrumented for tests (write log, latency and
//!   failure injection, concurrency tracking).
//! - [`SqliteStore`]: one row per document, blocks as a JSON payload.

mod error;
pub mod memory;
pub mod ops;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, WriteKind, WriteRecord};
pub use ops::{DocumentStore, WriteReceipt};
pub use sqlite::SqliteStore;
