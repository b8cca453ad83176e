//! SQLite document store.
//!
//! One row per document. The block sequence is stored as an opaque JSON
//! payload and replaced wholesale on every write. Tags are a JSON array;
//! journal dates are `YYYY-MM-DD` text, so they sort as dates.
//!
//! rusqlite is synchronous. Every call runs on the blocking pool via
//! `tokio::task::spawn_blocking` so a slow disk never stalls the runtime.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

use folio_types::{
    Block, Document, DocumentId, DocumentKind, DocumentSummary, Mood, NewDocument,
};

use crate::error::{StoreError, StoreResult};
use crate::ops::{DocumentStore, WriteReceipt};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    blocks TEXT NOT NULL,
    block_count INTEGER NOT NULL DEFAULT 0,
    tags TEXT NOT NULL DEFAULT '[]',
    mood TEXT,
    date TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(kind, updated_at DESC);
CREATE INDEX IF NOT EXISTS idx_documents_date ON documents(kind, date DESC);
"#;

const COLUMNS: &str =
    "id, kind, title, block_count, tags, mood, date, created_at, updated_at";

/// Stamp strictly after the previous one, even within the same millisecond.
const STAMP_SQL: &str = "MAX(?2, updated_at + 1)";

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::info!(path = %path.display(), "opened document store");
        Ok(Self::wrap(conn))
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| StoreError::Unavailable(format!("spawn_blocking: {e}")))?
    }

    /// Update one column set and stamp `updated_at`, returning the new stamp.
    async fn stamp<V>(
        &self,
        sql_set: String,
        id: DocumentId,
        value: V,
    ) -> StoreResult<WriteReceipt>
    where
        V: rusqlite::ToSql + Send + 'static,
    {
        let sql = format!(
            "UPDATE documents SET {sql_set}, updated_at = {STAMP_SQL} \
             WHERE id = ?3 RETURNING updated_at"
        );
        let now = folio_types::now_millis() as i64;
        let updated_at: Option<i64> = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(&sql, params![value, now, id.to_string()], |row| row.get(0))
                    .optional()?)
            })
            .await?;

        updated_at
            .map(|ts| WriteReceipt {
                updated_at: ts as u64,
            })
            .ok_or(StoreError::NotFound(id))
    }
}

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_id(raw: &str) -> rusqlite::Result<DocumentId> {
    DocumentId::parse(raw).map_err(|e| conversion_error(0, e))
}

fn parse_kind(raw: &str) -> DocumentKind {
    raw.parse().unwrap_or_default()
}

/// Unknown moods read as none rather than failing the row.
fn parse_mood(raw: Option<String>) -> Option<Mood> {
    raw.and_then(|m| m.parse().ok())
}

fn parse_date(raw: Option<String>, column: usize) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|d| d.parse::<NaiveDate>().map_err(|e| conversion_error(column, e)))
        .transpose()
}

fn parse_tags(raw: &str, column: usize) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| conversion_error(column, e))
}

/// Row in [`COLUMNS`] order.
fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentSummary> {
    let id: String = row.get(0)?;
    let kind: String = row.get(1)?;
    let tags: String = row.get(4)?;
    Ok(DocumentSummary {
        id: parse_id(&id)?,
        kind: parse_kind(&kind),
        title: row.get(2)?,
        block_count: row.get::<_, i64>(3)? as usize,
        tags: parse_tags(&tags, 4)?,
        mood: parse_mood(row.get(5)?),
        date: parse_date(row.get(6)?, 6)?,
        created_at: row.get::<_, i64>(7)? as u64,
        updated_at: row.get::<_, i64>(8)? as u64,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get_document(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {COLUMNS}, blocks FROM documents WHERE id = ?1"),
                    params![id.to_string()],
                    |row| Ok((summary_from_row(row)?, row.get::<_, String>(9)?)),
                )
                .optional()?;

            let Some((summary, blocks)) = row else {
                return Ok(None);
            };
            let blocks: Vec<Block> = serde_json::from_str(&blocks)?;
            Ok(Some(Document {
                id: summary.id,
                kind: summary.kind,
                title: summary.title,
                blocks,
                tags: summary.tags,
                mood: summary.mood,
                date: summary.date,
                created_at: summary.created_at,
                updated_at: summary.updated_at,
            }))
        })
        .await
    }

    async fn list_documents(
        &self,
        kind: Option<DocumentKind>,
    ) -> StoreResult<Vec<DocumentSummary>> {
        self.with_conn(move |conn| {
            // NULL dates sort last under DESC.
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM documents
                 WHERE ?1 IS NULL OR kind = ?1
                 ORDER BY CASE WHEN ?1 = 'journal' THEN date END DESC,
                          updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![kind.map(|k| k.as_str())], summary_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn create_document(&self, new: NewDocument) -> StoreResult<Document> {
        let doc = new.into_document(DocumentId::new(), folio_types::now_millis());
        let payload = serde_json::to_string(&doc.blocks)?;
        let tags = serde_json::to_string(&doc.tags)?;
        let row = doc.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO documents (id, kind, title, blocks, block_count,
                                        tags, mood, date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.id.to_string(),
                    row.kind.as_str(),
                    row.title,
                    payload,
                    row.blocks.len() as i64,
                    tags,
                    row.mood.map(|m| m.as_str()),
                    row.date.map(|d| d.to_string()),
                    row.created_at as i64,
                    row.updated_at as i64,
                ],
            )?;
            Ok(())
        })
        .await?;
        tracing::info!(id = %doc.id, kind = %doc.kind, "created document");
        Ok(doc)
    }

    async fn replace_blocks(
        &self,
        id: DocumentId,
        blocks: &[Block],
    ) -> StoreResult<WriteReceipt> {
        let payload = serde_json::to_string(blocks)?;
        let sql_set = format!("blocks = ?1, block_count = {}", blocks.len());
        let receipt = self.stamp(sql_set, id, payload).await?;
        tracing::debug!(
            %id,
            blocks = blocks.len(),
            updated_at = receipt.updated_at,
            "replaced blocks"
        );
        Ok(receipt)
    }

    async fn set_title(&self, id: DocumentId, title: &str) -> StoreResult<WriteReceipt> {
        self.stamp("title = ?1".to_string(), id, title.to_string()).await
    }

    async fn delete_document(&self, id: DocumentId) -> StoreResult<()> {
        let removed = self
            .with_conn(move |conn| {
                Ok(conn.execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])?)
            })
            .await?;
        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }
        tracing::info!(%id, "deleted document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::BlockKind;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_document_crud() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = store.create_document(NewDocument::journal("Day one")).await.unwrap();

        let fetched = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
        assert_eq!(fetched.kind, DocumentKind::Journal);

        let blocks = vec![
            Block::new("h".into(), BlockKind::Heading1).with_content("Morning"),
            Block::new("t".into(), BlockKind::Toggle)
                .with_content("Dreams")
                .with_children("flying"),
        ];
        let receipt = store.replace_blocks(doc.id, &blocks).await.unwrap();
        assert!(receipt.updated_at > doc.updated_at);

        let fetched = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.blocks, blocks);
        assert_eq!(fetched.updated_at, receipt.updated_at);

        store.set_title(doc.id, "Day 1").await.unwrap();
        let fetched = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Day 1");

        store.delete_document(doc.id).await.unwrap();
        assert!(store.get_document(doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_document_errors() {
        let store = SqliteStore::in_memory().unwrap();
        let id = DocumentId::new();
        assert!(store.get_document(id).await.unwrap().is_none());
        assert!(matches!(
            store.replace_blocks(id, &[]).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.set_title(id, "x").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_document(id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stamps_strictly_increase() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = store.create_document(NewDocument::note("t")).await.unwrap();
        let mut last = doc.updated_at;
        for i in 0..5 {
            let r = store
                .replace_blocks(doc.id, &[Block::paragraph("b1", i.to_string())])
                .await
                .unwrap();
            assert!(r.updated_at > last);
            last = r.updated_at;
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.create_document(NewDocument::note("a")).await.unwrap();
        let _b = store.create_document(NewDocument::journal("b")).await.unwrap();
        let c = store.create_document(NewDocument::note("c")).await.unwrap();
        // Bump `a` past everything else.
        for _ in 0..3 {
            store.set_title(a.id, "a!").await.unwrap();
        }
        let a_stamp = store.get_document(a.id).await.unwrap().unwrap().updated_at;
        let c_stamp = store.get_document(c.id).await.unwrap().unwrap().updated_at;
        assert!(a_stamp > c_stamp);

        let notes = store.list_documents(Some(DocumentKind::Note)).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, a.id);
        assert_eq!(notes[0].title, "a!");
        assert_eq!(notes[1].id, c.id);

        assert_eq!(store.list_documents(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_metadata_persists() {
        let store = SqliteStore::in_memory().unwrap();
        let note = store
            .create_document(NewDocument::note("n").with_tags(["rust", "ideas"]))
            .await
            .unwrap();
        let entry = store
            .create_document(NewDocument::journal_for(day("2024-02-29"), Mood::Tough))
            .await
            .unwrap();

        let note = store.get_document(note.id).await.unwrap().unwrap();
        assert_eq!(note.tags, ["rust", "ideas"]);
        assert_eq!(note.mood, None);
        assert_eq!(note.date, None);

        let entry = store.get_document(entry.id).await.unwrap().unwrap();
        assert_eq!(entry.mood, Some(Mood::Tough));
        assert_eq!(entry.date, Some(day("2024-02-29")));
        assert_eq!(entry.blocks.len(), 6);
    }

    #[tokio::test]
    async fn test_journal_listing_is_by_day() {
        let store = SqliteStore::in_memory().unwrap();
        let newer = store
            .create_document(NewDocument::journal("newer").with_date(day("2024-06-02")))
            .await
            .unwrap();
        let older = store
            .create_document(NewDocument::journal("older").with_date(day("2024-06-01")))
            .await
            .unwrap();
        store.set_title(older.id, "older, edited").await.unwrap();

        let journals = store.list_documents(Some(DocumentKind::Journal)).await.unwrap();
        let ids: Vec<_> = journals.iter().map(|s| s.id).collect();
        assert_eq!(ids, [newer.id, older.id]);
        assert_eq!(journals[0].date, Some(day("2024-06-02")));

        // Unfiltered listings stay most-recently-edited first.
        let all = store.list_documents(None).await.unwrap();
        assert_eq!(all[0].id, older.id);
    }

    #[tokio::test]
    async fn test_unknown_block_fields_survive_storage() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = store.create_document(NewDocument::note("t")).await.unwrap();
        let stored = json!({"id": "b1", "type": "callout", "content": "c", "emoji": "💡"});
        let block: Block = serde_json::from_value(stored).unwrap();
        store.replace_blocks(doc.id, &[block.clone()]).await.unwrap();

        let fetched = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.blocks[0].extra.get("emoji"), Some(&json!("💡")));
    }

    #[tokio::test]
    async fn test_unknown_block_kind_survives_storage() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = store.create_document(NewDocument::note("t")).await.unwrap();
        let block: Block =
            serde_json::from_value(json!({"id": "b1", "type": "quote", "content": "q"})).unwrap();
        store.replace_blocks(doc.id, &[block]).await.unwrap();

        let fetched = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.blocks[0].unknown_kind(), Some("quote"));
        assert_eq!(serde_json::to_value(&fetched.blocks[0]).unwrap()["type"], "quote");
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            let doc = store.create_document(NewDocument::note("kept")).await.unwrap();
            store
                .replace_blocks(doc.id, &[Block::paragraph("b1", "still here")])
                .await
                .unwrap();
            doc.id
        };

        let store = SqliteStore::open(&path).unwrap();
        let doc = store.get_document(id).await.unwrap().unwrap();
        assert_eq!(doc.title, "kept");
        assert_eq!(doc.blocks[0].content, "still here");
    }
}
