//! Persistent news archive
//!
//! The archive is a keyed store with insert-if-absent semantics: an entry
//! is written once per identifier and never updated or deleted.
//! [`SqliteArchive`] opens a fresh connection for every operation and
//! re-applies the schema each time, so no handle outlives a call.
//! [`MemoryArchive`] backs tests and dry experiments.

pub mod gate;
pub mod ledger;

pub use gate::{DedupGate, GateOutcome};
pub use ledger::LedgerWriter;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{ArchiveEntry, NewsRecord};
use crate::parser::datetime::{normalize_datetime, to_iso_seconds};
use crate::utils::error::PersistenceError;

/// Archive store consumed by the dedup gate
pub trait ArchiveStore: Send + Sync {
    /// True when an entry with `identifier` is stored
    fn exists(&self, identifier: &str) -> Result<bool, PersistenceError>;

    /// Insert every entry whose identifier is not yet stored
    ///
    /// All-or-nothing: either the whole batch is recorded or nothing is.
    /// Returns the number of entries actually inserted.
    fn insert_if_absent(&self, batch: &[ArchiveEntry]) -> Result<usize, PersistenceError>;

    /// Stored entries, newest `published` first
    fn list(&self, limit: Option<usize>) -> Result<Vec<ArchiveEntry>, PersistenceError>;

    /// Identifier of the newest stored entry
    fn latest_identifier(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .list(Some(1))?
            .into_iter()
            .next()
            .map(|entry| entry.record.identifier))
    }
}

/// Thread-safe shared archive
pub type SharedArchive = Arc<dyn ArchiveStore>;

// ============================================================================
// SQLite Implementation
// ============================================================================

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=NORMAL;

    CREATE TABLE IF NOT EXISTS news (
        identifier TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        summary TEXT,
        published TEXT NOT NULL,
        retrieved_at TEXT NOT NULL,
        raw_json TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_news_published
        ON news(published);
"#;

/// SQLite archive
///
/// `published` and `retrieved_at` are stored as second-precision ISO
/// strings, so text order is chronological order.
#[derive(Debug, Clone)]
pub struct SqliteArchive {
    path: PathBuf,
}

impl SqliteArchive {
    /// Open (creating if needed) the archive at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let archive = Self {
            path: path.as_ref().to_path_buf(),
        };
        archive.connect()?;

        tracing::info!(path = %archive.path.display(), "SQLite archive initialized");
        Ok(archive)
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&self.path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

impl ArchiveStore for SqliteArchive {
    fn exists(&self, identifier: &str) -> Result<bool, PersistenceError> {
        let conn = self.connect()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM news WHERE identifier = ?1",
                params![identifier],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_if_absent(&self, batch: &[ArchiveEntry]) -> Result<usize, PersistenceError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO news
                    (identifier, title, url, summary, published, retrieved_at, raw_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for entry in batch {
                let raw_json = entry
                    .raw_context
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;

                inserted += stmt.execute(params![
                    entry.record.identifier,
                    entry.record.title,
                    entry.record.url,
                    entry.record.summary,
                    to_iso_seconds(&entry.record.published),
                    to_iso_seconds(&entry.retrieved_at),
                    raw_json,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            batch = batch.len(),
            inserted,
            "Archive batch committed"
        );
        Ok(inserted)
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<ArchiveEntry>, PersistenceError> {
        let conn = self.connect()?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let mut stmt = conn.prepare(
            "SELECT identifier, title, url, summary, published, retrieved_at, raw_json
             FROM news
             ORDER BY published DESC, identifier ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(StoredRow {
                identifier: row.get(0)?,
                title: row.get(1)?,
                url: row.get(2)?,
                summary: row.get(3)?,
                published: row.get(4)?,
                retrieved_at: row.get(5)?,
                raw_json: row.get(6)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }

    fn latest_identifier(&self) -> Result<Option<String>, PersistenceError> {
        let conn = self.connect()?;
        let identifier = conn
            .query_row(
                "SELECT identifier FROM news ORDER BY published DESC, identifier ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(identifier)
    }
}

/// Raw column values of one `news` row
struct StoredRow {
    identifier: String,
    title: String,
    url: String,
    summary: Option<String>,
    published: String,
    retrieved_at: String,
    raw_json: Option<String>,
}

impl StoredRow {
    fn into_entry(self) -> Result<ArchiveEntry, PersistenceError> {
        let corrupt = |reason: String| PersistenceError::CorruptRow {
            identifier: self.identifier.clone(),
            reason,
        };

        let published = normalize_datetime(&self.published).map_err(|e| corrupt(e.to_string()))?;
        let retrieved_at =
            normalize_datetime(&self.retrieved_at).map_err(|e| corrupt(e.to_string()))?;
        let raw_context = self
            .raw_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(ArchiveEntry {
            record: NewsRecord {
                identifier: self.identifier,
                title: self.title,
                url: self.url,
                summary: self.summary,
                published,
            },
            retrieved_at,
            raw_context,
        })
    }
}

// ============================================================================
// In-memory Implementation
// ============================================================================

/// In-memory archive
#[derive(Debug, Default)]
pub struct MemoryArchive {
    entries: RwLock<HashMap<String, ArchiveEntry>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ArchiveEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl ArchiveStore for MemoryArchive {
    fn exists(&self, identifier: &str) -> Result<bool, PersistenceError> {
        Ok(self.read().contains_key(identifier))
    }

    fn insert_if_absent(&self, batch: &[ArchiveEntry]) -> Result<usize, PersistenceError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut inserted = 0;
        for entry in batch {
            if !entries.contains_key(entry.identifier()) {
                entries.insert(entry.identifier().to_string(), entry.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<ArchiveEntry>, PersistenceError> {
        let mut entries: Vec<ArchiveEntry> = self.read().values().cloned().collect();
        entries.sort_by(|a, b| {
            b.record
                .published
                .cmp(&a.record.published)
                .then_with(|| a.record.identifier.cmp(&b.record.identifier))
        });
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }
}
