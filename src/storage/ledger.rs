//! Line-delimited JSON mirror of the archive
//!
//! Rewritten in full after every run so it always reflects the archive,
//! newest first. The file is replaced atomically: readers see either the
//! previous mirror or the new one.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::ArchiveEntry;
use crate::parser::datetime::to_iso;
use crate::utils::error::PersistenceError;

/// One ledger line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub identifier: String,
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    /// ISO-8601
    pub published: String,
    /// ISO-8601
    pub retrieved_at: String,
}

impl From<&ArchiveEntry> for LedgerLine {
    fn from(entry: &ArchiveEntry) -> Self {
        Self {
            identifier: entry.record.identifier.clone(),
            title: entry.record.title.clone(),
            url: entry.record.url.clone(),
            summary: entry.record.summary.clone(),
            published: to_iso(&entry.record.published),
            retrieved_at: to_iso(&entry.retrieved_at),
        }
    }
}

/// Writes the archive mirror to a fixed destination
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    path: PathBuf,
}

impl LedgerWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the mirror with `entries`, one JSON object per line
    ///
    /// Entries are written in the order given.
    pub fn write_all(&self, entries: &[ArchiveEntry]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut buffer = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buffer, &LedgerLine::from(entry))?;
            buffer.write_all(b"\n")?;
        }

        // Atomic write using temp file
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, buffer)?;
        std::fs::rename(&temp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "Ledger exported"
        );
        Ok(())
    }
}
