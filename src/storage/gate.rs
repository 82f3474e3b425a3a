//! Dedup/archive gate
//!
//! Splits a fresh extraction into new and known records and decides what
//! gets written. When nothing is new the whole extraction is written
//! anyway; insert-if-absent makes that a no-op for existing keys while
//! still exercising the archive every run.

use chrono::{NaiveDateTime, Timelike, Utc};
use serde_json::Value;

use super::ArchiveStore;
use crate::models::{ArchiveEntry, NewsRecord};
use crate::utils::error::PersistenceError;

/// What the gate decided and wrote
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// Records absent from the archive before this run, newest first
    pub new_records: Vec<NewsRecord>,
    /// Entries handed to the archive
    pub persisted: Vec<ArchiveEntry>,
    /// Entries the archive actually inserted
    pub inserted: usize,
}

/// Gate in front of an [`ArchiveStore`]
pub struct DedupGate<'a> {
    store: &'a dyn ArchiveStore,
}

impl<'a> DedupGate<'a> {
    pub fn new(store: &'a dyn ArchiveStore) -> Self {
        Self { store }
    }

    /// Records whose identifier is not yet archived, order preserved
    pub fn new_records(&self, records: &[NewsRecord]) -> Result<Vec<NewsRecord>, PersistenceError> {
        let mut fresh = Vec::new();
        for record in records {
            if !self.store.exists(&record.identifier)? {
                fresh.push(record.clone());
            }
        }
        Ok(fresh)
    }

    /// Compute new records and persist them (or everything, if none are new)
    ///
    /// Every persisted entry carries `raw_context` and the same
    /// second-precision `retrieved_at`.
    pub fn admit(
        &self,
        records: &[NewsRecord],
        raw_context: Option<&Value>,
    ) -> Result<GateOutcome, PersistenceError> {
        self.admit_at(records, raw_context, now_seconds())
    }

    /// [`Self::admit`] with an explicit capture time
    pub fn admit_at(
        &self,
        records: &[NewsRecord],
        raw_context: Option<&Value>,
        retrieved_at: NaiveDateTime,
    ) -> Result<GateOutcome, PersistenceError> {
        let new_records = self.new_records(records)?;

        let to_persist = if new_records.is_empty() {
            records
        } else {
            new_records.as_slice()
        };

        let persisted: Vec<ArchiveEntry> = to_persist
            .iter()
            .cloned()
            .map(|record| record.into_entry(retrieved_at, raw_context.cloned()))
            .collect();

        let inserted = self.store.insert_if_absent(&persisted)?;

        tracing::info!(
            extracted = records.len(),
            new = new_records.len(),
            persisted = persisted.len(),
            inserted,
            "Archive gate applied"
        );

        Ok(GateOutcome {
            new_records,
            persisted,
            inserted,
        })
    }
}

fn now_seconds() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryArchive;
    use chrono::NaiveDate;

    fn record(id: &str, day: u32) -> NewsRecord {
        NewsRecord {
            identifier: id.to_string(),
            title: format!("Title {id}"),
            url: format!("https://www.europeantour.com/news/{id}"),
            summary: None,
            published: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    fn ids(records: &[NewsRecord]) -> Vec<&str> {
        records.iter().map(|r| r.identifier.as_str()).collect()
    }

    #[test]
    fn test_only_new_records_persisted() {
        let store = MemoryArchive::new();
        store
            .insert_if_absent(&[record("a", 1).into_entry(record("a", 1).published, None)])
            .unwrap();

        let gate = DedupGate::new(&store);
        let extracted = vec![record("c", 3), record("b", 2), record("a", 1)];
        let outcome = gate.admit(&extracted, None).unwrap();

        assert_eq!(ids(&outcome.new_records), vec!["c", "b"]);
        assert_eq!(outcome.persisted.len(), 2);
        assert_eq!(outcome.inserted, 2);
        for id in ["a", "b", "c"] {
            assert!(store.exists(id).unwrap());
        }
    }

    #[test]
    fn test_refresh_path_when_nothing_new() {
        let store = MemoryArchive::new();
        let gate = DedupGate::new(&store);
        gate.admit(&[record("a", 1)], None).unwrap();

        let outcome = gate.admit(&[record("a", 1)], None).unwrap();

        assert!(outcome.new_records.is_empty());
        assert_eq!(outcome.persisted.len(), 1);
        assert_eq!(outcome.persisted[0].identifier(), "a");
        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_raw_context_and_capture_time_attached() {
        let store = MemoryArchive::new();
        let gate = DedupGate::new(&store);
        let payload = serde_json::json!({ "props": { "n": 1 } });
        let captured = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();

        let outcome = gate
            .admit_at(&[record("a", 1)], Some(&payload), captured)
            .unwrap();

        assert_eq!(outcome.persisted[0].raw_context.as_ref(), Some(&payload));
        assert_eq!(outcome.persisted[0].retrieved_at, captured);
    }

    #[test]
    fn test_capture_time_has_no_subseconds() {
        let store = MemoryArchive::new();
        let outcome = DedupGate::new(&store).admit(&[record("a", 1)], None).unwrap();
        assert_eq!(outcome.persisted[0].retrieved_at.nanosecond(), 0);
    }

    #[test]
    fn test_empty_extraction() {
        let store = MemoryArchive::new();
        let outcome = DedupGate::new(&store).admit(&[], None).unwrap();
        assert!(outcome.new_records.is_empty());
        assert!(outcome.persisted.is_empty());
        assert_eq!(outcome.inserted, 0);
    }
}
