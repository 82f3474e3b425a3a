//! Archive, dedup gate and ledger tests against real files

mod common;

use common::{at, record};
use newsfeed::models::NewsRecord;
use newsfeed::storage::ledger::LedgerLine;
use newsfeed::storage::{ArchiveStore, DedupGate, LedgerWriter, SqliteArchive};
use tempfile::TempDir;

fn archive(dir: &TempDir) -> SqliteArchive {
    SqliteArchive::open(dir.path().join("news_archive.sqlite3")).unwrap()
}

fn ids(records: &[NewsRecord]) -> Vec<&str> {
    records.iter().map(|r| r.identifier.as_str()).collect()
}

#[test]
fn test_insert_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = archive(&dir);
    let captured = at(2024, 3, 20, 12);
    let batch: Vec<_> = [record("a", 1), record("b", 2)]
        .into_iter()
        .map(|r| r.into_entry(captured, None))
        .collect();

    store.insert_if_absent(&batch).unwrap();
    let once = store.list(None).unwrap();

    store.insert_if_absent(&batch).unwrap();
    let twice = store.list(None).unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.len(), 2);
}

#[test]
fn test_gate_persists_only_new() {
    let dir = TempDir::new().unwrap();
    let store = archive(&dir);
    store
        .insert_if_absent(&[record("a", 1).into_entry(at(2024, 3, 2, 0), None)])
        .unwrap();

    let extracted = vec![record("c", 3), record("b", 2), record("a", 1)];
    let outcome = DedupGate::new(&store).admit(&extracted, None).unwrap();

    assert_eq!(ids(&outcome.new_records), vec!["c", "b"]);
    assert_eq!(outcome.inserted, 2);

    let stored: Vec<_> = store
        .list(None)
        .unwrap()
        .into_iter()
        .map(|e| e.record.identifier)
        .collect();
    assert_eq!(stored, vec!["c", "b", "a"]);
}

#[test]
fn test_gate_refresh_path() {
    let dir = TempDir::new().unwrap();
    let store = archive(&dir);
    let original_capture = at(2024, 3, 2, 0);
    store
        .insert_if_absent(&[record("a", 1).into_entry(original_capture, None)])
        .unwrap();

    let outcome = DedupGate::new(&store).admit(&[record("a", 1)], None).unwrap();

    assert!(outcome.new_records.is_empty());
    assert_eq!(outcome.persisted.len(), 1);
    assert_eq!(outcome.inserted, 0);

    // Insert-if-absent: the stored entry keeps its first capture time
    let stored = store.list(None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].retrieved_at, original_capture);
}

#[test]
fn test_raw_context_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = archive(&dir);
    let payload = common::sample_payload();

    DedupGate::new(&store)
        .admit(&[record("a", 1)], Some(&payload))
        .unwrap();

    let stored = store.list(None).unwrap();
    assert_eq!(stored[0].raw_context.as_ref(), Some(&payload));
}

#[test]
fn test_archive_survives_reopen() {
    let dir = TempDir::new().unwrap();
    archive(&dir)
        .insert_if_absent(&[record("a", 1).into_entry(at(2024, 3, 2, 0), None)])
        .unwrap();

    let reopened = archive(&dir);
    assert!(reopened.exists("a").unwrap());
    assert_eq!(reopened.latest_identifier().unwrap().as_deref(), Some("a"));
}

#[test]
fn test_ledger_mirrors_archive_order() {
    let dir = TempDir::new().unwrap();
    let store = archive(&dir);
    let captured = at(2024, 3, 20, 12);
    store
        .insert_if_absent(&[
            record("old", 1).into_entry(captured, None),
            record("new", 9).into_entry(captured, None),
        ])
        .unwrap();

    let writer = LedgerWriter::new(dir.path().join("archive/news_archive.jsonl"));
    writer.write_all(&store.list(None).unwrap()).unwrap();

    let content = std::fs::read_to_string(writer.path()).unwrap();
    let lines: Vec<LedgerLine> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].identifier, "new");
    assert_eq!(lines[0].published, "2024-03-09T09:00:00");
    assert_eq!(lines[0].retrieved_at, "2024-03-20T12:00:00");
    assert_eq!(lines[1].identifier, "old");
    assert_eq!(lines[1].summary.as_deref(), Some("Summary of old"));
}
