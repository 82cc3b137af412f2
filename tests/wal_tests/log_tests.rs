//! Tests for the log writer and reader
//!
//! These tests verify:
//! - LSN assignment across appends and resumes
//! - Sync strategies (EveryWrite, EveryNEntries) and forced syncs
//! - Reading back what was written, including batches and large values
//! - Reader error reporting for damaged input

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use kvfile::config::SyncStrategy;
use kvfile::wal::{Operation, WalEntry, WalReader, WalWriter, HEADER_SIZE};
use kvfile::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.kv");
    (temp_dir, path)
}

fn put(key: &[u8], value: &[u8]) -> Operation {
    Operation::Put {
        key: key.to_vec(),
        value: value.to_vec(),
    }
}

// =============================================================================
// LSN Assignment
// =============================================================================

#[test]
fn test_lsns_start_at_one_and_increase() {
    let (_temp, path) = setup_temp_log();
    let mut writer = WalWriter::open(&path, SyncStrategy::EveryWrite).unwrap();

    for expected in 1..=50u64 {
        let lsn = writer.append(put(format!("k{}", expected).as_bytes(), b"v")).unwrap();
        assert_eq!(lsn, expected);
    }
    assert_eq!(writer.current_lsn(), 51);
}

#[test]
fn test_resume_continues_lsns() {
    let (_temp, path) = setup_temp_log();
    {
        let mut writer = WalWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
        writer.append(put(b"a", b"1")).unwrap();
        writer.append(put(b"b", b"2")).unwrap();
    }

    let mut writer = WalWriter::resume(&path, SyncStrategy::EveryWrite, 2).unwrap();
    assert!(!writer.is_empty());
    assert_eq!(writer.append(put(b"c", b"3")).unwrap(), 3);
}

#[test]
fn test_len_tracks_complete_entries() {
    let (_temp, path) = setup_temp_log();
    let mut writer = WalWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
    assert!(writer.is_empty());

    writer.append(put(b"key", b"value")).unwrap();
    assert_eq!(writer.len(), fs::metadata(&path).unwrap().len());
    assert!(writer.len() > HEADER_SIZE as u64);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let (_temp, path) = setup_temp_log();
    let mut writer = WalWriter::open(&path, SyncStrategy::EveryWrite).unwrap();

    writer.append(put(b"k1", b"v1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
    writer.append(Operation::Delete { key: b"k1".to_vec() }).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, path) = setup_temp_log();
    let mut writer = WalWriter::open(&path, SyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(put(b"k1", b"v")).unwrap();
    writer.append(put(b"k2", b"v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);

    writer.append(put(b"k3", b"v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(put(b"k4", b"v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 1);
}

#[test]
fn test_append_synced_ignores_strategy() {
    let (_temp, path) = setup_temp_log();
    let mut writer = WalWriter::open(&path, SyncStrategy::EveryNEntries { count: 100 }).unwrap();

    writer.append(put(b"a", b"1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 1);

    writer
        .append_synced(Operation::Batch { operations: vec![put(b"b", b"2")] })
        .unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_manual_sync() {
    let (_temp, path) = setup_temp_log();
    let mut writer = WalWriter::open(&path, SyncStrategy::EveryNEntries { count: 100 }).unwrap();

    for i in 0..10 {
        writer.append(put(format!("k{}", i).as_bytes(), b"v")).unwrap();
    }
    assert_eq!(writer.uncommitted_count(), 10);

    writer.sync().unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

// =============================================================================
// Write + Read
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp, path) = setup_temp_log();
    {
        let mut writer = WalWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
        writer.append(put(b"key1", b"value1")).unwrap();
        writer.append(put(b"key2", b"value2")).unwrap();
        writer.append(Operation::Delete { key: b"key1".to_vec() }).unwrap();
    }

    let mut reader = WalReader::open(&path).unwrap();

    let first = reader.next_entry().unwrap().unwrap();
    assert_eq!(first.lsn, 1);
    assert_eq!(first.operation, put(b"key1", b"value1"));

    assert_eq!(reader.next_entry().unwrap().unwrap().lsn, 2);

    let third = reader.next_entry().unwrap().unwrap();
    assert_eq!(third.operation, Operation::Delete { key: b"key1".to_vec() });

    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), fs::metadata(&path).unwrap().len());
}

#[test]
fn test_read_many_entries() {
    let (_temp, path) = setup_temp_log();
    let count = 1000;
    {
        let mut writer = WalWriter::open(&path, SyncStrategy::EveryNEntries { count: 100 }).unwrap();
        for i in 0..count {
            writer
                .append(put(format!("key{}", i).as_bytes(), format!("value{}", i).as_bytes()))
                .unwrap();
        }
        writer.sync().unwrap();
    }

    let entries: Vec<_> = WalReader::open(&path)
        .unwrap()
        .entries()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(entries.len(), count);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.lsn, (i + 1) as u64);
    }
}

#[test]
fn test_batch_round_trips_in_order() {
    let (_temp, path) = setup_temp_log();
    let batch = Operation::Batch {
        operations: vec![
            put(b"a", b"1"),
            Operation::Delete { key: b"b".to_vec() },
            put(b"a", b"2"),
        ],
    };
    {
        let mut writer = WalWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
        writer.append_synced(batch.clone()).unwrap();
    }

    let entry = WalReader::open(&path).unwrap().next_entry().unwrap().unwrap();
    assert_eq!(entry.operation, batch);
    assert_eq!(entry.operation.len(), 3);
}

#[test]
fn test_large_value() {
    let (_temp, path) = setup_temp_log();
    let large = vec![0xAB; 1024 * 1024];
    {
        let mut writer = WalWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
        writer.append(put(b"big", &large)).unwrap();
    }

    let entry = WalReader::open(&path).unwrap().next_entry().unwrap().unwrap();
    match entry.operation {
        Operation::Put { value, .. } => assert_eq!(value, large),
        other => panic!("expected put, got {:?}", other),
    }
}

// =============================================================================
// Damaged Input
// =============================================================================

#[test]
fn test_reader_reports_torn_tail_as_unexpected_eof() {
    let (_temp, path) = setup_temp_log();
    let mut bytes = WalEntry::new(1, put(b"k", b"v")).serialize().unwrap();
    bytes.truncate(bytes.len() - 1);
    File::create(&path).unwrap().write_all(&bytes).unwrap();

    let mut reader = WalReader::open(&path).unwrap();
    match reader.next_entry() {
        Err(KvError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("expected torn entry, got {:?}", other),
    }
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_reader_rejects_oversized_length() {
    let (_temp, path) = setup_temp_log();
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(&1u64.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&u32::MAX.to_le_bytes());
    File::create(&path).unwrap().write_all(&header).unwrap();

    let mut reader = WalReader::open(&path).unwrap();
    assert!(matches!(reader.next_entry(), Err(KvError::LogCorruption(_))));
}

#[test]
fn test_iterator_stops_after_first_error() {
    let (_temp, path) = setup_temp_log();
    let good = WalEntry::new(1, put(b"a", b"1")).serialize().unwrap();
    let mut bad = WalEntry::new(2, put(b"b", b"2")).serialize().unwrap();
    bad[HEADER_SIZE] ^= 0xFF;
    {
        let mut file = File::create(&path).unwrap();
        file.write_all(&good).unwrap();
        file.write_all(&bad).unwrap();
        file.write_all(&good).unwrap();
    }

    let results: Vec<_> = WalReader::open(&path).unwrap().entries().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(KvError::LogCorruption(_))));
}
