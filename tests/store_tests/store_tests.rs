//! Tests for Store
//!
//! These tests verify:
//! - Point operations and the not-found signal
//! - Persistence across close and reopen
//! - Opening from a config, including its validation
//! - The advisory lock and injected lockers
//! - Close semantics and use after close

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kvfile::lock::{self, LockGuard};
use kvfile::{BatchMutation, Config, KeyValue, KvError, RangeIterator, Store, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf, Store) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.kv");
    let store = Store::open(&config_for(&path)).unwrap();
    (temp_dir, path, store)
}

fn config_for(path: &Path) -> Config {
    Config::builder()
        .file(path)
        .sync_strategy(SyncStrategy::EveryWrite)
        .build()
}

// =============================================================================
// Point Operations
// =============================================================================

#[test]
fn test_set_and_get() {
    let (_temp, _path, store) = setup_temp_store();

    store.set(b"key", b"value").unwrap();

    assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
}

#[test]
fn test_missing_key_is_none() {
    let (_temp, _path, store) = setup_temp_store();

    assert_eq!(store.get(b"never-written").unwrap(), None);
}

#[test]
fn test_empty_value_is_distinct_from_missing() {
    let (_temp, _path, store) = setup_temp_store();

    store.set(b"empty", b"").unwrap();

    assert_eq!(store.get(b"empty").unwrap(), Some(Vec::new()));
    assert_eq!(store.get(b"other").unwrap(), None);
}

#[test]
fn test_overwrite_and_delete() {
    let (_temp, _path, store) = setup_temp_store();

    store.set(b"k", b"1").unwrap();
    store.set(b"k", b"2").unwrap();
    assert_eq!(store.get(b"k").unwrap(), Some(b"2".to_vec()));

    store.delete(b"k").unwrap();
    assert_eq!(store.get(b"k").unwrap(), None);

    // Absent keys delete cleanly
    store.delete(b"k").unwrap();
}

#[test]
fn test_binary_keys_and_values() {
    let (_temp, _path, store) = setup_temp_store();
    let key = [0x00, 0xFF, 0x10, 0x00];
    let value = [0xDE, 0xAD, 0xBE, 0xEF, 0x00];

    store.set(&key, &value).unwrap();

    assert_eq!(store.get(&key).unwrap(), Some(value.to_vec()));
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_data_survives_reopen() {
    let (_temp, path, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"b", b"2").unwrap();
    store.delete(b"a").unwrap();

    let mut batch = store.begin_batch();
    batch.set(b"c", b"3");
    store.commit_batch(batch).unwrap();
    store.close().unwrap();

    let store = Store::open(&config_for(&path)).unwrap();
    assert_eq!(store.get(b"a").unwrap(), None);
    assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
    assert_eq!(store.get(b"c").unwrap(), Some(b"3".to_vec()));
}

#[test]
fn test_open_path_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sub").join("index.kv");

    let store = Store::open_path(&path).unwrap();

    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_open_rejects_config_without_file() {
    let config = Config::builder().file("").build();

    match Store::open(&config) {
        Err(KvError::Config(msg)) => assert!(msg.contains("missing 'file' parameter")),
        other => panic!("expected config error, got {:?}", other.err()),
    }
}

#[test]
fn test_open_from_json_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("json.kv");
    let json = format!(r#"{{"file": {:?}}}"#, path.to_str().unwrap());

    let config = Config::from_json(&json).unwrap();
    let store = Store::open(&config).unwrap();
    store.set(b"k", b"v").unwrap();

    assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
}

// =============================================================================
// Locking
// =============================================================================

#[cfg(unix)]
#[test]
fn test_second_store_on_same_file_fails() {
    let (_temp, path, store) = setup_temp_store();

    match Store::open(&config_for(&path)) {
        Err(KvError::Lock { path: locked, .. }) => assert_eq!(locked, lock::lock_path(&path)),
        other => panic!("expected lock error, got {:?}", other.err()),
    }

    // The error names the lock file
    let err = Store::open(&config_for(&path)).err().unwrap();
    assert!(err.to_string().contains(".lock"));

    store.close().unwrap();
    Store::open(&config_for(&path)).unwrap();
}

#[test]
fn test_injected_locker_failure_surfaces() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.kv");

    let deny = |_: &Path| -> io::Result<LockGuard> {
        Err(io::Error::new(ErrorKind::WouldBlock, "already locked"))
    };

    let err = Store::open_with_locker(&config_for(&path), Arc::new(deny))
        .err()
        .unwrap();

    match err {
        KvError::Lock { source, .. } => assert_eq!(source.kind(), ErrorKind::WouldBlock),
        other => panic!("expected lock error, got {:?}", other),
    }
}

#[test]
fn test_injected_locker_called_once_per_open() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.kv");

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let locker = move |_: &Path| -> io::Result<LockGuard> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(()))
    };
    let locker = Arc::new(locker);

    let store = Store::open_with_locker(&config_for(&path), locker.clone()).unwrap();
    store.close().unwrap();
    let store = Store::open_with_locker(&config_for(&path), locker).unwrap();
    store.close().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Close
// =============================================================================

#[test]
fn test_use_after_close_fails() {
    let (_temp, _path, store) = setup_temp_store();
    store.set(b"k", b"v").unwrap();
    store.close().unwrap();

    assert!(matches!(store.get(b"k"), Err(KvError::Closed)));
    assert!(matches!(store.set(b"k", b"v"), Err(KvError::Closed)));
    assert!(matches!(store.delete(b"k"), Err(KvError::Closed)));

    let mut batch = store.begin_batch();
    batch.set(b"x", b"y");
    assert!(matches!(store.commit_batch(batch), Err(KvError::Closed)));

    let mut it = store.find(b"", b"");
    assert!(!it.next());
    assert!(matches!(it.close(), Err(KvError::Closed)));
}

#[test]
fn test_close_twice_is_ok() {
    let (_temp, _path, store) = setup_temp_store();

    store.close().unwrap();
    store.close().unwrap();
}

#[test]
fn test_drop_releases_lock() {
    let (_temp, path, store) = setup_temp_store();
    store.set(b"k", b"v").unwrap();
    drop(store);

    let store = Store::open(&config_for(&path)).unwrap();
    assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
}
