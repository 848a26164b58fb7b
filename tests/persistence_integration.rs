//! Integration tests for ledger and baseline storage.
//!
//! Covers the on-disk layout, atomic replacement, and concurrent baseline
//! updates under the baseline lock.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use portledger::core::baseline::{BaselineError, BaselineStore};
use portledger::core::ledger::{Ledger, LedgerStore, StoreError};
use portledger::core::ops::{BaselineLock, LockError};
use portledger::core::paths::RegistryPaths;
use portledger::core::types::{Oid, PackageName};
use portledger::core::version::{LedgerEntry, SchemedVersion, Version, VersionScheme};

fn setup() -> (TempDir, RegistryPaths) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let paths = RegistryPaths::new(dir.path().to_path_buf());
    (dir, paths)
}

fn oid(c: char) -> Oid {
    Oid::new(c.to_string().repeat(40)).unwrap()
}

fn entry(scheme: VersionScheme, text: &str, rev: u32, tree: char) -> LedgerEntry {
    LedgerEntry::new(SchemedVersion::parse(scheme, text, rev).unwrap(), oid(tree))
}

// =============================================================================
// Ledger Store Tests
// =============================================================================

#[test]
fn ledger_is_written_to_sharded_path() {
    let (_dir, paths) = setup();
    let name = PackageName::new("zlib").unwrap();
    let store = LedgerStore::new(&paths);

    store
        .save(&name, &Ledger::new(entry(VersionScheme::Relaxed, "1.3", 0, 'a')))
        .unwrap();

    let expected = paths.versions_dir().join("z-").join("zlib.json");
    assert!(expected.exists());
    assert_eq!(store.path(&name), expected);
}

#[test]
fn ledger_file_matches_wire_format() {
    let (_dir, paths) = setup();
    let name = PackageName::new("zlib").unwrap();
    let store = LedgerStore::new(&paths);

    let mut ledger = Ledger::new(entry(VersionScheme::Semver, "1.0.0", 0, 'a'));
    ledger.prepend(entry(VersionScheme::Semver, "1.1.0", 2, 'b'));
    store.save(&name, &ledger).unwrap();

    let text = fs::read_to_string(store.path(&name)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let versions = json["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version-semver"], "1.1.0");
    assert_eq!(versions[0]["port-version"], 2);
    assert_eq!(versions[0]["git-tree"], "b".repeat(40));
    assert_eq!(versions[1]["port-version"], 0);
    assert!(text.ends_with('\n'));
}

#[test]
fn ledger_round_trips_through_disk() {
    let (_dir, paths) = setup();
    let name = PackageName::new("fmt").unwrap();
    let store = LedgerStore::new(&paths);

    let mut ledger = Ledger::new(entry(VersionScheme::Date, "2020-01-01", 0, 'a'));
    ledger.prepend(entry(VersionScheme::String, "vista", 1, 'b'));
    ledger.prepend(entry(VersionScheme::Relaxed, "10.2.1", 0, 'c'));
    store.save(&name, &ledger).unwrap();

    assert_eq!(store.load(&name).unwrap(), ledger);
}

#[test]
fn empty_ledger_file_is_reported() {
    let (_dir, paths) = setup();
    let name = PackageName::new("foo").unwrap();
    let store = LedgerStore::new(&paths);
    let path = store.path(&name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, r#"{"versions": []}"#).unwrap();

    assert!(matches!(store.load(&name), Err(StoreError::Empty { .. })));
}

#[test]
fn missing_ledger_is_not_found() {
    let (_dir, paths) = setup();
    let name = PackageName::new("foo").unwrap();
    let store = LedgerStore::new(&paths);

    assert!(!store.exists(&name));
    assert!(matches!(store.load(&name), Err(StoreError::NotFound { .. })));
}

#[test]
fn staged_ledger_write_leaves_original_until_commit() {
    let (_dir, paths) = setup();
    let name = PackageName::new("zlib").unwrap();
    let store = LedgerStore::new(&paths);

    store
        .save(&name, &Ledger::new(entry(VersionScheme::Relaxed, "1.0", 0, 'a')))
        .unwrap();
    let before = fs::read(store.path(&name)).unwrap();

    let mut next = store.load(&name).unwrap();
    next.prepend(entry(VersionScheme::Relaxed, "1.1", 0, 'b'));

    // Interrupted before the rename: the original survives byte for byte
    let staged = store.stage(&name, &next).unwrap();
    assert_eq!(fs::read(store.path(&name)).unwrap(), before);
    drop(staged);
    assert_eq!(fs::read(store.path(&name)).unwrap(), before);

    store.stage(&name, &next).unwrap().commit().unwrap();
    assert_eq!(store.load(&name).unwrap().len(), 2);
}

#[test]
fn abandoned_stage_leaves_no_temp_file() {
    let (_dir, paths) = setup();
    let name = PackageName::new("zlib").unwrap();
    let store = LedgerStore::new(&paths);

    let staged = store
        .stage(&name, &Ledger::new(entry(VersionScheme::Relaxed, "1.0", 0, 'a')))
        .unwrap();
    let temp = staged.temp_path().to_path_buf();
    assert!(temp.exists());
    drop(staged);

    assert!(!temp.exists());
    assert!(!store.exists(&name));
}

// =============================================================================
// Baseline Store Tests
// =============================================================================

#[test]
fn missing_baseline_loads_empty() {
    let (_dir, paths) = setup();
    let baseline = BaselineStore::new(&paths).load().unwrap();
    assert!(baseline.is_empty());
}

#[test]
fn upsert_creates_baseline_file() {
    let (_dir, paths) = setup();
    let store = BaselineStore::new(&paths);

    assert!(store.upsert("zlib", &Version::new("1.3", 1)).unwrap());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(paths.baseline_path()).unwrap()).unwrap();
    assert_eq!(json["default"]["zlib"]["baseline"], "1.3");
    assert_eq!(json["default"]["zlib"]["port-version"], 1);
}

#[test]
fn upsert_of_equal_version_does_not_write() {
    let (_dir, paths) = setup();
    let store = BaselineStore::new(&paths);
    store.upsert("zlib", &Version::new("1.3", 0)).unwrap();
    let before = fs::read(paths.baseline_path()).unwrap();

    assert!(!store.upsert("zlib", &Version::new("1.3", 0)).unwrap());
    assert_eq!(fs::read(paths.baseline_path()).unwrap(), before);

    // A port revision change is a change
    assert!(store.upsert("zlib", &Version::new("1.3", 1)).unwrap());
}

#[test]
fn upsert_preserves_other_snapshots_and_packages() {
    let (_dir, paths) = setup();
    fs::create_dir_all(paths.versions_dir()).unwrap();
    fs::write(
        paths.baseline_path(),
        r#"{
  "default": { "fmt": { "baseline": "10.0.0", "port-version": 0 } },
  "legacy": { "fmt": { "baseline": "7.0.0", "port-version": 0 } }
}"#,
    )
    .unwrap();

    let store = BaselineStore::new(&paths);
    store.upsert("zlib", &Version::new("1.3", 0)).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(paths.baseline_path()).unwrap()).unwrap();
    assert_eq!(json["default"]["fmt"]["baseline"], "10.0.0");
    assert_eq!(json["default"]["zlib"]["baseline"], "1.3");
    assert_eq!(json["legacy"]["fmt"]["baseline"], "7.0.0");
}

#[test]
fn corrupt_baseline_is_parse_error() {
    let (_dir, paths) = setup();
    fs::create_dir_all(paths.versions_dir()).unwrap();
    fs::write(paths.baseline_path(), "{ not json").unwrap();

    let result = BaselineStore::new(&paths).upsert("zlib", &Version::new("1.3", 0));
    assert!(matches!(result, Err(BaselineError::Parse { .. })));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn concurrent_upserts_are_all_retained() {
    let (_dir, paths) = setup();
    let paths = Arc::new(paths);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let paths = Arc::clone(&paths);
            thread::spawn(move || {
                BaselineStore::new(&paths)
                    .with_lock_timeout(Duration::from_secs(30))
                    .upsert(&format!("pkg-{i}"), &Version::new(format!("1.{i}"), 0))
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }

    let baseline = BaselineStore::new(&paths).load().unwrap();
    assert_eq!(baseline.len(), 16);
    for i in 0..16 {
        assert_eq!(
            baseline.get(&format!("pkg-{i}")),
            Some(&Version::new(format!("1.{i}"), 0))
        );
    }
}

#[test]
fn upsert_times_out_while_lock_is_held() {
    let (_dir, paths) = setup();
    let _held = BaselineLock::acquire(&paths, Duration::from_secs(1)).unwrap();

    let result = BaselineStore::new(&paths)
        .with_lock_timeout(Duration::from_millis(100))
        .upsert("zlib", &Version::new("1.3", 0));

    assert!(matches!(
        result,
        Err(BaselineError::Lock(LockError::Timeout { .. }))
    ));
    assert!(!paths.baseline_path().exists());
}

#[test]
fn upsert_proceeds_once_lock_is_released() {
    let (_dir, paths) = setup();
    let mut held = BaselineLock::acquire(&paths, Duration::from_secs(1)).unwrap();
    assert!(BaselineLock::try_acquire(&paths).unwrap().is_none());

    held.release().unwrap();

    assert!(BaselineStore::new(&paths)
        .upsert("zlib", &Version::new("1.3", 0))
        .unwrap());
}
