use jedibus::store::*;
use jedibus::RecordResolver;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_STORE_ID: AtomicUsize = AtomicUsize::new(0);

/// Unique scratch file per test so parallel test threads never share a
/// database.
fn temp_store_path(tag: &str) -> PathBuf {
    let id = NEXT_STORE_ID.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "jedibus-store-{}-{}-{}.json",
        tag,
        std::process::id(),
        id
    ))
}

fn cleanup(path: &Path) {
    let _ = fs::remove_file(path);
}

fn sample_record(code: u16) -> ErrorRecord {
    ErrorRecord {
        generator_status: 6,
        simplified_code: 40,
        display_bitmap: 1,
        phase_nibble: 3,
        class_nibble: 4,
        generator_error_code: code,
        aux_data: 7,
        description: "Filament supply fault".to_string(),
    }
}

#[test]
fn test_add_then_lookup_round_trip() {
    let path = temp_store_path("round-trip");
    let mut store = JsonFileStore::new(path.clone());

    store.add(sample_record(500)).unwrap();

    // A fresh handle over the same file sees the record.
    let reader = JsonFileStore::new(path.clone());
    let record = reader.record_by_code(500).unwrap().unwrap();
    assert_eq!(record, sample_record(500));
    assert!(reader.record_by_code(501).unwrap().is_none());

    cleanup(&path);
}

#[test]
fn test_add_rejects_duplicate_code() {
    let path = temp_store_path("duplicate");
    let mut store = JsonFileStore::new(path.clone());

    store.add(sample_record(500)).unwrap();
    let result = store.add(sample_record(500));

    assert!(matches!(result, Err(StoreError::DuplicateCode(500))));
    assert_eq!(
        result.unwrap_err().to_string(),
        "Error code 500 already exists in the database"
    );

    cleanup(&path);
}

#[test]
fn test_add_rejects_wide_nibbles_before_writing() {
    let path = temp_store_path("nibbles");
    let mut store = JsonFileStore::new(path.clone());

    let mut record = sample_record(500);
    record.class_nibble = 16;
    let result = store.add(record);

    assert!(matches!(
        result,
        Err(StoreError::NibbleOutOfRange { code: 500 })
    ));
    // Validation runs before any file I/O, so nothing was created.
    assert!(!path.exists());
}

#[test]
fn test_missing_file_reads_as_unreadable() {
    let path = temp_store_path("missing");
    let store = JsonFileStore::new(path.clone());

    assert!(matches!(
        store.record_by_code(804),
        Err(StoreError::Unreadable { .. })
    ));

    // The resolver folds that error into a not-found outcome.
    let resolver = RecordResolver::new(store);
    assert!(resolver.resolve(804).is_none());
}

#[test]
fn test_malformed_file_reads_as_malformed() {
    let path = temp_store_path("malformed");
    fs::write(&path, "{ this is not json").unwrap();

    let store = JsonFileStore::new(path.clone());
    assert!(matches!(
        store.load_all(),
        Err(StoreError::Malformed { .. })
    ));
    assert!(store.record_by_code(804).is_err());

    let resolver = RecordResolver::new(store);
    assert!(resolver.resolve(804).is_none());

    cleanup(&path);
}

#[test]
fn test_seed_if_missing_runs_once() {
    let path = temp_store_path("seed");
    let store = JsonFileStore::new(path.clone());

    assert!(store.seed_if_missing(&builtin_records()).unwrap());
    assert!(!store.seed_if_missing(&builtin_records()).unwrap());

    let record = store.record_by_code(804).unwrap().unwrap();
    assert_eq!(record.simplified_code, 30);
    let record = store.record_by_code(134).unwrap().unwrap();
    assert_eq!(record.simplified_code, 90);

    cleanup(&path);
}

#[test]
fn test_persist_leaves_no_temp_file_behind() {
    let path = temp_store_path("atomic");
    let mut store = JsonFileStore::new(path.clone());

    store.add(sample_record(500)).unwrap();

    let mut os = path.clone().into_os_string();
    os.push(".tmp");
    let temp = PathBuf::from(os);

    assert!(path.exists());
    assert!(!temp.exists());

    cleanup(&path);
}

#[test]
fn test_list_follows_key_order() {
    let path = temp_store_path("list");
    let mut store = JsonFileStore::new(path.clone());
    store.seed_if_missing(&builtin_records()).unwrap();

    store.add(sample_record(500)).unwrap();

    let codes: Vec<u16> = store
        .list()
        .unwrap()
        .iter()
        .map(|r| r.generator_error_code)
        .collect();
    assert_eq!(codes, vec![134, 500, 804]);

    cleanup(&path);
}

#[test]
fn test_out_of_band_file_edits_are_visible() {
    let path = temp_store_path("out-of-band");
    let store = JsonFileStore::new(path.clone());
    store.seed_if_missing(&builtin_records()).unwrap();

    // Replace the document behind the store's back; the database document
    // is a map keyed by the decimal code with camelCase record fields.
    let body = r#"{
        "42": {
            "generatorStatus": 1,
            "simplifiedCode": 2,
            "displayBitmap": 3,
            "phaseNibble": 4,
            "classNibble": 5,
            "generatorErrorCode": 42,
            "auxData": 6,
            "description": "handwritten"
        }
    }"#;
    fs::write(&path, body).unwrap();

    let record = store.record_by_code(42).unwrap().unwrap();
    assert_eq!(record.description, "handwritten");
    assert!(store.record_by_code(804).unwrap().is_none());

    cleanup(&path);
}

#[test]
fn test_builtin_catalog_contents() {
    let records = builtin_records();
    assert_eq!(records.len(), 2);

    let tube_spit = records
        .iter()
        .find(|r| r.generator_error_code == 804)
        .unwrap();
    assert_eq!(tube_spit.simplified_code, 30);
    assert_eq!(tube_spit.class_nibble, 2);
    assert!(tube_spit.description.contains("Tube spit"));

    let hw_issue = records
        .iter()
        .find(|r| r.generator_error_code == 134)
        .unwrap();
    assert_eq!(hw_issue.simplified_code, 90);
    assert_eq!(hw_issue.class_nibble, 5);
}
