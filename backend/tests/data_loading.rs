//! Integration tests for loading the data directory and the shared store.

use std::fs;
use std::time::Duration;

use moon_reports::data::{self, DataStore, LoadError, LoadState, SnapshotError};

mod support;

#[test]
fn test_load_stacks_nested_files_with_union_of_columns() {
    let dir = tempfile::tempdir().unwrap();
    support::write_fixture_data(dir.path());

    let table = data::load(dir.path()).unwrap();

    assert_eq!(table.len(), 7);
    assert_eq!(table.columns().len(), 10);
    assert!(table.column_index("elevation_m").is_some());
    assert!(table.column_index("ELONGATION").is_some());

    // Rows from the CSV have no elevation, rows from the TSV have no elongation
    let elevation = table.column_index("elevation_m").unwrap();
    let elongation = table.column_index("elongation").unwrap();
    let with_elevation = table.select(|r| table.cell(r, elevation).is_some());
    let with_elongation = table.select(|r| table.cell(r, elongation).is_some());
    assert_eq!(with_elevation.len(), 2);
    assert_eq!(with_elongation.len(), 5);
}

#[test]
fn test_load_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    support::write_fixture_data(dir.path());

    let first = data::load(dir.path()).unwrap();
    let second = data::load(dir.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn test_unsupported_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.md"), "# moon").unwrap();
    fs::write(dir.path().join("data.json"), "{}").unwrap();

    let table = data::load(dir.path()).unwrap();
    assert!(table.is_empty());
}

#[test]
fn test_invalid_utf8_file_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.csv"), b"date,location\n2024-03-10,\xff\xfe\n").unwrap();

    let err = data::load(dir.path()).unwrap_err();
    match err {
        LoadError::File { path, .. } => assert!(path.ends_with("broken.csv")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_directory_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let err = data::load(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, LoadError::Directory { .. }));
    assert!(err.to_string().contains("absent"));
}

#[tokio::test]
async fn test_store_lifecycle_success() {
    let dir = tempfile::tempdir().unwrap();
    support::write_fixture_data(dir.path());

    let store = DataStore::new();
    assert!(matches!(store.state(), LoadState::Loading));

    store.spawn_load(dir.path().to_path_buf()).await.unwrap();

    let table = store.snapshot(Duration::from_secs(1)).await.unwrap();
    assert_eq!(table.len(), 7);
    assert_eq!(store.state().label(), "ready");
}

#[tokio::test]
async fn test_store_lifecycle_failure() {
    let dir = tempfile::tempdir().unwrap();

    let store = DataStore::new();
    store.spawn_load(dir.path().join("absent")).await.unwrap();

    assert_eq!(store.state().label(), "failed");
    let err = store.snapshot(Duration::from_secs(1)).await.unwrap_err();
    match err {
        SnapshotError::Unavailable(message) => assert!(message.contains("absent")),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_snapshots_share_one_table() {
    let dir = tempfile::tempdir().unwrap();
    support::write_fixture_data(dir.path());
    let store = DataStore::with_table(data::load(dir.path()).unwrap());

    let a = store.snapshot(Duration::ZERO).await.unwrap();
    let b = store.clone().snapshot(Duration::ZERO).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_walked() {
    use std::os::unix::fs::symlink;

    // A link back to the data directory itself
    let cyclic = tempfile::tempdir().unwrap();
    fs::write(cyclic.path().join("a.csv"), "date,w\n2024-03-10,0.3\n").unwrap();
    symlink(cyclic.path(), cyclic.path().join("loop")).unwrap();

    let table = data::load(cyclic.path()).unwrap();
    assert_eq!(table.len(), 1);

    // A second name for a directory that is already walked
    let aliased = tempfile::tempdir().unwrap();
    fs::create_dir(aliased.path().join("real")).unwrap();
    fs::write(aliased.path().join("real").join("a.csv"), "date,w\n2024-03-10,0.3\n").unwrap();
    symlink(aliased.path().join("real"), aliased.path().join("alias")).unwrap();

    let table = data::load(aliased.path()).unwrap();
    assert_eq!(table.len(), 1);
}

#[test]
fn test_rows_follow_sorted_file_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("c.csv"), "date\n2024-03-12\n").unwrap();
    fs::write(dir.path().join("a.csv"), "date\n2024-03-10\n").unwrap();
    fs::write(dir.path().join("b").join("x.tsv"), "date\n2024-03-11\n").unwrap();

    let table = data::load(dir.path()).unwrap();
    let dates: Vec<&str> = (0..table.len()).filter_map(|r| table.cell(r, 0)).collect();
    assert_eq!(dates, vec!["2024-03-10", "2024-03-11", "2024-03-12"]);
}
