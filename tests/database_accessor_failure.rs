use std::fs;
use std::sync::Arc;

use user_roster::{get_database, AppConfig, DbError};

// Kept apart from the other accessor test so the process-wide handle starts
// out empty here.
#[test]
fn failed_construction_is_reported_and_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let broken = AppConfig::with_data_dir(&blocker);
    let err = get_database(&broken).err().unwrap();
    assert!(matches!(err, DbError::Io { .. }));

    let config = AppConfig::with_data_dir(dir.path().join("data"));
    let first = get_database(&config).unwrap();
    let second = get_database(&config).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.path(), Some(config.db_path().as_path()));
}
