use std::sync::{Arc, Barrier};
use std::thread;

use user_roster::{get_database, AppConfig, DbError, NewUser};

const THREADS: usize = 8;

// One test only: the accessor caches a process-wide handle, so every check
// shares the same first initialization.
#[test]
fn concurrent_first_access_opens_one_handle() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::with_data_dir(dir.path().join("data"));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                get_database(&config).unwrap()
            })
        })
        .collect();

    let databases: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let first = &databases[0];
    assert!(databases.iter().all(|db| Arc::ptr_eq(db, first)));
    assert_eq!(first.path(), Some(config.db_path().as_path()));
    assert!(config.db_path().exists());

    // Later calls keep returning the cached handle.
    let again = get_database(&config).unwrap();
    assert!(Arc::ptr_eq(&again, first));
    again.create_user(&NewUser::new("Pepe", "Botella")).unwrap();
    assert_eq!(first.count_users().unwrap(), 1);

    // Asking for another file while one is open is refused.
    let other = AppConfig::with_data_dir(dir.path().join("other"));
    let err = get_database(&other).err().unwrap();
    assert!(matches!(err, DbError::AlreadyOpen { .. }));
}
