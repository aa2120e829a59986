//! Shared test scaffolding: a temp-file-backed `Database` builder, mirroring
//! the teacher's `Db::new_test_db()` helper but for this crate's own
//! connection-pool core instead of a migrated app schema.

use asqlite_core::{Database, DatabaseConfig};

/// A temp-file database plus the `TempDir` that must outlive it. Dropping
/// the guard deletes the file.
pub struct TestDb {
    pub db: Database,
    _dir: tempfile::TempDir,
}

impl TestDb {
    pub fn open() -> Self {
        Self::with_config(|c| c)
    }

    pub fn with_config(customize: impl FnOnce(DatabaseConfig) -> DatabaseConfig) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        let config = customize(DatabaseConfig::for_path(path));
        let db = Database::open(config);
        TestDb { db, _dir: dir }
    }
}

impl std::ops::Deref for TestDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}
