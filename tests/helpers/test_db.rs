use std::path::PathBuf;
use taskhub::infrastructure::persistence::Database;
use uuid::Uuid;

pub struct TestDatabase {
    db: Database,
    path: PathBuf,
}

impl TestDatabase {
    pub fn db(&self) -> &Database {
        &self.db
    }
}

pub async fn setup_test_db() -> TestDatabase {
    // File-based SQLite, one file per test so tests can run in parallel
    let path = std::env::temp_dir().join(format!("taskhub_test_{}.db", Uuid::new_v4()));
    let db_url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");

    db.run_migrations()
        .await
        .expect("Failed to run migrations on test database");

    TestDatabase { db, path }
}

pub async fn teardown_test_db(test_db: TestDatabase) {
    test_db.db.pool().close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = test_db.path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
