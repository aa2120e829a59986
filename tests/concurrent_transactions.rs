//! Transaction-state-machine invariants under concurrency (§8).

mod common;

use asqlite_core::{CoreError, Value};
use common::TestDb;

#[tokio::test]
async fn concurrent_begin_exactly_one_succeeds_synchronously() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER PRIMARY KEY)", &[])
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let db = db.db.clone();
        handles.push(tokio::spawn(async move { db.begin().await }));
    }

    let mut successes = 0;
    let mut already_in_progress = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(()) => successes += 1,
            Err(CoreError::OperationalError(msg)) if msg.contains("already in progress") => {
                already_in_progress += 1
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one concurrent begin() should win the race");
    assert_eq!(already_in_progress, 9);

    db.rollback().await.unwrap();
}

#[tokio::test]
async fn begin_while_active_fails_with_already_in_progress() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER PRIMARY KEY)", &[])
        .await
        .unwrap();

    db.begin().await.unwrap();
    let err = db.begin().await.unwrap_err();
    assert!(matches!(err, CoreError::OperationalError(ref msg) if msg.contains("already in progress")));
    db.rollback().await.unwrap();
}

#[tokio::test]
async fn rollback_then_begin_again_succeeds() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER PRIMARY KEY)", &[])
        .await
        .unwrap();

    db.begin().await.unwrap();
    db.execute("INSERT INTO t DEFAULT VALUES", &[]).await.unwrap();
    db.rollback().await.unwrap();

    db.begin().await.unwrap();
    db.execute("INSERT INTO t DEFAULT VALUES", &[]).await.unwrap();
    db.commit().await.unwrap();

    let row = db.fetch_one("SELECT COUNT(*) FROM t", &[]).await.unwrap();
    assert_eq!(row.get(0), Some(&Value::Integer(1)));
}

#[tokio::test]
async fn in_transaction_reports_active_state_accurately() {
    let db = TestDb::open();
    assert!(!db.in_transaction().await);

    db.begin().await.unwrap();
    assert!(db.in_transaction().await);

    db.commit().await.unwrap();
    assert!(!db.in_transaction().await);
}

#[tokio::test]
async fn statements_inside_active_transaction_use_pinned_connection_and_all_commit() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER PRIMARY KEY)", &[])
        .await
        .unwrap();

    db.begin().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..5 {
        let db = db.db.clone();
        handles.push(tokio::spawn(async move {
            db.execute("INSERT INTO t (id) VALUES (?)", &[Value::Integer(i)])
                .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert!(db.in_transaction().await);
    db.commit().await.unwrap();

    let row = db.fetch_one("SELECT COUNT(*) FROM t", &[]).await.unwrap();
    assert_eq!(row.get(0), Some(&Value::Integer(5)));
}
