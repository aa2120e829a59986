//! The literal end-to-end scenarios from the testable-properties list:
//! basic CRUD, rollback/commit, a 1000-row batch insert, and byte-exact
//! BLOB round-tripping.

mod common;

use asqlite_core::Value;
use common::TestDb;

#[tokio::test]
async fn create_insert_select_round_trip() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER PRIMARY KEY, v TEXT)", &[])
        .await
        .unwrap();
    db.execute(
        "INSERT INTO t (v) VALUES (?)",
        &[Value::Text("a".to_string())],
    )
    .await
    .unwrap();
    db.execute(
        "INSERT INTO t (v) VALUES (?)",
        &[Value::Text("b".to_string())],
    )
    .await
    .unwrap();

    let rows = db.fetch_all("SELECT * FROM t ORDER BY id", &[]).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(0), Some(&Value::Integer(1)));
    assert_eq!(rows[0].get(1), Some(&Value::Text("a".to_string())));
    assert_eq!(rows[1].get(0), Some(&Value::Integer(2)));
    assert_eq!(rows[1].get(1), Some(&Value::Text("b".to_string())));
}

#[tokio::test]
async fn rollback_then_commit_leaves_only_the_committed_row() {
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
async fn execute_many_inserts_every_parameter_set() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(v INTEGER)", &[]).await.unwrap();

    let param_sets: Vec<Vec<Value>> = (0..1000).map(|i| vec![Value::Integer(i)]).collect();
    db.execute_many("INSERT INTO t(v) VALUES(?)", &param_sets)
        .await
        .unwrap();

    let row = db.fetch_one("SELECT COUNT(*) FROM t", &[]).await.unwrap();
    assert_eq!(row.get(0), Some(&Value::Integer(1000)));
}

#[tokio::test]
async fn blob_round_trips_byte_exact() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(b BLOB)", &[]).await.unwrap();

    let bytes = vec![0x00u8, 0x01, 0xff];
    db.execute("INSERT INTO t(b) VALUES (?)", &[Value::Blob(bytes.clone())])
        .await
        .unwrap();

    let row = db.fetch_one("SELECT b FROM t", &[]).await.unwrap();
    assert_eq!(row.get(0), Some(&Value::Blob(bytes)));
}

/// Maps an `f64`'s bit pattern onto a total, monotonic `i64` ordering, so
/// subtracting two of these gives a true ULP distance even across the
/// positive/negative boundary.
fn ulp_key(d: f64) -> i64 {
    let bits = d.to_bits() as i64;
    if bits >= 0 {
        bits
    } else {
        i64::MIN - bits
    }
}

#[tokio::test]
async fn real_round_trips_within_one_ulp() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(d REAL)", &[]).await.unwrap();

    let values = [
        0.0,
        -0.0,
        1.0,
        -1.0,
        std::f64::consts::PI,
        1e300,
        -1e-300,
        f64::MIN_POSITIVE,
    ];
    for d in values {
        db.execute("DELETE FROM t", &[]).await.unwrap();
        db.execute("INSERT INTO t(d) VALUES (?)", &[Value::Real(d)])
            .await
            .unwrap();

        let row = db.fetch_one("SELECT d FROM t", &[]).await.unwrap();
        match row.get(0) {
            Some(Value::Real(got)) => {
                assert!(
                    (ulp_key(*got) - ulp_key(d)).abs() <= 1,
                    "expected {d} to round-trip within one ULP, got {got}"
                );
            }
            other => panic!("expected a Real value, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn fetch_one_on_empty_result_fails_with_no_row() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER)", &[]).await.unwrap();

    let err = db.fetch_one("SELECT id FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, asqlite_core::CoreError::NoRow));
}

#[tokio::test]
async fn fetch_optional_on_empty_result_is_none() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER)", &[]).await.unwrap();

    let row = db.fetch_optional("SELECT id FROM t", &[]).await.unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn scoped_transaction_commits_on_explicit_commit() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER)", &[]).await.unwrap();

    let tx = db.transaction().await.unwrap();
    db.execute("INSERT INTO t DEFAULT VALUES", &[]).await.unwrap();
    tx.commit().await.unwrap();

    let row = db.fetch_one("SELECT COUNT(*) FROM t", &[]).await.unwrap();
    assert_eq!(row.get(0), Some(&Value::Integer(1)));
}

#[tokio::test]
async fn scoped_transaction_rolls_back_on_explicit_rollback() {
    let db = TestDb::open();
    db.execute("CREATE TABLE t(id INTEGER)", &[]).await.unwrap();

    let tx = db.transaction().await.unwrap();
    db.execute("INSERT INTO t DEFAULT VALUES", &[]).await.unwrap();
    tx.rollback().await.unwrap();

    let row = db.fetch_one("SELECT COUNT(*) FROM t", &[]).await.unwrap();
    assert_eq!(row.get(0), Some(&Value::Integer(0)));
}
