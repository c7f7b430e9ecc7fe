use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let file = common::requests_csv(&[&common::create_car_row("alice", "car1", "Alice")]);

    let mut cmd = Command::new(cargo_bin!("ledger-dispatch"));
    cmd.arg(file.path())
        .arg("--db-path")
        .arg("some_db")
        .env_remove("RUST_LOG");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Durable queue requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory queue."))
        .stdout(predicate::str::contains("alice,createCar,queued,"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let file = common::requests_csv(&[&common::create_car_row("alice", "car1", "Alice")]);

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("queue_db");

    let mut cmd = Command::new(cargo_bin!("ledger-dispatch"));
    cmd.arg(file.path()).arg("--db-path").arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
