use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_collections_on_empty_store() {
    let temp = tempdir().unwrap();
    Command::cargo_bin("tripstore")
        .unwrap()
        .arg("--db")
        .arg(temp.path())
        .arg("collections")
        .assert()
        .success()
        .stdout(predicate::str::contains("Store is empty"));
}

#[test]
fn test_get_missing_record_fails() {
    let temp = tempdir().unwrap();
    Command::cargo_bin("tripstore")
        .unwrap()
        .args(["--db", temp.path().to_str().unwrap(), "get", "trips", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trips/1 not found"));
}
