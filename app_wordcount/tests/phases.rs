use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn map_loads_words_from_working_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("words_to_count.txt"), "cat\ndog\n").unwrap();

    Command::cargo_bin("app_wordcount")
        .unwrap()
        .current_dir(dir.path())
        .args(["-p", "map"])
        .write_stdin("1\x01The cat saw a dog\n2\x01cat!\n")
        .assert()
        .success()
        .stdout("cat\x011\ndog\x011\ncat\x011\n");
}

#[test]
fn map_without_words_file_fails_before_output() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("app_wordcount")
        .unwrap()
        .current_dir(dir.path())
        .args(["-p", "map"])
        .write_stdin("1\x01cat\n")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("words_to_count.txt"));
}

#[test]
fn reduce_does_not_need_words_file() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("app_wordcount")
        .unwrap()
        .current_dir(dir.path())
        .args(["-p", "reduce"])
        .write_stdin("cat\x012\ncat\x011\ndog\x011\n")
        .assert()
        .success()
        .stdout("cat\x013\ndog\x011\n");
}
