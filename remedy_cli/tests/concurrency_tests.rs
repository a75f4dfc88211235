//! Concurrency tests for the remedy binary.
//!
//! These tests verify that multiple processes can safely:
//! - Update the same user's medication list simultaneously
//! - Read a profile while another process writes it

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::TempDir;

const MEDICATIONS: [&str; 6] = [
    "warfarina",
    "omeprazol",
    "sertralina",
    "ibuprofeno",
    "metformina",
    "lorazepam",
];

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("remedy"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn active_medications(data_dir: &Path) -> Vec<String> {
    let output = cli(data_dir)
        .args(["meds", "list", "--user", "ana", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let mut ids: Vec<String> = serde_json::from_slice(&output).expect("stdout is JSON");
    ids.sort();
    ids
}

#[test]
fn test_concurrent_meds_add_keeps_every_medication() {
    let temp_dir = setup_test_dir();
    let data_dir: PathBuf = temp_dir.path().to_path_buf();

    let handles: Vec<_> = MEDICATIONS
        .into_iter()
        .map(|medication| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli(&data_dir)
                    .args(["meds", "add", "--user", "ana", "--medication", medication])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let mut expected: Vec<String> = MEDICATIONS.iter().map(|m| m.to_string()).collect();
    expected.sort();
    assert_eq!(active_medications(&data_dir), expected);
}

#[test]
fn test_concurrent_profile_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir: PathBuf = temp_dir.path().to_path_buf();

    cli(&data_dir)
        .args(["profile", "set", "--user", "ana", "--condition", "insomnio"])
        .assert()
        .success();

    let writer = {
        let data_dir = data_dir.clone();
        thread::spawn(move || {
            for medication in MEDICATIONS {
                cli(&data_dir)
                    .args(["meds", "add", "--user", "ana", "--medication", medication])
                    .assert()
                    .success();
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    // Every read sees a complete record, never a torn write
                    cli(&data_dir)
                        .args(["profile", "show", "--user", "ana"])
                        .assert()
                        .success()
                        .stdout(predicates::str::contains("Conditions: Insomnio"));
                }
            })
        })
        .collect();

    writer.join().expect("Writer thread panicked");
    for reader in readers {
        reader.join().expect("Reader thread panicked");
    }

    assert_eq!(active_medications(&data_dir).len(), MEDICATIONS.len());
}
