use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cookie_tin_cli").unwrap();
    cmd.env("COOKIE_TIN_CLI_SCRIPT", "1")
        .env("COOKIE_TIN_HOME", home)
        .env("NO_COLOR", "1");
    cmd
}

fn blob(home: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(home.join("data").join("cookie-tin-v1.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn script_mode_opens_and_adds() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .write_stdin("open Christmas 100\nadd Tree 40\nadd \"Fairy lights\" 12.5 0\nstatus\nexit\n")
        .assert()
        .success()
        .stdout(contains("Opened tin `Christmas`"))
        .stdout(contains("Added `Fairy lights` for $12.50."))
        .stdout(contains("Remaining : $47.50"));

    let value = blob(home.path());
    assert_eq!(value[0]["label"], "Christmas");
    assert_eq!(value[0]["items"].as_array().unwrap().len(), 2);
}

#[test]
fn over_budget_add_is_held_until_answered() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .write_stdin("open Easter 10\nadd Bunny 15\nanswer 0\nitems\nexit\n")
        .assert()
        .success()
        .stdout(contains("Over budget!"))
        .stdout(contains("Not quite."))
        .stdout(contains("The tin is empty."));

    let value = blob(home.path());
    assert!(value[0]["items"].as_array().unwrap().is_empty());
}

#[test]
fn sessions_survive_restarts() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .write_stdin("open Halloween 20 --date 2026-10-31\nadd Pumpkin 5\nclose\n")
        .assert()
        .success();

    cli(home.path())
        .write_stdin("sessions\nadd Candy 1\n")
        .assert()
        .success()
        .stdout(contains("Halloween").and(contains("[closed]")))
        .stdout(contains("No session selected"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .write_stdin("stauts\nhelp add\nversion\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `stauts`"))
        .stdout(contains("Suggestion: `status`?"))
        .stdout(contains("add <name> <amount> [calories]"))
        .stdout(contains("Cookie Tin"));
}

#[test]
fn scan_reads_the_configured_catalog() {
    let home = TempDir::new().unwrap();
    let catalog = home.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"{ "4001": { "name": "Stollen", "caloriesPer100g": 410 } }"#,
    )
    .unwrap();
    fs::create_dir_all(home.path().join("config")).unwrap();
    fs::write(
        home.path().join("config").join("config.json"),
        serde_json::json!({ "catalog_path": catalog, "currency_symbol": "€" }).to_string(),
    )
    .unwrap();

    cli(home.path())
        .write_stdin("open Christmas 50\nscan 4001 7.25\nscan 0000 1\n")
        .assert()
        .success()
        .stdout(contains("Added `Stollen` for €7.25."))
        .stdout(contains("Product `0000` not found."));

    assert_eq!(blob(home.path())[0]["items"][0]["calories"], 410);
}
