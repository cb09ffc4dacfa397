//! CLI integration tests using assert_cmd to exercise the actual binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn geo_consent() -> Command {
    Command::cargo_bin("geo-consent").unwrap()
}

fn initialized() -> TempDir {
    let tmp = TempDir::new().unwrap();
    geo_consent()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .success();
    tmp
}

// ---------------------------------------------------------------------------
// Init subcommand
// ---------------------------------------------------------------------------

#[test]
fn cli_init_creates_project_files() {
    let tmp = TempDir::new().unwrap();

    geo_consent()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("initialized .geo-consent/"));

    assert!(tmp.path().join(".geo-consent/config.yml").exists());
    assert!(tmp.path().join(".geo-consent/groups.yml").exists());
}

#[test]
fn cli_init_idempotent() {
    let tmp = initialized();

    geo_consent()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("already initialized"));
}

// ---------------------------------------------------------------------------
// Resolve subcommand
// ---------------------------------------------------------------------------

#[test]
fn cli_resolve_european_country() {
    let tmp = initialized();

    geo_consent()
        .args(["resolve", "--country", "fr"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""group_id": "europe""#))
        .stdout(predicate::str::contains(r#""matched_country": "FR""#));
}

#[test]
fn cli_resolve_us_state() {
    let tmp = initialized();

    geo_consent()
        .args(["resolve", "--country", "US", "--region", "CA"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""group_id": "california""#))
        .stdout(predicate::str::contains("Do Not Sell My Info"));
}

#[test]
fn cli_resolve_unmatched_uses_default() {
    let tmp = initialized();

    geo_consent()
        .args(["resolve", "--country", "JP"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""use_default": true"#));
}

#[test]
fn cli_resolve_without_project_uses_default() {
    let tmp = TempDir::new().unwrap();

    geo_consent()
        .args(["resolve", "--country", "DE"])
        .arg("--project")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("use_default"));
}

// ---------------------------------------------------------------------------
// Groups and settings
// ---------------------------------------------------------------------------

#[test]
fn cli_groups_lists_in_priority_order() {
    let tmp = initialized();

    geo_consent()
        .arg("groups")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1. europe (Europe)"))
        .stdout(predicate::str::contains("2. california (California)"))
        .stdout(predicate::str::contains("us_state"))
        .stdout(predicate::str::contains("2 location group(s)"));
}

#[test]
fn cli_groups_empty_project() {
    let tmp = TempDir::new().unwrap();

    geo_consent()
        .arg("groups")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No location groups configured"));
}

#[test]
fn cli_settings_visitor_forced_to_deny() {
    let tmp = initialized();

    geo_consent()
        .arg("settings")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""default_allow": false"#))
        .stdout(predicate::str::contains(r#""show_banner": true"#));
}

#[test]
fn cli_settings_group_editor_sees_raw() {
    let tmp = initialized();

    geo_consent()
        .args(["settings", "--context", "admin_groups"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""default_allow": true"#));
}

#[test]
fn cli_settings_rejects_unknown_context() {
    let tmp = initialized();

    geo_consent()
        .args(["settings", "--context", "root"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown caller context"));
}

// ---------------------------------------------------------------------------
// Simulate subcommand
// ---------------------------------------------------------------------------

// Nothing listens on port 1, so every request fails fast.
const DEAD_SERVER: &str = "http://127.0.0.1:1";

#[test]
fn cli_simulate_unreachable_server_uses_default() {
    let tmp = initialized();

    let output = geo_consent()
        .args(["simulate", "--server", DEAD_SERVER])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["state"], "applied");
    assert_eq!(report["fetches"], 1);
    assert_eq!(report["policy"], serde_json::json!({ "use_default": true }));
    assert!(report["cookies"].as_array().unwrap().is_empty());
}

#[test]
fn cli_simulate_offline_keeps_opt_in_deny() {
    let tmp = initialized();

    geo_consent()
        .args(["simulate", "--server", DEAD_SERVER])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""default_allow": false"#))
        .stderr(predicate::str::contains("consent signal: granted").not());
}

#[test]
fn cli_simulate_cached_policy_skips_fetch() {
    let tmp = initialized();

    let output = geo_consent()
        .args(["simulate", "--server", DEAD_SERVER, "--cached", r#"{"use_default":true}"#])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["fetches"], 0);
    assert_eq!(report["cookies"][0]["name"], "geo_consent_policy");
}
