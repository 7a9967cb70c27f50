mod common;

use common::{fixture_path, spawn_command};

fn fixture(name: &str) -> String {
    fixture_path(name).display().to_string()
}

#[test]
fn validate_valid_deck() {
    let output = spawn_command(&["validate", &fixture("five_slides.yaml")]);
    assert!(
        output.status.success(),
        "validate should succeed for a valid deck: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok (5 slides)"), "unexpected output: {stdout}");
}

#[test]
fn validate_invalid_deck_exits_with_config_error() {
    let output = spawn_command(&["validate", &fixture("duplicate_ids.yaml")]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Duplicate slide id 'same'"), "unexpected output: {stdout}");
    assert!(stdout.contains("content_url"), "unexpected output: {stdout}");
}

#[test]
fn validate_json_output() {
    let output = spawn_command(&[
        "validate",
        "--format",
        "json",
        &fixture("five_slides.yaml"),
        &fixture("empty_deck.yaml"),
    ]);
    assert!(!output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("output should be valid JSON");
    let reports = parsed.as_array().expect("array of reports");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[0]["slides"], 5);
    assert_eq!(reports[1]["valid"], false);
}

#[test]
fn validate_strict_fails_on_warnings() {
    let deck = fixture("with_warnings.yaml");
    let relaxed = spawn_command(&["validate", &deck]);
    assert!(relaxed.status.success());
    assert!(String::from_utf8_lossy(&relaxed.stdout).contains("warning:"));

    let strict = spawn_command(&["validate", "--strict", &deck]);
    assert_eq!(strict.status.code(), Some(2));
}

#[test]
fn validate_missing_file() {
    let output = spawn_command(&["validate", "/tmp/nonexistent_deckhand_test_file.yaml"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("file not found"), "unexpected output: {stdout}");
}

#[test]
fn validate_malformed_yaml() {
    let output = spawn_command(&["validate", &fixture("malformed.yaml")]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn list_json_output() {
    let output = spawn_command(&["list", "--format", "json", &fixture("fast_scenario.yaml")]);
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let slides = parsed.as_array().expect("array of slides");
    assert_eq!(slides.len(), 5);
    assert_eq!(slides[2]["id"], "attack");
    assert_eq!(slides[2]["kind"], "scenario");
    assert_eq!(slides[2]["number"], 3);
}

#[test]
fn list_falls_back_to_built_in_deck() {
    let output = spawn_command(&["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<built-in deck>"));
    assert!(stdout.contains("live-demo-attack"));
}

#[test]
fn version_json_output() {
    let output = spawn_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(parsed["name"], "deckhand");
    assert_eq!(parsed["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn completions_bash() {
    let output = spawn_command(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("deckhand"));
}

#[test]
fn present_rejects_invalid_deck() {
    let output = spawn_command(&["present", "--headless", &fixture("empty_deck.yaml")]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = spawn_command(&["dance"]);
    assert!(!output.status.success());
}
