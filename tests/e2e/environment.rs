//! Settings file and environment overrides.

use serde_json::json;

use crate::common::cli::CliRunner;
use crate::common::fixtures::{TestProfile, mixed_profile};

#[test]
fn test_format_from_environment() {
    let cli = CliRunner::new().with_env("DECK_FORMAT", "json-compact");
    let result = cli.run(&["version"]);
    result.assert_success();
    assert_eq!(result.stdout.trim().lines().count(), 1, "compact JSON is one line");
    assert!(result.json()["version"].is_string());
}

#[test]
fn test_no_color_accepts_conventional_values() {
    for value in ["1", "yes", "true", "0"] {
        CliRunner::new()
            .with_env("NO_COLOR", value)
            .run(&["kinds"])
            .assert_success()
            .assert_stdout_contains("brightness");
    }
}

#[test]
fn test_model_from_environment() {
    let cli = CliRunner::new().with_env("DECK_MODEL", "mini");
    let profile = cli.home().join("mini.json");
    let profile = profile.to_str().unwrap();
    cli.run(&["init", profile]).assert_success();

    cli.run_robot(&["show", profile])
        .assert_success()
        .assert_json_field("/model", &json!("mini"))
        .assert_json_array_len("/keys", 6);
}

#[test]
fn test_settings_file_picks_model_and_default_profile() {
    let fixture = TestProfile::json(&mixed_profile());
    let settings = format!(
        "model = \"mini\"\ndefault_profile = \"{}\"\nsave_debounce_secs = 1\n",
        fixture.path_str()
    );
    let cli = CliRunner::new().with_settings(&settings);

    cli.run_robot(&["show"])
        .assert_success()
        .assert_json_field("/profile", &json!("Fixture"))
        .assert_json_field("/brightness", &json!(60))
        .assert_json_array_len("/keys", 6)
        .assert_json_field("/keys/4/kind", &json!("obs-scene"));

    cli.run_robot(&["show", "--path", "3"])
        .assert_success()
        .assert_json_field("/keys/2/kind", &json!("brightness"));
}

#[test]
fn test_model_flag_beats_settings_file() {
    let cli = CliRunner::new().with_settings("model = \"mini\"\n");
    let profile = cli.home().join("xl.json");
    let profile = profile.to_str().unwrap();
    cli.run(&["init", profile]).assert_success();

    cli.run_robot(&["--model", "xl", "show", profile])
        .assert_success()
        .assert_json_array_len("/keys", 32);
}

#[test]
fn test_missing_default_profile_is_an_error() {
    let cli = CliRunner::new();
    cli.run_robot(&["show"])
        .assert_failure()
        .assert_stderr_contains("default_profile");
}

#[test]
fn test_bad_settings_file_is_reported() {
    let cli = CliRunner::new().with_settings("model = [\n");
    let result = cli.run_robot(&["kinds"]);
    result.assert_failure();
    assert!(
        result.error_json()["message"]
            .as_str()
            .unwrap()
            .starts_with("Configuration parse error")
    );
}

#[test]
fn test_unknown_model_in_settings_is_rejected() {
    let cli = CliRunner::new().with_settings("model = \"jumbo\"\n");
    cli.run_robot(&["kinds"]).assert_failure();
}

#[test]
fn test_editing_a_shared_fixture_keeps_unknown_bindings() {
    let fixture = TestProfile::yaml(&mixed_profile());
    let cli = CliRunner::new().with_settings("model = \"mini\"\n");

    cli.run(&["bind", fixture.path_str(), "-k", "5", "--kind", "brightness"])
        .assert_success();

    let doc = fixture.load();
    assert_eq!(doc.root.bindings[&4].kind.as_deref(), Some("obs-scene"));
    assert_eq!(doc.root.bindings[&5].kind.as_deref(), Some("brightness"));
    assert_eq!(doc.root.children[&3].bindings.len(), 2);
}
