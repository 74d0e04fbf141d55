//! Robot mode: JSON on stdout, JSON errors on stderr.

use serde_json::json;

use crate::common::cli::CliRunner;

#[test]
fn test_quick_start_describes_the_tool() {
    let cli = CliRunner::new();
    let result = cli.run_robot(&[]);
    result
        .assert_success()
        .assert_json_field("/tool", &json!("deck"))
        .assert_json_field("/output_modes/robot", &json!("--robot or --format=json"));

    let json = result.json();
    let commands = json["commands"].as_array().unwrap();
    assert!(commands.iter().any(|c| c.as_str().unwrap().starts_with("deck swap")));
}

#[test]
fn test_kinds_lists_builtin_actions() {
    let cli = CliRunner::new();
    let result = cli.run_robot(&["kinds"]);
    result.assert_success().assert_json_array_len("", 2);

    let ids: Vec<String> = result
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&"navigation".to_string()));
    assert!(ids.contains(&"brightness".to_string()));
}

#[test]
fn test_version_reports_build_info() {
    let cli = CliRunner::new();
    let result = cli.run_robot(&["version"]);
    result
        .assert_success()
        .assert_json_field("/version", &json!(env!("CARGO_PKG_VERSION")));
    assert!(result.json()["git_dirty"].is_boolean());
}

#[test]
fn test_init_bind_show_inside_folder() {
    let cli = CliRunner::new();
    let profile = cli.home().join("main.json");
    let profile = profile.to_str().unwrap();

    cli.run_robot(&["init", profile, "--name", "Studio"])
        .assert_success()
        .assert_json_field("/name", &json!("Studio"))
        .assert_json_field("/ok", &json!(true));

    cli.run_robot(&["bind", profile, "-k", "3", "--kind", "navigation"])
        .assert_success()
        .assert_json_field("/key", &json!(3))
        .assert_json_field("/saved", &json!(true));

    cli.run_robot(&["bind", profile, "-p", "3", "-k", "1", "--kind", "brightness"])
        .assert_success()
        .assert_json_field("/saved", &json!(true));

    let show = cli.run_robot(&["show", profile, "--path", "3"]);
    show.assert_success()
        .assert_json_field("/profile", &json!("Studio"))
        .assert_json_field("/model", &json!("mk2"))
        .assert_json_field("/path", &json!([3]))
        .assert_json_array_len("/keys", 15)
        .assert_json_field("/keys/0/kind", &json!("navigation"))
        .assert_json_field("/keys/0/reserved", &json!(true))
        .assert_json_field("/keys/1/kind", &json!("brightness"))
        .assert_json_field("/keys/1/folder", &json!(false));
    assert!(show.json()["keys"][1]["preferences"].is_object());

    cli.run_robot(&["show", profile])
        .assert_success()
        .assert_json_field("/keys/3/folder", &json!(true))
        .assert_json_field("/keys/0/reserved", &json!(false));
}

#[test]
fn test_go_up_key_is_reserved() {
    let cli = CliRunner::new();
    let profile = cli.home().join("main.json");
    let profile = profile.to_str().unwrap();
    cli.run(&["init", profile]).assert_success();
    cli.run(&["bind", profile, "-k", "3", "--kind", "navigation"])
        .assert_success();

    let result = cli.run_robot(&["unbind", profile, "-p", "3", "-k", "0"]);
    result.assert_failure();
    let error = result.error_json();
    assert_eq!(error["error"], json!(true));
    assert_eq!(error["recoverable"], json!(true));
    assert!(error["message"].as_str().unwrap().contains("navigate-up"));
    assert_eq!(
        error["suggestion"],
        json!("Key 0 of a folder always navigates up")
    );

    cli.run_robot(&["bind", profile, "-p", "3", "-k", "0", "--kind", "brightness"])
        .assert_failure();
    cli.run_robot(&["swap", profile, "-p", "3", "--from", "0", "--to", "4"])
        .assert_failure();
}

#[test]
fn test_unknown_kind_suggests_listing_kinds() {
    let cli = CliRunner::new();
    let profile = cli.home().join("main.json");
    let profile = profile.to_str().unwrap();
    cli.run(&["init", profile]).assert_success();

    let result = cli.run_robot(&["bind", profile, "-k", "2", "--kind", "obs-scene"]);
    result.assert_failure();
    let error = result.error_json();
    assert_eq!(error["message"], json!("Unknown action kind: obs-scene"));
    assert_eq!(error["suggestion"], json!("Run: deck kinds"));
}

#[test]
fn test_key_out_of_range_is_rejected() {
    let cli = CliRunner::new();
    let profile = cli.home().join("main.json");
    let profile = profile.to_str().unwrap();
    cli.run(&["init", profile]).assert_success();

    let result = cli.run_robot(&["press", profile, "-k", "15"]);
    result.assert_failure();
    assert!(
        result.error_json()["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid key index 15")
    );
}

#[test]
fn test_missing_profile_suggests_init() {
    let cli = CliRunner::new();
    let missing = cli.home().join("nope.json");

    let result = cli.run_robot(&["show", missing.to_str().unwrap()]);
    result.assert_failure();
    let error = result.error_json();
    assert!(error["message"].as_str().unwrap().starts_with("Profile not found"));
    assert_eq!(error["suggestion"], json!("Run: deck init <profile>"));
}

#[test]
fn test_not_a_folder_path_is_rejected() {
    let cli = CliRunner::new();
    let profile = cli.home().join("main.json");
    let profile = profile.to_str().unwrap();
    cli.run(&["init", profile]).assert_success();

    let result = cli.run_robot(&["show", profile, "--path", "4"]);
    result.assert_failure();
    assert_eq!(
        result.error_json()["message"],
        json!("No folder at key 4 on the current page")
    );
}
