//! Editing commands and what they write back to the profile file.

use std::path::Path;

use deck::config;
use serde_json::json;

use crate::common::cli::CliRunner;
use crate::common::fixtures::TestImages;

fn init(cli: &CliRunner, name: &str) -> String {
    let path = cli.home().join(name);
    let path = path.to_str().unwrap().to_string();
    cli.run(&["init", &path]).assert_success();
    path
}

#[test]
fn test_swap_moves_binding_and_icon() {
    let cli = CliRunner::new();
    let profile = init(&cli, "swap.json");
    cli.run(&["bind", &profile, "-k", "1", "--kind", "brightness"])
        .assert_success();
    cli.run(&["icon", &profile, "-k", "2", "--text", "Hi", "--background", "#112233"])
        .assert_success();

    cli.run_robot(&["swap", &profile, "--from", "1", "--to", "2"])
        .assert_success()
        .assert_json_field("/saved", &json!(true));

    let doc = config::load_profile(Path::new(&profile)).unwrap();
    assert_eq!(doc.root.bindings[&2].kind.as_deref(), Some("brightness"));
    assert!(doc.root.bindings[&2].custom_icon.is_none());
    assert_eq!(doc.root.bindings[&1].kind, None);
    let icon = doc.root.bindings[&1].custom_icon.as_ref().unwrap();
    assert_eq!(icon.text.as_deref(), Some("Hi"));

    cli.run_robot(&["show", &profile])
        .assert_success()
        .assert_json_field("/keys/1/text", &json!("Hi"))
        .assert_json_field("/keys/2/kind", &json!("brightness"));
}

#[test]
fn test_icon_clear_removes_the_binding() {
    let cli = CliRunner::new();
    let profile = init(&cli, "icon.json");
    cli.run(&["icon", &profile, "-k", "4", "--text", "Temp"])
        .assert_success();
    assert!(
        config::load_profile(Path::new(&profile))
            .unwrap()
            .root
            .bindings
            .contains_key(&4)
    );

    cli.run(&["icon", &profile, "-k", "4", "--clear"])
        .assert_success()
        .assert_stdout_contains("Key 4 icon removed");
    let doc = config::load_profile(Path::new(&profile)).unwrap();
    assert!(!doc.root.bindings.contains_key(&4), "empty key is not stored");
}

#[test]
fn test_icon_rejects_bad_color() {
    let cli = CliRunner::new();
    let profile = init(&cli, "color.json");

    let result = cli.run_robot(&["icon", &profile, "-k", "1", "--background", "#12"]);
    result.assert_failure();
    assert_eq!(result.error_json()["recoverable"], json!(true));
}

#[test]
fn test_preferences_drive_presses() {
    let cli = CliRunner::new();
    let profile = init(&cli, "prefs.json");
    cli.run(&["bind", &profile, "-k", "1", "--kind", "brightness"])
        .assert_success();

    cli.run(&["pref", &profile, "-k", "1", "--name", "value", "--value", "40"])
        .assert_success();
    cli.run_robot(&["press", &profile, "-k", "1"])
        .assert_success()
        .assert_json_field("/brightness", &json!(40))
        .assert_json_field("/saved", &json!(true));

    cli.run(&["pref", &profile, "-k", "1", "--name", "mode", "--value", "1"])
        .assert_success();
    cli.run_robot(&["press", &profile, "-k", "1"])
        .assert_success()
        .assert_json_field("/brightness", &json!(80));

    let doc = config::load_profile(Path::new(&profile)).unwrap();
    assert_eq!(doc.brightness, 80);
    assert_eq!(
        serde_json::Value::Object(doc.root.bindings[&1].settings.clone()),
        json!({ "mode": 1, "value": 40 })
    );
}

#[test]
fn test_pref_errors() {
    let cli = CliRunner::new();
    let profile = init(&cli, "prefs.json");
    cli.run(&["bind", &profile, "-k", "1", "--kind", "brightness"])
        .assert_success();

    let unknown = cli.run_robot(&["pref", &profile, "-k", "1", "--name", "speed", "--value", "2"]);
    unknown.assert_failure();
    assert_eq!(
        unknown.error_json()["message"],
        json!("Unknown preference 'speed' for 'brightness'")
    );

    cli.run_robot(&["pref", &profile, "-k", "1", "--name", "mode", "--value=-1"])
        .assert_failure();
    cli.run_robot(&["pref", &profile, "-k", "2", "--name", "mode", "--value", "1"])
        .assert_failure();
}

#[test]
fn test_pressing_empty_key_saves_nothing() {
    let cli = CliRunner::new();
    let profile = init(&cli, "idle.json");

    cli.run_robot(&["press", &profile, "-k", "5"])
        .assert_success()
        .assert_json_field("/saved", &json!(false));
}

#[test]
fn test_unbinding_folder_drops_its_pages() {
    let cli = CliRunner::new();
    let profile = init(&cli, "tree.json");
    cli.run(&["bind", &profile, "-k", "3", "--kind", "navigation"])
        .assert_success();
    cli.run(&["bind", &profile, "-p", "3", "-k", "5", "--kind", "navigation"])
        .assert_success();
    cli.run(&["icon", &profile, "-p", "3/5", "-k", "2", "--text", "Deep"])
        .assert_success();

    let doc = config::load_profile(Path::new(&profile)).unwrap();
    assert!(doc.root.children[&3].children[&5].bindings.contains_key(&2));

    cli.run(&["unbind", &profile, "-k", "3"]).assert_success();
    let doc = config::load_profile(Path::new(&profile)).unwrap();
    assert!(doc.root.bindings.is_empty());
    assert!(doc.root.children.is_empty());
}

#[test]
fn test_render_writes_one_png_per_key() {
    let cli = CliRunner::new();
    let profile = init(&cli, "render.json");
    let images = TestImages::create_batch(2, 72);
    cli.run(&[
        "icon",
        &profile,
        "-k",
        "4",
        "--image",
        images.image(1).to_str().unwrap(),
    ])
    .assert_success();

    let out = cli.home().join("frames");
    let result = cli.run_robot(&["render", &profile, "--out", out.to_str().unwrap()]);
    result.assert_success().assert_json_array_len("/keys", 15);

    for key in 0..15 {
        assert!(out.join(format!("key-{key}.png")).is_file(), "key {key}");
    }
    let rendered = image::open(out.join("key-4.png")).unwrap().to_rgba8();
    assert_eq!(rendered.dimensions(), (72, 72));
    assert_eq!(rendered.get_pixel(36, 36).0, [8, 16, 24, 255]);
}

#[test]
fn test_render_with_assert_cmd() {
    let cli = CliRunner::new();
    let profile = init(&cli, "plain.json");
    let out = cli.home().join("plain");

    assert_cmd::Command::new(env!("CARGO_BIN_EXE_deck"))
        .args(["render", profile.as_str(), "-o", out.to_str().unwrap()])
        .env("DECK_CONFIG", cli.settings_path())
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off")
        .env_remove("DECK_FORMAT")
        .env_remove("DECK_MODEL")
        .assert()
        .success()
        .stdout(predicates::str::contains("Rendered 15 keys"));
}
