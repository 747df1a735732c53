use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd(db: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tagsearch"));
    cmd.arg("--db").arg(db);
    cmd
}

#[test]
fn tag_search_untag_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("tags.db");

    cmd(&db)
        .args(["tag", "post", "1", "red", "car"])
        .assert()
        .success();
    cmd(&db)
        .args(["tag", "post", "2", "redwood"])
        .assert()
        .success();

    let out = cmd(&db)
        .args(["search", "red"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed["post"].as_array().unwrap().len(), 2);

    let out = cmd(&db)
        .args(["search", "red", "--strict"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed["post"].as_array().unwrap().len(), 1);
    assert_eq!(parsed["post"][0]["entity_id"], 1);

    cmd(&db).args(["untag", "post", "1"]).assert().success();

    let out = cmd(&db)
        .args(["search", "red", "--strict"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert!(parsed.as_object().unwrap().is_empty());
}

#[test]
fn tags_command_lists_usage_counts() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("tags.db");

    cmd(&db)
        .args(["tag", "post", "1", "shared"])
        .assert()
        .success();
    cmd(&db)
        .args(["tag", "comment", "1", "shared", "solo"])
        .assert()
        .success();

    cmd(&db)
        .arg("tags")
        .assert()
        .success()
        .stdout(contains("2\tshared"))
        .stdout(contains("1\tsolo"));
}

#[test]
fn retag_replaces_the_tag_set() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("tags.db");

    cmd(&db).args(["tag", "post", "1", "x", "y"]).assert().success();
    cmd(&db)
        .args(["retag", "post", "1", "y", "z"])
        .assert()
        .success();

    cmd(&db)
        .arg("tags")
        .assert()
        .success()
        .stdout(contains("1\ty"))
        .stdout(contains("1\tz"))
        .stdout(contains("x").not());
}

#[test]
fn payload_is_returned_in_hits() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("tags.db");

    cmd(&db)
        .args([
            "tag",
            "post",
            "1",
            "red",
            "--payload",
            r#"{"title":"Red things"}"#,
        ])
        .assert()
        .success();

    let out = cmd(&db)
        .args(["search", "red"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed["post"][0]["payload"]["title"], "Red things");
}

#[cfg(target_os = "linux")]
#[test]
fn no_strict_flag_overrides_strict_config() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("tags.db");

    let config_root = tmp.path().join("config");
    std::fs::create_dir_all(config_root.join("tagsearch")).unwrap();
    std::fs::write(config_root.join("tagsearch/config.toml"), "strict = true\n").unwrap();

    cmd(&db)
        .args(["tag", "post", "1", "redwood"])
        .assert()
        .success();

    // Config default applies: strict search misses the substring.
    let out = cmd(&db)
        .env("XDG_CONFIG_HOME", &config_root)
        .args(["search", "red"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert!(parsed.as_object().unwrap().is_empty());

    // The flag beats the config.
    let out = cmd(&db)
        .env("XDG_CONFIG_HOME", &config_root)
        .args(["search", "red", "--no-strict"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed["post"].as_array().unwrap().len(), 1);
}

#[test]
fn search_type_flag_controls_grouping() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("tags.db");

    cmd(&db)
        .args(["tag", "post", "1", "red", "--search-type", "articles"])
        .assert()
        .success();

    let out = cmd(&db)
        .args(["search", "red"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert!(parsed.get("articles").is_some());
}
