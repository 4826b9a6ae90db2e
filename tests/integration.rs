use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn catalog_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("catalog");
    path
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/demo.json")
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/catalog.sqlite"

[server]
bind = "127.0.0.1:7331"

[logging]
filter = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("catalog.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_catalog(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = catalog_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run catalog binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Initialized and seeded environment.
fn seeded_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_catalog(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    let fixture = fixture_path();
    let (stdout, stderr, success) =
        run_catalog(&config_path, &["seed", fixture.to_str().unwrap()]);
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    (tmp, config_path)
}

fn run_json(config_path: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, success) = run_catalog(config_path, args);
    assert!(
        success,
        "{:?} failed: stdout={}, stderr={}",
        args, stdout, stderr
    );
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({}): {}", e, stdout))
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_catalog(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/catalog.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_catalog(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_catalog(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_seed_reports_counts() {
    let (_tmp, config_path) = setup_test_env();
    run_catalog(&config_path, &["init"]);

    let fixture = fixture_path();
    let (stdout, stderr, success) =
        run_catalog(&config_path, &["seed", fixture.to_str().unwrap()]);
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("posts:      5"));
    assert!(stdout.contains("videos:     3"));
    assert!(stdout.contains("likes:      4 new"));
}

#[test]
fn test_seed_missing_file_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_catalog(&config_path, &["init"]);

    let (_, stderr, success) = run_catalog(&config_path, &["seed", "/nonexistent/fixture.json"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read fixture"));
}

#[test]
fn test_list_newest() {
    let (_tmp, config_path) = seeded_env();

    let page = run_json(&config_path, &["list", "posts", "--sort", "NEWEST"]);
    assert_eq!(page["total"], 4);
    assert_eq!(page["pageSize"], 10);
    let ids: Vec<i64> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![43, 42, 44, 45]);
}

#[test]
fn test_list_bogus_sort_fails() {
    let (_tmp, config_path) = seeded_env();

    let (_, stderr, success) = run_catalog(&config_path, &["list", "posts", "--sort", "bogus"]);
    assert!(!success);
    assert!(stderr.contains("bogus"));
}

#[test]
fn test_list_unknown_type_fails() {
    let (_tmp, config_path) = seeded_env();

    let (_, stderr, success) = run_catalog(&config_path, &["list", "podcasts"]);
    assert!(!success);
    assert!(stderr.contains("unknown content type"));
}

#[test]
fn test_list_viewer_state() {
    let (_tmp, config_path) = seeded_env();

    let page = run_json(&config_path, &["list", "videos", "--user", "7"]);
    let liked: Vec<(i64, bool)> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| {
            (
                i["id"].as_i64().unwrap(),
                i["viewerState"]["liked"].as_bool().unwrap(),
            )
        })
        .collect();
    assert!(liked.contains(&(42, true)));
    assert!(liked.contains(&(7, false)));
}

#[test]
fn test_get_counts_views() {
    let (_tmp, config_path) = seeded_env();

    let first = run_json(&config_path, &["get", "posts", "42"]);
    assert_eq!(first["viewCount"], 101);
    assert_eq!(first["likeCount"], 3);
    assert_eq!(first["categories"][0], "Gardening");
    assert_eq!(first["expert"]["fullName"], "Dana Reyes");

    let second = run_json(&config_path, &["get", "post", "42"]);
    assert_eq!(second["viewCount"], 102);
}

#[test]
fn test_get_draft_is_not_found() {
    let (_tmp, config_path) = seeded_env();

    let (_, stderr, success) = run_catalog(&config_path, &["get", "posts", "99"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_like_toggles() {
    let (_tmp, config_path) = seeded_env();

    let liked = run_json(&config_path, &["like", "posts", "42", "--user", "7"]);
    assert_eq!(liked["liked"], true);
    assert_eq!(liked["likeCount"], 4);

    let unliked = run_json(&config_path, &["like", "posts", "42", "--user", "7"]);
    assert_eq!(unliked["liked"], false);
    assert_eq!(unliked["likeCount"], 3);
}

#[test]
fn test_search_and_related() {
    let (_tmp, config_path) = seeded_env();

    let search = run_json(&config_path, &["search", "rose"]);
    assert_eq!(search["query"], "rose");
    assert_eq!(search["total"], 3);
    assert_eq!(search["items"][0]["type"], "video");
    assert_eq!(search["items"][0]["duration"], "12:34");

    let related = run_json(&config_path, &["related", "posts", "45"]);
    assert_eq!(related["total"], 0);

    let related = run_json(&config_path, &["related", "videos", "8", "--page-size", "50"]);
    assert_eq!(related["pageSize"], 20);
    assert_eq!(related["total"], 1);
    assert_eq!(related["items"][0]["id"], 44);
}

#[test]
fn test_tags_and_stats() {
    let (_tmp, config_path) = seeded_env();

    let tags = run_json(&config_path, &["tags"]);
    let names: Vec<&str> = tags["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["beginner", "roses", "tools"]);
    assert_eq!(tags["items"][1]["slug"], "roses");

    let (stdout, _, success) = run_catalog(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Content Catalog Stats"));
    assert!(stdout.contains("post"));
}

#[test]
fn test_missing_config_fails() {
    let (stdout, stderr, success) = run_catalog(Path::new("/nonexistent/catalog.toml"), &["init"]);
    assert!(!success, "stdout={}", stdout);
    assert!(stderr.contains("Failed to read config file"));
}
