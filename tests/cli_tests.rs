//! CLI tests that run the built binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MATCH_JSON: &str = r#"{
    "title": "Spring Cup",
    "date": "2024-05-12",
    "results": [
        {
            "id": 42,
            "shooter": { "name": "Jo Doe" },
            "division": { "place": 2, "percent": 91.5, "points": 830.2 },
            "overall": { "place": 5, "percent": 84.0, "points": 760.1 },
            "stages": [
                {
                    "number": 1, "name": "Warm Up", "time": 14.2,
                    "points": 110, "stagePoints": 95.1, "stagePercent": 95.1,
                    "hitFactor": 7.75,
                    "score": { "packed": { "paper": [17] } }
                }
            ]
        }
    ]
}"#;

fn matchreel() -> Command {
    let mut cmd = Command::cargo_bin("matchreel").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("MATCHREEL_CONFIG")
        .env_remove("MATCHREEL_WORKERS");
    cmd
}

fn write_config(temp: &TempDir) -> std::path::PathBuf {
    let source = temp.path().join("matches");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("spring.json"), MATCH_JSON).unwrap();

    let config = format!(
        r#"
[output]
work_dir = "{work}"

[source]
dir = "{source}"
match_id = "spring"
shooter_id = "42"

[report]
kind = "plain"

[caption]
template = "Stage {{stage.number}}"
overlay = {{ anchor = "leftBottom", font = {{ name = "Arial", size = 36, color = "yellow" }} }}

[[clips]]
path = "stage1.mp4"
stage = 1

[[clips]]
empty = 2.0
"#,
        work = temp.path().join("work").display(),
        source = source.display(),
    );
    let path = temp.path().join("reel.toml");
    std::fs::write(&path, config).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    matchreel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("score"));
}

#[test]
fn test_missing_config_file_fails() {
    matchreel()
        .args(["--config", "/nonexistent/matchreel.toml", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_score_prints_counters() {
    matchreel()
        .args(["score", "17"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Alphas\s+1").unwrap())
        .stdout(predicate::str::is_match(r"Bravos\s+1").unwrap())
        .stdout(predicate::str::is_match(r"Deltas\s+0").unwrap());
}

#[test]
fn test_score_json_sums_both_groups() {
    // one alpha in each group
    matchreel()
        .args(["score", "--json", "0x100000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"alphas\": 2"));
}

#[test]
fn test_score_rejects_garbage() {
    matchreel().args(["score", "abc"]).assert().failure();
}

#[test]
fn test_plan_prints_json() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp);

    matchreel()
        .arg("--config")
        .arg(&config)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"clip0.resized\""))
        .stdout(predicate::str::contains("\"empty1\""))
        .stdout(predicate::str::contains("\"text\": \"Stage 1\""))
        .stdout(predicate::str::contains("\"merge\""));

    assert!(!temp.path().join("work").exists());
}

#[test]
fn test_plan_with_unknown_shooter_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp);

    matchreel()
        .arg("--config")
        .arg(&config)
        .args(["plan", "--shooter", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Shooter 99 not found"));
}

#[test]
fn test_config_prints_effective_toml() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp);

    matchreel()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .env("MATCHREEL_WORKERS", "3")
        .assert()
        .success()
        .stdout(predicate::str::contains("[pipeline]"))
        .stdout(predicate::str::contains("workers = 3"));
}
