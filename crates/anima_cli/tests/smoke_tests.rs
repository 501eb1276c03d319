//! CLI smoke tests: drive the built binary against a throwaway database.

use std::path::Path;
use std::process::{Command, Output};

fn cli_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_anima"))
}

fn run(db: &Path, args: &[&str]) -> Output {
    cli_bin()
        .arg("--config")
        .arg("/tmp/nonexistent_anima_config_12345.toml")
        .arg("--db")
        .arg(db)
        .arg("--seed")
        .arg("7")
        .args(args)
        .env("LLM_PROVIDER", "none")
        .env_remove("ANIMA_DB_PATH")
        .output()
        .expect("failed to run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Usage"), "Expected usage info in --help output");
    assert!(stdout.contains("feel"));
    assert!(stdout.contains("sleep"));
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    assert!(stdout(&output).contains("anima"), "Expected binary name in --version output");
}

#[test]
fn test_missing_subcommand_fails() {
    let output = cli_bin().output().expect("failed to run");
    assert!(!output.status.success());
}

#[test]
fn test_feel_then_status_persists_between_runs() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("anima.db");

    let felt = run(&db, &["feel", "we", "achieve", "the", "goal"]);
    assert!(felt.status.success(), "stderr: {}", String::from_utf8_lossy(&felt.stderr));
    assert!(stdout(&felt).starts_with("pride (0.90)"));

    let status = run(&db, &["status"]);
    assert!(status.status.success());
    let text = stdout(&status);
    assert!(text.contains("Current Feeling:"));
    assert!(text.contains("pride"), "status output: {}", text);
    assert!(text.contains("Emotional maturity: 70.0%"));

    let timeline = run(&db, &["timeline", "--hours", "1"]);
    assert!(timeline.status.success());
    assert!(stdout(&timeline).contains("pride"));
}

#[test]
fn test_empty_timeline() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = run(&dir.path().join("anima.db"), &["timeline"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No emotions recorded in the last 24h"));
}

#[test]
fn test_sleep_over_episode_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let episodes = dir.path().join("episodes.jsonl");
    std::fs::write(
        &episodes,
        concat!(
            r#"{"prompt": "I'm frustrated the algorithm keeps failing", "response": "Let's look"}"#,
            "\n\n",
            r#"{"prompt": "Is the algorithm any better today?", "response": "A bit"}"#,
            "\n",
            r#"{"prompt": "The algorithm finally passes", "response": "Great"}"#,
            "\n",
        ),
    )
    .unwrap();

    let output = run(
        &dir.path().join("anima.db"),
        &["sleep", "--episodes", episodes.to_str().unwrap(), "--depth", "deep"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = stdout(&output);
    assert!(text.contains("\"patterns_discovered\":1"), "sleep output: {}", text);
}

#[test]
fn test_bad_episode_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let episodes = dir.path().join("episodes.jsonl");
    std::fs::write(&episodes, "not json\n").unwrap();
    let output = run(
        &dir.path().join("anima.db"),
        &["sleep", "--episodes", episodes.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 1"));
}

#[test]
fn test_unknown_depth_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = run(
        &dir.path().join("anima.db"),
        &["sleep", "--episodes", "x.jsonl", "--depth", "hibernate"],
    );
    assert!(!output.status.success());
}
