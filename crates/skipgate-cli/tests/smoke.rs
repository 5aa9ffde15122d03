//! Smoke tests for the `skipgate` binary.
//!
//! Drives the binary end to end with literal messages and temp config files.
//! The one git-backed test returns early when git is not installed.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const MERGE_MESSAGE: &str = "Merge pull request #39 ...\nKREW-240 kiwi import\n[skip-deploy]";

const CONFIG: &str = r#"
[[rules]]
name = "force-deploy"
pattern = '\[force-deploy\]'
action = "proceed"

[[rules]]
name = "skip-deploy"
pattern = '\[skip-deploy\]'
"#;

fn skipgate(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_skipgate"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("SKIPGATE_LOG");
    cmd
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("custom.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ── Help / basic CLI ──────────────────────────────────────────────────────────

#[test]
fn binary_responds_to_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = skipgate(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("evaluate"));
    assert!(text.contains("explain"));
    assert!(text.contains("rules"));
}

#[test]
fn unknown_subcommand_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let output = skipgate(dir.path()).arg("deploy").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn message_sources_are_mutually_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let output = skipgate(dir.path())
        .args(["evaluate", "--message", "x", "--git"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

// ── evaluate ──────────────────────────────────────────────────────────────────

#[test]
fn full_message_with_tag_exits_skip() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .args(["--message", MERGE_MESSAGE])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(78));
    assert!(stdout(&output).starts_with("SKIP: rule 'skip-deploy'"));
}

#[test]
fn first_line_change_log_exits_proceed() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .args(["--changelog", "Merge pull request #39 ..."])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "PROCEED");
}

#[test]
fn proceed_rule_overrides_skip() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .args(["--message", "Hotfix\n[force-deploy]\n[skip-deploy]"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("force-deploy"));
}

#[test]
fn message_file_and_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let message = dir.path().join("COMMIT_MSG");
    std::fs::write(&message, format!("\n{MERGE_MESSAGE}\n\n")).unwrap();

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .arg("--message-file")
        .arg(&message)
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(78));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["result"]["decision"], "skip");
    assert_eq!(json["result"]["line"], 3);
    assert_eq!(json["rule_set"].as_str().unwrap().len(), 64);
}

#[test]
fn invalid_rule_exits_with_error_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "[[rules]]\nname = \"broken\"\npattern = \"[skip-deploy\"\n",
    );

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .args(["--message", MERGE_MESSAGE])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).starts_with("ERROR: rule 'broken'"));
}

#[test]
fn no_config_uses_built_in_rules() {
    let dir = tempfile::tempdir().unwrap();

    let output = skipgate(dir.path())
        .args(["evaluate", "--message", MERGE_MESSAGE])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(78));
}

#[test]
fn config_in_working_directory_is_discovered() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("skipgate.toml"), "rules = []\n").unwrap();

    let output = skipgate(dir.path())
        .args(["evaluate", "--message", MERGE_MESSAGE])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = skipgate(dir.path())
        .args(["evaluate", "--config", "nope.toml", "--message", "x"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope.toml"), "stderr: {stderr}");
}

// ── explain / rules ───────────────────────────────────────────────────────────

#[test]
fn explain_shows_disagreement() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = skipgate(dir.path())
        .arg("explain")
        .arg("--config")
        .arg(&config)
        .args(["--message", MERGE_MESSAGE])
        .args(["--changelog", "Merge pull request #39 ..."])
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("full_message (3 lines):"));
    assert!(text.contains("disagreement: 'skip-deploy' matched full_message but not change_log"));
}

#[test]
fn rules_lists_configured_rules() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = skipgate(dir.path())
        .arg("rules")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("force-deploy"));
    assert!(text.contains("proceed"));
    assert!(text.contains("skip-deploy"));
}

#[test]
fn rules_json_carries_fingerprint_and_rules() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = skipgate(dir.path())
        .args(["rules", "--format", "json"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rule_set"].as_str().unwrap().len(), 64);
    assert_eq!(json["rules"][0]["name"], "force-deploy");
    assert_eq!(json["rules"][0]["action"], "proceed");
    assert_eq!(json["rules"][1]["action"], "skip");
}

#[test]
fn rules_with_invalid_pattern_exits_with_error_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "[[rules]]\nname = \"broken\"\npattern = \"(unclosed\"\n",
    );

    let output = skipgate(dir.path())
        .arg("rules")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("broken"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid rule set"), "stderr: {stderr}");
}

// ── Other input sources ───────────────────────────────────────────────────────

#[test]
fn stdin_message_exits_skip() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let mut child = skipgate(dir.path())
        .args(["evaluate", "--stdin"])
        .arg("--config")
        .arg(&config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(format!("{MERGE_MESSAGE}\n").as_bytes())
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(78));
    assert!(stdout(&output).contains("on full_message line 3"));
}

#[test]
fn changelog_file_skips_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let log = dir.path().join("CHANGELOG");
    std::fs::write(&log, "\nMerge pull request #39 ...\n\n   \nBump serde\n").unwrap();

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .arg("--changelog-file")
        .arg(&log)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "PROCEED");

    let output = skipgate(dir.path())
        .arg("explain")
        .arg("--config")
        .arg(&config)
        .arg("--changelog-file")
        .arg(&log)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let block = &json["report"]["candidates"][0];
    assert_eq!(block["source"], "change_log");
    assert_eq!(block["entry_count"], 2);
}

#[test]
fn empty_message_proceeds_even_for_blank_matching_rule() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[[rules]]\nname = \"blank\"\npattern = '^$'\n");
    let message = dir.path().join("COMMIT_MSG");
    std::fs::write(&message, "\n   \n").unwrap();

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .args(["--message", ""])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let output = skipgate(dir.path())
        .arg("evaluate")
        .arg("--config")
        .arg(&config)
        .arg("--message-file")
        .arg(&message)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "PROCEED");
}

#[test]
fn zero_git_timeout_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[git]\ntimeout_secs = 0\n");

    let output = skipgate(dir.path())
        .args(["evaluate", "--message", "x"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn git_changelog_reads_recent_subjects() {
    let git_available = Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !git_available {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    std::fs::create_dir(&repo).unwrap();
    let git = |args: &[&str]| {
        let status = Command::new("git")
            .arg("-C")
            .arg(&repo)
            .args(["-c", "user.name=skipgate", "-c", "user.email=skipgate@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    };
    git(&["init", "-q"]);
    git(&["commit", "-q", "--allow-empty", "-m", MERGE_MESSAGE]);

    let config = write_config(dir.path(), CONFIG);

    let subjects_only = skipgate(dir.path())
        .args(["evaluate", "--git-changelog", "1"])
        .arg("--config")
        .arg(&config)
        .arg("--repo")
        .arg(&repo)
        .output()
        .unwrap();
    assert_eq!(subjects_only.status.code(), Some(0));

    let full_message = skipgate(dir.path())
        .args(["evaluate", "--git"])
        .arg("--config")
        .arg(&config)
        .arg("--repo")
        .arg(&repo)
        .output()
        .unwrap();
    assert_eq!(full_message.status.code(), Some(78));
}
