//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with `AICLOCK_HOME` pointed at a temporary
//! directory and verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_aiclock-cli"))
        .args(args)
        .env("AICLOCK_HOME", home)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Pipe `input` to `aiclock-cli run` and return its stdout lines as JSON.
fn run_device(home: &Path, input: &str) -> Vec<serde_json::Value> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_aiclock-cli"))
        .arg("run")
        .env("AICLOCK_HOME", home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "run failed: {:?}", output);

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}

#[test]
fn test_alarm_wake_and_show() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["alarm", "wake", "7", "5", "--intensity", "strong"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("起床时间已设置为 07:05"));
    assert!(stdout.contains("铃声强度已设置为: strong"));

    let (code, stdout, _) = run_cli(home.path(), &["alarm", "show"]);
    assert_eq!(code, 0);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["wake_up"]["time"], "07:05");
    assert_eq!(report["wake_up"]["intensity"], "strong");
    assert_eq!(report["wake_up"]["state"], "enabled");
    assert_eq!(report["sleep"]["state"], "disabled");
}

#[test]
fn test_alarm_disable_persists() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["alarm", "sleep", "22", "30"]);
    let (code, stdout, _) = run_cli(home.path(), &["alarm", "disable", "sleep"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("睡眠提醒已禁用"));

    let (_, stdout, _) = run_cli(home.path(), &["alarm", "show"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["sleep"]["time"], "22:30");
    assert_eq!(report["sleep"]["state"], "disabled");
}

#[test]
fn test_alarm_invalid_time_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["alarm", "wake", "25", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_enable_without_time_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["alarm", "enable", "wake"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("请先设置起床时间"));
}

#[test]
fn test_news_start_prints_notification() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["news", "start"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("开始播放新闻"));
    assert!(stdout.contains(r#""type":"news","action":"start""#));
}

#[test]
fn test_tool_list() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["tool", "list"]);
    assert_eq!(code, 0);
    let tools: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert!(tools
        .iter()
        .any(|t| t["name"] == "self.meditation.start"));
}

#[test]
fn test_tool_call_status() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["tool", "call", "self.pomodoro.get_status"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["state"], "idle");
    assert_eq!(status["is_running"], false);
}

#[test]
fn test_tool_call_unknown_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["tool", "call", "self.lamp.on"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Malformed command"));
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "pomodoro.work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "pomodoro.work_minutes", "50"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "pomodoro.work_minutes"]);
    assert_eq!(stdout.trim(), "50");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "pomodoro.work_minutes", "0"]);
    assert_eq!(code, 1);
    let (code, _, _) = run_cli(home.path(), &["config", "get", "no.such_key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_and_reset() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "meditation.default_minutes", "15"]);
    let (code, stdout, _) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["meditation"]["default_minutes"], 15);

    let (code, _, _) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "meditation.default_minutes"]);
    assert_eq!(stdout.trim(), "10");
}

#[test]
fn test_run_executes_stdin_commands() {
    let home = tempfile::tempdir().unwrap();
    let input = concat!(
        r#"{"name":"self.meditation.start","arguments":{"duration_minutes":3}}"#,
        "\n",
        r#"{"name":"self.meditation.get_status"}"#,
        "\n",
        "button\n",
        "not json\n",
    );
    let lines = run_device(home.path(), input);

    assert_eq!(lines[0]["name"], "self.meditation.start");
    assert_eq!(lines[0]["reply"], "冥想定时器已启动，时长 3 分钟");
    assert_eq!(lines[1]["reply"]["state"], "running");
    assert_eq!(lines[1]["reply"]["remaining_minutes"], 3);
    assert_eq!(lines[2]["button"]["dismissed"], false);
    assert!(lines[3]["error"].is_string());
}
