use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

const VALID: &str = r#"
[pwm]
channel = 1
frequency_hz = 1000.0
duty_off = 0.0

[pwm.cw]
speed_lo = 1000.0
speed_hi = 24000.0
duty_lo = 0.1
duty_hi = 0.9

[pwm.ccw]
speed_lo = 1000.0
speed_hi = 12000.0
duty_lo = 0.1
duty_hi = 0.9

[ramp]
increment_rpm = 500.0
delay_ms = 20

[runner]
tick_ms = 10
max_ticks = 1000
"#;

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("spindle.toml");
    fs::write(&path, body).unwrap();
    path
}

fn spindle(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("spindle").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--rpm", "3000"], 0, "converged at 3000 rpm", "stdout")]
#[case(&["run", "--dir", "ccw", "--rpm", "20000"], 0, "converged at 12000 rpm", "stdout")]
#[case(&["run"], 2, "required", "stderr")]
#[case(&["run", "--rpm", "3000", "--estop-at", "3"], 2, "Emergency stop", "stderr")]
#[case(&["run", "--rpm", "3000", "--fault-at", "2"], 3, "interlock", "stderr")]
#[case(&["duty", "--rpm", "12000"], 0, "duty 0.4826", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let assert = spindle(&cfg).args(args).assert().code(exit_code);

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn run_json_reports_converged_speed() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let out = spindle(&cfg)
        .args(["--json", "run", "--rpm", "4000"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["status"], "converged");
    assert_eq!(v["applied_rpm"], 4000.0);
    assert_eq!(v["commanded_rpm"], 4000.0);
    assert_eq!(v["steps"], 8);
}

#[test]
fn estop_json_error_carries_reason() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let out = spindle(&cfg)
        .args(["--json", "run", "--rpm", "9000", "--estop-at", "0"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    // Log lines may precede it; the error object is always last.
    let stderr = String::from_utf8(out.stderr).unwrap();
    let last = stderr.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "Estop");
    assert_eq!(v["details"]["ticks"], 1);
}

#[test]
fn too_few_ticks_exits_with_code_4() {
    let dir = tempdir().unwrap();
    let body = VALID.replace("max_ticks = 1000", "max_ticks = 2");
    let cfg = write_config(&dir, &body);

    spindle(&cfg)
        .args(["run", "--rpm", "20000"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("did not reach speed"));
}

#[rstest]
#[case("increment_rpm = 500.0", "increment_rpm = 0.0", "increment_rpm")]
#[case("duty_hi = 0.9", "duty_hi = 1.5", "duties must be in")]
#[case("tick_ms = 10", "tick_ms = 0", "tick_ms")]
fn invalid_config_is_explained(#[case] from: &str, #[case] to: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, &VALID.replacen(from, to, 1));

    spindle(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_file_is_explained() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    spindle(&missing)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[test]
fn file_log_sink_writes_json_lines() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("spindle.log");
    let body = format!(
        "{VALID}\n[logging]\nfile = {:?}\nlevel = \"debug\"\nrotation = \"never\"\n",
        log.display().to_string()
    );
    let cfg = write_config(&dir, &body);

    spindle(&cfg).args(["run", "--rpm", "2000"]).assert().success();

    let text = fs::read_to_string(&log).unwrap();
    let first = text.lines().next().expect("at least one log line");
    let v: serde_json::Value = serde_json::from_str(first).unwrap();
    assert!(v.get("level").is_some());
}
