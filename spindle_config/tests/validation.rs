use rstest::rstest;
use spindle_config::{Curve, load_file, load_toml};
use std::fs;
use tempfile::tempdir;

const VALID: &str = r#"
[pwm]
channel = 1
frequency_hz = 100.0
duty_off = 0.1

[pwm.cw]
speed_lo = 1000.0
speed_hi = 24000.0
duty_lo = 0.125
duty_hi = 0.2

[pwm.ccw]
speed_lo = 500.0
speed_hi = 12000.0
duty_lo = 0.05
duty_hi = 0.1

[ramp]
increment_rpm = 150.0
delay_ms = 20

[pins]
enable = 17
direction = 27

[runner]
tick_ms = 5
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(VALID).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.pwm.ccw.speed_hi, 12000.0);
    assert_eq!(cfg.ramp.increment_rpm, 150.0);
    assert_eq!(cfg.ramp.delay_ms, 20);
    assert_eq!(cfg.pins.as_ref().map(|p| p.enable), Some(17));
    assert_eq!(cfg.runner.tick_ms, 5);
    assert_eq!(cfg.runner.max_ticks, 10_000);
}

#[rstest]
#[case("[ramp]\nincrement_rpm = 0.0\n", "ramp.increment_rpm must be > 0")]
#[case("[ramp]\nincrement_rpm = -5.0\n", "ramp.increment_rpm must be > 0")]
#[case(
    "[pwm.cw]\nspeed_lo = 2000.0\nspeed_hi = 1000.0\nduty_lo = 0.1\nduty_hi = 0.2\n",
    "pwm.cw.speed_lo must be < speed_hi"
)]
#[case(
    "[pwm.ccw]\nspeed_lo = 0.0\nspeed_hi = 1000.0\nduty_lo = 0.3\nduty_hi = 0.2\n",
    "pwm.ccw.duty_lo must be <= duty_hi"
)]
#[case(
    "[pwm.cw]\nspeed_lo = 0.0\nspeed_hi = 1000.0\nduty_lo = 0.1\nduty_hi = 1.5\n",
    "pwm.cw duties must be in [0.0, 1.0]"
)]
#[case("[pwm]\nduty_off = 2.0\n", "pwm.duty_off must be in [0.0, 1.0]")]
#[case("[mapping]\ncurve = \"cubic\"\n", "mapping.cubic is required")]
#[case("[runner]\ntick_ms = 0\n", "runner.tick_ms must be >= 1")]
#[case("[pins]\nenable = 4\ndirection = 4\n", "must differ")]
#[case(
    "[pwm]\nchannel = 2\n[pins]\nenable = 17\ndirection = 27\n",
    "pwm.channel must be 0 or 1"
)]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_invalid_values(#[case] toml: &str, #[case] expected: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(expected),
        "error {err} did not mention {expected}"
    );
}

#[test]
fn cubic_array_form_parses() {
    let cfg = load_toml("[mapping]\ncurve = \"cubic\"\ncubic = [0.05, 1.0e-5, 0.0, 0.0]\n")
        .expect("parse TOML");
    assert_eq!(cfg.mapping.curve, Curve::Cubic);
    assert_eq!(cfg.mapping.cubic, Some([0.05, 1.0e-5, 0.0, 0.0]));
    cfg.validate().expect("valid");
}

#[test]
fn sim_backend_accepts_any_channel_without_pins() {
    let cfg = load_toml("[pwm]\nchannel = 5\n").expect("parse TOML");
    cfg.validate().expect("channel is only constrained when [pins] is set");
}

#[test]
fn pins_do_not_carry_a_second_channel() {
    let err = load_toml("[pins]\nenable = 17\ndirection = 27\npwm_channel = 0\n")
        .expect_err("stale pins.pwm_channel key");
    assert!(format!("{err:#}").contains("pwm_channel"), "{err:#}");
}

#[test]
fn unknown_curve_is_a_parse_error() {
    assert!(load_toml("[mapping]\ncurve = \"quadratic\"\n").is_err());
}

#[test]
fn load_file_reports_path_on_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    let err = load_file(&path).expect_err("missing file");
    assert!(format!("{err}").contains("nope.toml"));
}

#[test]
fn load_file_reads_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spindle.toml");
    fs::write(&path, VALID).unwrap();
    let cfg = load_file(&path).expect("load");
    cfg.validate().expect("valid");
    assert_eq!(cfg.pwm.cw.duty_hi, 0.2);
}
