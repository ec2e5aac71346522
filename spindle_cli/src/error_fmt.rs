//! Human-readable error descriptions and structured JSON error formatting.

use crate::run::{RunAbort, abort_reason_name};

/// First error of type `T` anywhere in the report's chain.
fn find<T: std::error::Error + 'static>(err: &eyre::Report) -> Option<&T> {
    err.chain().find_map(|e| e.downcast_ref::<T>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use spindle_core::error::{BuildError, SpindleError};

    if let Some(abort) = find::<RunAbort>(err) {
        return match abort {
            RunAbort::Estop { ticks } => format!(
                "What happened: Emergency stop was triggered (tick {ticks}); spindle output forced off.\nLikely causes: E-stop button pressed or input active.\nHow to fix: Release E-stop, check wiring, then start a new run."
            ),
            RunAbort::Interlock { ticks } => format!(
                "What happened: Safety interlock paused the spindle (tick {ticks}) and a feed-hold was requested.\nLikely causes: Guard door open or another interlock input active.\nHow to fix: Close the guard, clear the interlock, then resume."
            ),
            RunAbort::MaxTicks { max_ticks } => format!(
                "What happened: Spindle did not reach speed within {max_ticks} ticks.\nLikely causes: Small ramp.increment_rpm, long ramp.delay_ms, or runner.max_ticks too low.\nHow to fix: Raise runner.max_ticks or tune [ramp] in the config."
            ),
            RunAbort::Interrupted => {
                "What happened: Run interrupted; spindle stopped.\nLikely causes: Ctrl-C or termination signal.\nHow to fix: Start a new run when ready.".to_string()
            }
        };
    }

    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingPwm => {
                "What happened: No PWM driver was provided to the spindle controller.\nLikely causes: PWM peripheral failed to initialize or was not wired into the builder.\nHow to fix: Ensure the PWM backend is created and passed via with_pwm(...).".to_string()
            }
            BuildError::MissingOutputs => {
                "What happened: Enable/direction outputs were not provided.\nLikely causes: GPIO lines failed to open.\nHow to fix: Check [pins] and GPIO permissions.".to_string()
            }
            BuildError::MissingMachine | BuildError::MissingQueue => format!(
                "What happened: Spindle controller is not fully wired ({be}).\nLikely causes: Internal assembly error.\nHow to fix: Re-run with --log-level=debug and report the output."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(se) = find::<SpindleError>(err) {
        return match se {
            SpindleError::Config(msg) => format!(
                "What happened: Invalid configuration: {msg}.\nLikely causes: Out-of-range or inconsistent values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            SpindleError::InvalidRampConfiguration => {
                "What happened: A ramp step was due but the ramp increment is not positive.\nLikely causes: ramp.increment_rpm set to 0 at runtime.\nHow to fix: Use a positive ramp.increment_rpm.".to_string()
            }
            SpindleError::ActuatorWrite(detail) => format!(
                "What happened: PWM duty write failed ({detail}).\nLikely causes: PWM peripheral not enabled or duty out of range.\nHow to fix: Check the PWM overlay/channel and the [pwm] duty values."
            ),
            SpindleError::Output(detail) => format!(
                "What happened: Spindle enable/direction output failed ({detail}); spindle forced off.\nLikely causes: GPIO wiring or permissions.\nHow to fix: Check [pins] and GPIO access."
            ),
            SpindleError::QueueFull | SpindleError::Queue(_) => format!(
                "What happened: Planner queue rejected the spindle command ({se}).\nLikely causes: Too many commands pending.\nHow to fix: Let queued motion drain and retry."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file ({msg}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file."
        );
    }
    if lower.contains("parse config") {
        return format!(
            "What happened: Config file is not valid TOML for this tool ({msg}).\nLikely causes: Typo in a key, wrong value type, or unknown curve name.\nHow to fix: Compare against etc/spindle.toml."
        );
    }
    if lower.contains("open spindle pins") || lower.contains("open pwm") || lower.contains("[pins]") {
        return "What happened: Failed to initialize spindle hardware.\nLikely causes: Incorrect pin numbers, missing [pins] section, or insufficient GPIO/PWM permissions.\nHow to fix: Fix [pins] in the config; ensure the process can access GPIO and PWM.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for run aborts; everything else exits 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match find::<RunAbort>(err) {
        Some(RunAbort::Estop { .. }) => 2,
        Some(RunAbort::Interlock { .. }) => 3,
        Some(RunAbort::MaxTicks { .. }) => 4,
        Some(RunAbort::Interrupted) => 5,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(abort) = find::<RunAbort>(err) {
        let msg = humanize(err);
        let reason = abort_reason_name(abort);
        let obj = match abort {
            RunAbort::Estop { ticks } | RunAbort::Interlock { ticks } => {
                json!({ "reason": reason, "details": { "ticks": ticks }, "message": msg })
            }
            RunAbort::MaxTicks { max_ticks } => {
                json!({ "reason": reason, "details": { "max_ticks": max_ticks }, "message": msg })
            }
            RunAbort::Interrupted => json!({ "reason": reason, "message": msg }),
        };
        return obj.to_string();
    }

    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
