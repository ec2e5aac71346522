#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use serde_json::json;
use spindle_config::Config;
use spindle_core::{Direction, DutyMapping, SpindleError, SpindleMode};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::run::{RunParams, RunReport};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = cli::JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if cli::JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    // Held until return so the file sink flushes before exit.
    let _log_guard = init_tracing(cli.json, &cli.log_level, &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            dir,
            rpm,
            estop_at,
            fault_at,
            print_steps,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }
            let params = RunParams {
                direction: dir.into(),
                rpm,
                estop_at,
                fault_at,
                print_steps,
            };
            let report = run::run_spindle(&cfg, &params, &shutdown)?;
            print_run_report(&report, cli.json);
        }
        Commands::Duty { dir, rpm, previous } => {
            let direction: Direction = dir.into();
            let mapping = DutyMapping::from(&cfg);
            let commanded = mapping.clamp_speed(direction, rpm);
            let duty = mapping.compute_duty(SpindleMode::from(direction), commanded, previous);
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "direction": direction_name(direction),
                        "requested_rpm": rpm,
                        "commanded_rpm": commanded,
                        "previous_rpm": previous,
                        "duty": duty,
                    })
                );
            } else {
                println!(
                    "{} {rpm:.0} rpm -> commanded {commanded:.0} rpm, duty {duty:.4}",
                    direction_name(direction)
                );
            }
        }
        Commands::SelfCheck => {
            let report = run::self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "status": "ok",
                        "backend": report.backend,
                        "frequency_hz": report.frequency_hz,
                        "duty_off": report.duty_off,
                    })
                );
            } else {
                println!(
                    "self-check ok (backend={}, pwm {:.0} Hz, off duty {:.3})",
                    report.backend, report.frequency_hz, report.duty_off
                );
            }
        }
    }
    Ok(())
}

/// Read, parse and validate the TOML config.
fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&text).wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(SpindleError::Config(e.to_string())))?;
    Ok(cfg)
}

fn init_tracing(
    json: bool,
    level: &str,
    logging: &spindle_config::Logging,
) -> Option<WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    }
    .with_filter(console_filter);

    let mut guard = None;
    let file_layer = logging.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "spindle.log".into(), std::ffi::OsStr::to_os_string);
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        let file_level = logging.level.as_deref().unwrap_or("info");
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(EnvFilter::new(file_level))
    });

    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();
    guard
}

fn direction_name(d: Direction) -> &'static str {
    match d {
        Direction::Cw => "cw",
        Direction::Ccw => "ccw",
        Direction::Off => "off",
    }
}

fn print_run_report(r: &RunReport, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "status": "converged",
                "direction": direction_name(r.direction),
                "requested_rpm": r.requested_rpm,
                "commanded_rpm": r.commanded_rpm,
                "applied_rpm": r.applied_rpm,
                "duty": r.duty,
                "ticks": r.ticks,
                "steps": r.steps,
            })
        );
    } else {
        println!(
            "{} converged at {:.0} rpm (requested {:.0}) in {} steps / {} ticks, duty {}",
            direction_name(r.direction),
            r.applied_rpm,
            r.requested_rpm,
            r.steps,
            r.ticks,
            r.duty.map_or_else(|| "-".to_string(), |d| format!("{d:.4}"))
        );
    }
}
