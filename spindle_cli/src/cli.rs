//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use spindle_core::Direction;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "spindle", version, about = "Spindle control CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/spindle.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Running direction accepted on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DirArg {
    /// Clockwise (M3)
    Cw,
    /// Counter-clockwise (M4)
    Ccw,
}

impl From<DirArg> for Direction {
    fn from(d: DirArg) -> Self {
        match d {
            DirArg::Cw => Direction::Cw,
            DirArg::Ccw => Direction::Ccw,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Spin up to a speed through the planner queue and ramp until converged
    Run {
        /// Direction of rotation
        #[arg(long, value_enum, default_value = "cw")]
        dir: DirArg,
        /// Target speed in RPM (clamped to the configured band)
        #[arg(long)]
        rpm: f32,
        /// Simulate an emergency stop on this control-loop tick
        #[arg(long, value_name = "TICK")]
        estop_at: Option<u64>,
        /// Simulate an interlock fault (e.g. door open) on this control-loop tick
        #[arg(long, value_name = "TICK")]
        fault_at: Option<u64>,
        /// Print every ramp step as it is written
        #[arg(long, action = ArgAction::SetTrue)]
        print_steps: bool,
    },
    /// Show the duty the mapper produces for a speed, without touching outputs
    Duty {
        #[arg(long, value_enum, default_value = "cw")]
        dir: DirArg,
        #[arg(long)]
        rpm: f32,
        /// Previously applied speed (decides whether the duty_lo floor applies)
        #[arg(long, default_value_t = 0.0)]
        previous: f32,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
