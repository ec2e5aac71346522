//! Hardware assembly and the cooperative control loop behind `spindle run`.
//!
//! Machine state and the planner queue are always simulated here: the CLI
//! stands in for the motion controller, and `--estop-at`/`--fault-at` flip
//! the simulated safety inputs on a chosen tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::{Result, WrapErr};
use spindle_config::Config;
use spindle_core::{Direction, RampStatus, Spindle, SpindleMode};
use spindle_hardware::{SimulatedMachine, SimulatedPlanner};
use spindle_traits::{Clock, MachineState};

#[cfg(feature = "hardware")]
type LoopClock = spindle_traits::MonotonicClock;
#[cfg(not(feature = "hardware"))]
type LoopClock = spindle_traits::ManualClock;

/// Why a run ended before the spindle reached its speed.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RunAbort {
    #[error("emergency stop active after {ticks} ticks")]
    Estop { ticks: u64 },
    #[error("interlock paused the spindle after {ticks} ticks")]
    Interlock { ticks: u64 },
    #[error("speed not reached within {max_ticks} ticks")]
    MaxTicks { max_ticks: u64 },
    #[error("interrupted")]
    Interrupted,
}

pub fn abort_reason_name(r: &RunAbort) -> &'static str {
    match r {
        RunAbort::Estop { .. } => "Estop",
        RunAbort::Interlock { .. } => "Interlock",
        RunAbort::MaxTicks { .. } => "MaxTicks",
        RunAbort::Interrupted => "Interrupted",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub direction: Direction,
    pub rpm: f32,
    pub estop_at: Option<u64>,
    pub fault_at: Option<u64>,
    pub print_steps: bool,
}

/// Final snapshot of a converged run.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub direction: Direction,
    pub requested_rpm: f32,
    pub commanded_rpm: f32,
    pub applied_rpm: f32,
    pub duty: Option<f32>,
    pub ticks: u64,
    pub steps: u32,
}

/// What `self-check` verified.
#[derive(Debug, Clone, Copy)]
pub struct SelfCheckReport {
    pub backend: &'static str,
    pub frequency_hz: f32,
    pub duty_off: f32,
}

struct Rig {
    spindle: Spindle,
    machine: SimulatedMachine,
    planner: SimulatedPlanner,
    clock: LoopClock,
}

#[cfg(not(feature = "hardware"))]
const BACKEND: &str = "sim";
#[cfg(feature = "hardware")]
const BACKEND: &str = "hardware";

#[cfg(not(feature = "hardware"))]
fn assemble(cfg: &Config) -> Result<Rig> {
    use spindle_hardware::{SimulatedPin, SimulatedPwm};

    let clock = LoopClock::new();
    let machine = SimulatedMachine::new();
    let planner = SimulatedPlanner::new();
    let spindle = Spindle::builder()
        .apply_config(cfg)
        .with_pwm(SimulatedPwm::new(clock.clone()))
        .with_outputs(SimulatedPin::new(), SimulatedPin::new())
        .with_machine(machine.clone())
        .with_queue(planner.clone())
        .build()
        .wrap_err("build spindle (simulated)")?;
    Ok(Rig {
        spindle,
        machine,
        planner,
        clock,
    })
}

#[cfg(feature = "hardware")]
fn assemble(cfg: &Config) -> Result<Rig> {
    use spindle_hardware::rpi::{GpioLine, HardwarePwm};

    let pins = cfg
        .pins
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing [pins] section for the hardware backend"))?;
    let pwm = HardwarePwm::new(cfg.pwm.channel, cfg.pwm.frequency_hz, cfg.pwm.duty_off)
        .wrap_err("open pwm")?;
    let enable = GpioLine::new(pins.enable).wrap_err("open spindle pins")?;
    let direction = GpioLine::new(pins.direction).wrap_err("open spindle pins")?;
    let machine = SimulatedMachine::new();
    let planner = SimulatedPlanner::new();
    let spindle = Spindle::builder()
        .apply_config(cfg)
        .with_pwm(pwm)
        .with_outputs(enable, direction)
        .with_machine(machine.clone())
        .with_queue(planner.clone())
        .build()
        .wrap_err("build spindle (hardware)")?;
    Ok(Rig {
        spindle,
        machine,
        planner,
        clock: LoopClock::new(),
    })
}

fn note_step(status: RampStatus, steps: &mut u32, print: bool) {
    if let RampStatus::Stepped { speed, duty } = status {
        *steps = steps.saturating_add(1);
        if print {
            println!("step {steps}: {speed:.0} rpm, duty {duty:.4}");
        }
    }
}

/// Queue direction and speed, drain the planner, then tick until the ramp converges.
pub fn run_spindle(cfg: &Config, params: &RunParams, shutdown: &AtomicBool) -> Result<RunReport> {
    let Rig {
        mut spindle,
        machine,
        planner,
        clock,
    } = assemble(cfg)?;

    spindle.request_speed(params.rpm)?;
    spindle.request_mode(SpindleMode::from(params.direction))?;

    let mut steps = 0u32;
    while let Some(cmd) = planner.pop_front() {
        let status = spindle.execute_queued(cmd)?;
        note_step(status, &mut steps, params.print_steps);
    }

    let tick = Duration::from_millis(cfg.runner.tick_ms);
    tracing::info!(
        direction = ?params.direction,
        rpm = params.rpm,
        tick_ms = cfg.runner.tick_ms,
        "spindle run start"
    );
    for n in 0..cfg.runner.max_ticks {
        if shutdown.load(Ordering::Relaxed) {
            spindle.request_mode_now(SpindleMode::OFF)?;
            return Err(RunAbort::Interrupted.into());
        }
        if params.estop_at == Some(n) {
            machine.set_estop(true);
        }
        if params.fault_at == Some(n) {
            machine.set_safety_fault(true);
        }

        clock.sleep(tick);
        let status = spindle.tick()?;
        note_step(status, &mut steps, params.print_steps);

        if machine.estop_active() {
            tracing::error!(ticks = n + 1, "estop during run");
            return Err(RunAbort::Estop { ticks: n + 1 }.into());
        }
        if spindle.mode().is_paused() {
            tracing::error!(ticks = n + 1, "interlock paused spindle");
            return Err(RunAbort::Interlock { ticks: n + 1 }.into());
        }
        if status == RampStatus::Converged {
            tracing::info!(rpm = spindle.previous_applied_speed(), ticks = n + 1, "spindle at speed");
            return Ok(RunReport {
                direction: params.direction,
                requested_rpm: params.rpm,
                commanded_rpm: spindle.commanded_speed(),
                applied_rpm: spindle.previous_applied_speed(),
                duty: spindle.last_duty(),
                ticks: n + 1,
                steps,
            });
        }
    }

    spindle.request_mode_now(SpindleMode::OFF)?;
    Err(RunAbort::MaxTicks {
        max_ticks: cfg.runner.max_ticks,
    }
    .into())
}

/// Build the controller against the configured backend and park it at off duty.
pub fn self_check(cfg: &Config) -> Result<SelfCheckReport> {
    let mut rig = assemble(cfg)?;
    let status = rig.spindle.request_mode_now(SpindleMode::OFF)?;
    Ok(SelfCheckReport {
        backend: BACKEND,
        frequency_hz: cfg.pwm.frequency_hz.max(0.0),
        duty_off: status.duty().unwrap_or(cfg.pwm.duty_off),
    })
}
