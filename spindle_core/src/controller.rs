//! The spindle controller (`SpindleCore`).
//!
//! Owns the runtime state and orchestrates every invocation:
//! safety gate → persist mode → enable/direction outputs → speed clamp →
//! soft-start ramp. Queued and immediate entry points both funnel into the
//! same `&mut self` execution path, so they can never interleave mid-update.

use std::time::Duration;

use eyre::WrapErr;
use spindle_traits::{
    DigitalOutput, MachineState, PlannerQueue, PwmDriver, SpindleCommand, SpindleMode,
};

use crate::config::{DutyMapping, PwmCfg};
use crate::error::Result;
use crate::hw_error::{HwSite, map_hw_error};
use crate::ramp::{SoftStartRamper, SpindleRuntimeState};
use crate::safety::{self, SafetySignals};
use crate::status::RampStatus;

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct SpindleCore<P, O, M, Q>
where
    P: PwmDriver,
    O: DigitalOutput,
    M: MachineState,
    Q: PlannerQueue,
{
    pub(crate) pwm: P,
    pub(crate) enable: O,
    pub(crate) direction: O,
    pub(crate) machine: M,
    pub(crate) queue: Q,
    pub(crate) pwm_cfg: PwmCfg,
    pub(crate) mapping: DutyMapping,
    pub(crate) state: SpindleRuntimeState,
}

impl<P, O, M, Q> core::fmt::Debug for SpindleCore<P, O, M, Q>
where
    P: PwmDriver,
    O: DigitalOutput,
    M: MachineState,
    Q: PlannerQueue,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpindleCore")
            .field("mode", &self.state.mode)
            .field("commanded_speed", &self.state.commanded_speed)
            .field("applied_speed", &self.state.previous_applied_speed())
            .finish()
    }
}

impl<P, O, M, Q> SpindleCore<P, O, M, Q>
where
    P: PwmDriver,
    O: DigitalOutput,
    M: MachineState,
    Q: PlannerQueue,
{
    /// Program the PWM carrier, park the output at off duty and drop enable.
    pub(crate) fn init(&mut self) -> Result<()> {
        let hz = self.pwm_cfg.frequency_hz.max(0.0);
        let channel = self.pwm_cfg.channel;
        self.pwm
            .set_frequency(channel, hz)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, HwSite::Pwm)))
            .wrap_err("set pwm frequency")?;
        self.pwm
            .set_duty(channel, self.mapping.duty_off)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, HwSite::Pwm)))
            .wrap_err("write off duty")?;
        self.enable
            .clear()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, HwSite::Output)))
            .wrap_err("clear enable")?;
        tracing::info!(channel, frequency_hz = hz, "spindle initialized");
        Ok(())
    }

    /// Current logical mode (may carry PAUSED).
    pub fn mode(&self) -> SpindleMode {
        self.state.mode
    }

    /// Most recently requested speed, after band clamping.
    pub fn commanded_speed(&self) -> f32 {
        self.state.commanded_speed
    }

    /// Speed the actuator is currently driven at.
    pub fn previous_applied_speed(&self) -> f32 {
        self.state.previous_applied_speed()
    }

    /// Last duty written by the ramp, if any.
    pub fn last_duty(&self) -> Option<f32> {
        self.state.last_duty()
    }

    /// True once the applied speed has reached the commanded speed (or the
    /// spindle is stopped).
    #[allow(clippy::float_cmp)]
    pub fn is_converged(&self) -> bool {
        if !self.state.mode.is_running() {
            return self.state.previous_applied_speed() == 0.0;
        }
        self.state.previous_applied_speed() == self.state.commanded_speed
    }

    pub fn state(&self) -> &SpindleRuntimeState {
        &self.state
    }

    pub fn mapping(&self) -> &DutyMapping {
        &self.mapping
    }

    /// Replace ramp increment and delay. Validated when the next step is due.
    pub fn set_ramp(&mut self, increment: f32, delay: Duration) {
        self.state.ramp_increment = increment;
        self.state.ramp_delay = delay;
    }

    /// Merge the PAUSED flag from the current state into a requested mode.
    fn merge_pause(&self, mode: SpindleMode) -> SpindleMode {
        if self.state.mode.is_paused() {
            mode.paused()
        } else {
            mode
        }
    }

    fn enqueue(&mut self, cmd: SpindleCommand) -> Result<()> {
        self.queue
            .queue_command(cmd)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, HwSite::Queue)))
            .wrap_err("queue spindle command")
    }

    /// Queue a mode change behind pending motion.
    pub fn request_mode(&mut self, mode: SpindleMode) -> Result<()> {
        let mode = if self.state.mode.is_paused() {
            mode.paused()
        } else {
            self.machine.cycle_start();
            mode
        };
        tracing::debug!(?mode, "queue spindle mode");
        self.enqueue(SpindleCommand::Control(mode))
    }

    /// Apply a mode change now, bypassing the planner queue.
    pub fn request_mode_now(&mut self, mode: SpindleMode) -> Result<RampStatus> {
        let mode = self.merge_pause(mode);
        let speed = self.state.commanded_speed;
        self.execute(mode, speed)
    }

    /// Queue a speed change; speed changes are always sequenced with motion.
    pub fn request_speed(&mut self, speed: f32) -> Result<()> {
        tracing::debug!(speed, "queue spindle speed");
        self.enqueue(SpindleCommand::Speed(speed))
    }

    /// Planner callback: run a command that has reached the head of the queue.
    pub fn execute_queued(&mut self, cmd: SpindleCommand) -> Result<RampStatus> {
        match cmd {
            SpindleCommand::Control(mode) => {
                let speed = self.state.commanded_speed;
                self.execute(mode, speed)
            }
            SpindleCommand::Speed(speed) => self.execute_speed(speed),
        }
    }

    /// Control-loop re-entry: re-evaluate the persisted mode and speed so a
    /// ramp in progress advances and safety signals are sampled.
    pub fn tick(&mut self) -> Result<RampStatus> {
        let mode = self.state.mode;
        let speed = self.state.commanded_speed;
        self.execute(mode, speed)
    }

    /// Clear PAUSED and run the remembered direction immediately.
    pub fn resume_now(&mut self) -> Result<RampStatus> {
        let mode = self.state.mode.raw();
        let speed = self.state.commanded_speed;
        tracing::info!(?mode, "spindle resume");
        self.execute(mode, speed)
    }

    /// Full mode execution path.
    pub(crate) fn execute(&mut self, mode: SpindleMode, speed: f32) -> Result<RampStatus> {
        let signals = SafetySignals::sample(&self.machine);
        let resolution = safety::resolve(mode, signals);
        tracing::debug!(
            requested = ?mode,
            effective = ?resolution.effective,
            raw = ?resolution.raw,
            estop = signals.estop_active,
            fault = signals.safety_fault_active,
            "spindle mode resolved"
        );

        if resolution.trigger_hold {
            tracing::info!(mode = ?resolution.effective, "spindle paused by interlock; requesting feed-hold");
            self.machine.request_hold();
            self.machine.request_status_report();
        }

        self.state.mode = resolution.effective;
        self.state.commanded_speed = speed;

        let outputs = self.drive_outputs(resolution.raw);

        if resolution.effective.is_running() {
            self.state.commanded_speed = self
                .mapping
                .clamp_speed(resolution.effective.direction(), speed);
        }

        // Any output failure drops the spindle to off.
        let target = if outputs.is_err() {
            SpindleMode::OFF
        } else {
            resolution.effective
        };
        let status = self.run_ramp(target);
        outputs?;
        status
    }

    /// Speed execution path: records the new speed against the persisted mode.
    ///
    /// E-stop, interlock or pause hold the output off for this invocation
    /// without touching the persisted mode or requesting a hold.
    pub(crate) fn execute_speed(&mut self, speed: f32) -> Result<RampStatus> {
        let signals = SafetySignals::sample(&self.machine);
        let mut mode = self.state.mode.raw();
        if signals.estop_active || signals.safety_fault_active || self.state.mode.is_paused() {
            mode = SpindleMode::OFF;
        }

        self.state.commanded_speed = speed;
        if mode.is_running() {
            self.state.commanded_speed = self.mapping.clamp_speed(mode.direction(), speed);
        }
        tracing::debug!(?mode, speed = self.state.commanded_speed, "spindle speed");
        self.run_ramp(mode)
    }

    fn run_ramp(&mut self, target: SpindleMode) -> Result<RampStatus> {
        let ramper = SoftStartRamper {
            channel: self.pwm_cfg.channel,
            mapping: &self.mapping,
        };
        let speed = self.state.commanded_speed;
        ramper.step(&mut self.pwm, &mut self.state, target, speed)
    }

    /// Drive enable/direction from the raw (never paused) mode.
    fn drive_outputs(&mut self, raw: SpindleMode) -> Result<()> {
        use spindle_traits::Direction;
        let res = match raw.direction() {
            Direction::Cw => self.enable.set().and_then(|()| self.direction.clear()),
            Direction::Ccw => self.enable.set().and_then(|()| self.direction.set()),
            Direction::Off => self.enable.clear(),
        };
        res.map_err(|e| {
            let mapped = map_hw_error(&*e, HwSite::Output);
            tracing::warn!(error = %mapped, "spindle output failed; forcing off");
            if !raw.is_off()
                && let Err(e2) = self.enable.clear()
            {
                tracing::warn!(error = %e2, "clear enable failed");
            }
            eyre::Report::new(mapped)
        })
    }
}
