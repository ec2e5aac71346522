//! Type-state builder for `Spindle` and generic `build_spindle` constructor.
//!
//! The builder enforces at compile time that PWM, outputs, machine state and
//! planner queue are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::time::Duration;

use spindle_traits::{
    DigitalOutput, MachineState, PlannerQueue, PwmDriver, SpindleCommand, SpindleMode,
};

use crate::config::{DirectionBand, DutyCurve, DutyMapping, PwmCfg, RampCfg};
use crate::controller::SpindleCore;
use crate::error::{BuildError, Result};
use crate::ramp::SpindleRuntimeState;
use crate::status::RampStatus;

type BoxedCore = SpindleCore<
    Box<dyn PwmDriver>,
    Box<dyn DigitalOutput>,
    Box<dyn MachineState>,
    Box<dyn PlannerQueue>,
>;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Public dynamic (boxed) spindle controller.
pub struct Spindle {
    pub(crate) inner: BoxedCore,
}

impl core::fmt::Debug for Spindle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Spindle")
            .field("mode", &self.inner.mode())
            .field("commanded_speed", &self.inner.commanded_speed())
            .field("applied_speed", &self.inner.previous_applied_speed())
            .finish()
    }
}

impl Spindle {
    /// Start building a Spindle.
    pub fn builder() -> SpindleBuilder<Missing, Missing, Missing, Missing> {
        SpindleBuilder::default()
    }

    pub fn mode(&self) -> SpindleMode {
        self.inner.mode()
    }

    pub fn commanded_speed(&self) -> f32 {
        self.inner.commanded_speed()
    }

    pub fn previous_applied_speed(&self) -> f32 {
        self.inner.previous_applied_speed()
    }

    pub fn last_duty(&self) -> Option<f32> {
        self.inner.last_duty()
    }

    pub fn is_converged(&self) -> bool {
        self.inner.is_converged()
    }

    pub fn state(&self) -> &SpindleRuntimeState {
        self.inner.state()
    }

    pub fn mapping(&self) -> &DutyMapping {
        self.inner.mapping()
    }

    pub fn set_ramp(&mut self, increment: f32, delay: Duration) {
        self.inner.set_ramp(increment, delay);
    }

    /// Queue a mode change behind pending motion.
    pub fn request_mode(&mut self, mode: SpindleMode) -> Result<()> {
        self.inner.request_mode(mode)
    }

    /// Apply a mode change now, bypassing the planner queue.
    pub fn request_mode_now(&mut self, mode: SpindleMode) -> Result<RampStatus> {
        self.inner.request_mode_now(mode)
    }

    /// Queue a speed change.
    pub fn request_speed(&mut self, speed: f32) -> Result<()> {
        self.inner.request_speed(speed)
    }

    /// Planner callback for a dequeued spindle command.
    pub fn execute_queued(&mut self, cmd: SpindleCommand) -> Result<RampStatus> {
        self.inner.execute_queued(cmd)
    }

    /// One control-loop tick.
    pub fn tick(&mut self) -> Result<RampStatus> {
        self.inner.tick()
    }

    /// Resume the remembered direction after a pause.
    pub fn resume_now(&mut self) -> Result<RampStatus> {
        self.inner.resume_now()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Spindle`. All fields are validated on `build()`.
pub struct SpindleBuilder<P, O, M, Q> {
    pwm: Option<Box<dyn PwmDriver>>,
    outputs: Option<(Box<dyn DigitalOutput>, Box<dyn DigitalOutput>)>,
    machine: Option<Box<dyn MachineState>>,
    queue: Option<Box<dyn PlannerQueue>>,
    pwm_cfg: Option<PwmCfg>,
    mapping: Option<DutyMapping>,
    ramp: Option<RampCfg>,
    _p: PhantomData<P>,
    _o: PhantomData<O>,
    _m: PhantomData<M>,
    _q: PhantomData<Q>,
}

impl Default for SpindleBuilder<Missing, Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            pwm: None,
            outputs: None,
            machine: None,
            queue: None,
            pwm_cfg: None,
            mapping: None,
            ramp: None,
            _p: PhantomData,
            _o: PhantomData,
            _m: PhantomData,
            _q: PhantomData,
        }
    }
}

fn validate_band(b: &DirectionBand) -> Result<()> {
    if !b.speed_lo.is_finite() || !b.speed_hi.is_finite() || b.speed_lo >= b.speed_hi {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "speed_lo must be < speed_hi",
        )));
    }
    if !(0.0..=1.0).contains(&b.duty_lo)
        || !(0.0..=1.0).contains(&b.duty_hi)
        || b.duty_lo > b.duty_hi
    {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "duties must satisfy 0 <= duty_lo <= duty_hi <= 1",
        )));
    }
    Ok(())
}

/// Validate configuration, construct a `SpindleCore` and initialize the outputs.
///
/// This is the single source of truth for validation and construction,
/// used by both `SpindleBuilder::try_build()` and `build_spindle()`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<P, O, M, Q>(
    pwm: P,
    enable: O,
    direction: O,
    machine: M,
    queue: Q,
    pwm_cfg: PwmCfg,
    mapping: DutyMapping,
    ramp: RampCfg,
) -> Result<SpindleCore<P, O, M, Q>>
where
    P: PwmDriver,
    O: DigitalOutput,
    M: MachineState,
    Q: PlannerQueue,
{
    // ── Validation ───────────────────────────────────────────────────────────
    validate_band(&mapping.cw)?;
    validate_band(&mapping.ccw)?;
    if !(0.0..=1.0).contains(&mapping.duty_off) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "duty_off must be in [0, 1]",
        )));
    }
    if let DutyCurve::Cubic(c) = mapping.curve
        && c.iter().any(|v| !v.is_finite())
    {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "cubic coefficients must be finite",
        )));
    }
    if !ramp.increment.is_finite() || ramp.increment <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "ramp increment must be > 0",
        )));
    }
    if !pwm_cfg.frequency_hz.is_finite() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pwm frequency must be finite",
        )));
    }

    let mut core = SpindleCore {
        pwm,
        enable,
        direction,
        machine,
        queue,
        pwm_cfg,
        mapping,
        state: SpindleRuntimeState::new(ramp),
    };
    core.init()?;
    Ok(core)
}

impl<P, O, M, Q> SpindleBuilder<P, O, M, Q> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Spindle> {
        let pwm = self
            .pwm
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPwm))?;
        let (enable, direction) = self
            .outputs
            .ok_or_else(|| eyre::Report::new(BuildError::MissingOutputs))?;
        let machine = self
            .machine
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMachine))?;
        let queue = self
            .queue
            .ok_or_else(|| eyre::Report::new(BuildError::MissingQueue))?;

        let inner = validate_and_build(
            pwm,
            enable,
            direction,
            machine,
            queue,
            self.pwm_cfg.unwrap_or_default(),
            self.mapping.unwrap_or_default(),
            self.ramp.unwrap_or_default(),
        )?;
        Ok(Spindle { inner })
    }

    pub fn with_pwm_cfg(mut self, cfg: PwmCfg) -> Self {
        self.pwm_cfg = Some(cfg);
        self
    }

    pub fn with_mapping(mut self, mapping: DutyMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn with_ramp(mut self, ramp: RampCfg) -> Self {
        self.ramp = Some(ramp);
        self
    }

    /// Take PWM, mapping and ramp settings from a loaded TOML config.
    pub fn apply_config(self, cfg: &spindle_config::Config) -> Self {
        self.with_pwm_cfg((&cfg.pwm).into())
            .with_mapping(cfg.into())
            .with_ramp((&cfg.ramp).into())
    }

    fn retag<P2, O2, M2, Q2>(self) -> SpindleBuilder<P2, O2, M2, Q2> {
        SpindleBuilder {
            pwm: self.pwm,
            outputs: self.outputs,
            machine: self.machine,
            queue: self.queue,
            pwm_cfg: self.pwm_cfg,
            mapping: self.mapping,
            ramp: self.ramp,
            _p: PhantomData,
            _o: PhantomData,
            _m: PhantomData,
            _q: PhantomData,
        }
    }
}

impl<O, M, Q> SpindleBuilder<Missing, O, M, Q> {
    pub fn with_pwm(mut self, pwm: impl PwmDriver + 'static) -> SpindleBuilder<Set, O, M, Q> {
        self.pwm = Some(Box::new(pwm));
        self.retag()
    }
}

impl<P, M, Q> SpindleBuilder<P, Missing, M, Q> {
    /// Enable and direction lines, in that order.
    pub fn with_outputs(
        mut self,
        enable: impl DigitalOutput + 'static,
        direction: impl DigitalOutput + 'static,
    ) -> SpindleBuilder<P, Set, M, Q> {
        self.outputs = Some((Box::new(enable), Box::new(direction)));
        self.retag()
    }
}

impl<P, O, Q> SpindleBuilder<P, O, Missing, Q> {
    pub fn with_machine(
        mut self,
        machine: impl MachineState + 'static,
    ) -> SpindleBuilder<P, O, Set, Q> {
        self.machine = Some(Box::new(machine));
        self.retag()
    }
}

impl<P, O, M> SpindleBuilder<P, O, M, Missing> {
    pub fn with_queue(mut self, queue: impl PlannerQueue + 'static) -> SpindleBuilder<P, O, M, Set> {
        self.queue = Some(Box::new(queue));
        self.retag()
    }
}

impl SpindleBuilder<Set, Set, Set, Set> {
    /// Build the controller; only available once every collaborator is set.
    pub fn build(self) -> Result<Spindle> {
        self.try_build()
    }
}

// ── Generic constructor (static dispatch) ────────────────────────────────────

/// Generic, statically dispatched alias.
pub type SpindleG<P, O, M, Q> = SpindleCore<P, O, M, Q>;

/// Build a statically dispatched controller without boxing.
#[allow(clippy::too_many_arguments)]
pub fn build_spindle<P, O, M, Q>(
    pwm: P,
    enable: O,
    direction: O,
    machine: M,
    queue: Q,
    pwm_cfg: PwmCfg,
    mapping: DutyMapping,
    ramp: RampCfg,
) -> Result<SpindleG<P, O, M, Q>>
where
    P: PwmDriver,
    O: DigitalOutput,
    M: MachineState,
    Q: PlannerQueue,
{
    validate_and_build(pwm, enable, direction, machine, queue, pwm_cfg, mapping, ramp)
}
