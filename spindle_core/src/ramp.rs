//! Soft-start ramp: moves the applied speed toward the target one bounded
//! increment at a time, gated by the PWM driver's soft-start timer.
//!
//! There is no blocking wait. While the delay runs, an invocation is a no-op
//! and the control loop simply calls again on its next tick.

use std::time::Duration;

use spindle_traits::{PwmDriver, SpindleMode};

use crate::config::{DutyMapping, RampCfg};
use crate::error::{Result, SpindleError};
use crate::hw_error::{HwSite, map_hw_error};
use crate::status::RampStatus;

/// Persistent spindle state, owned by the controller.
///
/// `previous_applied_speed` is private to this module: only a ramp step may
/// move it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpindleRuntimeState {
    pub mode: SpindleMode,
    pub commanded_speed: f32,
    previous_applied_speed: f32,
    pub ramp_increment: f32,
    pub ramp_delay: Duration,
    last_duty: Option<f32>,
}

impl SpindleRuntimeState {
    pub fn new(ramp: RampCfg) -> Self {
        Self {
            mode: SpindleMode::OFF,
            commanded_speed: 0.0,
            previous_applied_speed: 0.0,
            ramp_increment: ramp.increment,
            ramp_delay: ramp.delay,
            last_duty: None,
        }
    }

    /// Last speed actually written to the actuator.
    #[inline]
    pub fn previous_applied_speed(&self) -> f32 {
        self.previous_applied_speed
    }

    /// Last duty successfully written by the ramp.
    #[inline]
    pub fn last_duty(&self) -> Option<f32> {
        self.last_duty
    }
}

/// One ramp evaluation against a mapping table and PWM channel.
#[derive(Debug, Clone, Copy)]
pub struct SoftStartRamper<'a> {
    pub channel: u8,
    pub mapping: &'a DutyMapping,
}

impl SoftStartRamper<'_> {
    #[allow(clippy::float_cmp)]
    pub fn step<P: PwmDriver + ?Sized>(
        &self,
        pwm: &mut P,
        state: &mut SpindleRuntimeState,
        target_mode: SpindleMode,
        target_speed: f32,
    ) -> Result<RampStatus> {
        let prev = state.previous_applied_speed;

        // Stopping is never ramped.
        if target_mode.is_off() || target_mode.is_paused() {
            pwm.end_soft_start();
            let duty = self.mapping.compute_duty(target_mode, target_speed, prev);
            state.previous_applied_speed = 0.0;
            pwm.set_duty(self.channel, duty)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e, HwSite::Pwm)))?;
            state.last_duty = Some(duty);
            tracing::debug!(duty, "spindle stopped");
            return Ok(RampStatus::Stopped { duty });
        }

        if target_speed == prev {
            return Ok(RampStatus::Converged);
        }

        if pwm.soft_start_enabled() && !pwm.soft_start_elapsed(state.ramp_delay) {
            tracing::trace!(prev, target_speed, "ramp delay pending");
            return Ok(RampStatus::Waiting);
        }

        if state.ramp_increment.is_nan() || state.ramp_increment <= 0.0 {
            return Err(eyre::Report::new(SpindleError::InvalidRampConfiguration));
        }

        pwm.end_soft_start();

        let delta = if target_speed > prev {
            state.ramp_increment
        } else {
            -state.ramp_increment
        };
        let next = if (target_speed - prev).abs() < state.ramp_increment {
            target_speed
        } else {
            prev + delta
        };

        let duty = self.mapping.compute_duty(target_mode, next, prev);
        let written = pwm.set_duty(self.channel, duty);
        // Restart the delay even on a rejected write so a failing driver is not
        // hammered every tick.
        pwm.begin_soft_start();
        written.map_err(|e| eyre::Report::new(map_hw_error(&*e, HwSite::Pwm)))?;

        state.previous_applied_speed = next;
        state.last_duty = Some(duty);
        tracing::debug!(from = prev, to = next, target_speed, duty, "ramp step");
        Ok(RampStatus::Stepped { speed: next, duty })
    }
}
