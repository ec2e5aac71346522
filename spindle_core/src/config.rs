//! Runtime configuration types for the spindle core.
//!
//! These are the structs used by `SpindleCore`. They are separate from the
//! TOML-deserialized config in `spindle_config`.

use std::time::Duration;

/// One direction's commandable speed band and duty range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionBand {
    pub speed_lo: f32,
    pub speed_hi: f32,
    pub duty_lo: f32,
    pub duty_hi: f32,
}

impl Default for DirectionBand {
    fn default() -> Self {
        Self {
            speed_lo: 1000.0,
            speed_hi: 24000.0,
            duty_lo: 0.125,
            duty_hi: 0.2,
        }
    }
}

/// Speed→duty curve. Chosen once at construction and never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DutyCurve {
    #[default]
    Linear,
    /// `duty = c0 + s*(c1 + s*(c2 + s*c3))`, independent of the speed band.
    Cubic([f32; 4]),
}

/// Read-only mapping table: per-direction bands, off duty and curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DutyMapping {
    pub cw: DirectionBand,
    pub ccw: DirectionBand,
    pub duty_off: f32,
    pub curve: DutyCurve,
}

impl Default for DutyMapping {
    fn default() -> Self {
        Self {
            cw: DirectionBand::default(),
            ccw: DirectionBand::default(),
            duty_off: 0.1,
            curve: DutyCurve::Linear,
        }
    }
}

/// PWM output wiring.
#[derive(Debug, Clone, Copy)]
pub struct PwmCfg {
    pub channel: u8,
    /// Negative values are clamped to 0 at init.
    pub frequency_hz: f32,
}

impl Default for PwmCfg {
    fn default() -> Self {
        Self {
            channel: 1,
            frequency_hz: 100.0,
        }
    }
}

/// Soft-start ramp parameters.
#[derive(Debug, Clone, Copy)]
pub struct RampCfg {
    /// Speed change per step. Must be > 0 when a step is due.
    pub increment: f32,
    /// Minimum time between steps.
    pub delay: Duration,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self {
            increment: 100.0,
            delay: Duration::from_millis(50),
        }
    }
}
