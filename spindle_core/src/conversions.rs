//! `From` implementations bridging `spindle_config` types to `spindle_core` types.

use std::time::Duration;

use crate::config::{DirectionBand, DutyCurve, DutyMapping, PwmCfg, RampCfg};

// ── DirectionBand ────────────────────────────────────────────────────────────

impl From<&spindle_config::DirectionBand> for DirectionBand {
    fn from(c: &spindle_config::DirectionBand) -> Self {
        Self {
            speed_lo: c.speed_lo,
            speed_hi: c.speed_hi,
            duty_lo: c.duty_lo,
            duty_hi: c.duty_hi,
        }
    }
}

// ── DutyMapping ──────────────────────────────────────────────────────────────

impl From<&spindle_config::Config> for DutyMapping {
    fn from(c: &spindle_config::Config) -> Self {
        // Validation guarantees coefficients for the cubic curve; fall back to
        // linear if an unvalidated config slips through.
        let curve = match (c.mapping.curve, c.mapping.cubic) {
            (spindle_config::Curve::Cubic, Some(coeffs)) => DutyCurve::Cubic(coeffs),
            _ => DutyCurve::Linear,
        };
        Self {
            cw: (&c.pwm.cw).into(),
            ccw: (&c.pwm.ccw).into(),
            duty_off: c.pwm.duty_off,
            curve,
        }
    }
}

// ── PwmCfg ───────────────────────────────────────────────────────────────────

impl From<&spindle_config::PwmCfg> for PwmCfg {
    fn from(c: &spindle_config::PwmCfg) -> Self {
        Self {
            channel: c.channel,
            frequency_hz: c.frequency_hz,
        }
    }
}

// ── RampCfg ──────────────────────────────────────────────────────────────────

impl From<&spindle_config::RampCfg> for RampCfg {
    fn from(c: &spindle_config::RampCfg) -> Self {
        Self {
            increment: c.increment_rpm,
            delay: Duration::from_millis(c.delay_ms),
        }
    }
}
