//! Speed → PWM duty mapping.
//!
//! Clamp policy:
//! - the result never exceeds the direction's `duty_hi`, whatever the curve;
//! - the `duty_lo` floor only applies while decelerating (`speed < previous`),
//!   so a ramp starting from zero is not held at the floor;
//! - duty is never negative.

use spindle_traits::SpindleMode;

use crate::config::{DutyCurve, DutyMapping};

impl DutyMapping {
    /// Duty for `speed` in `mode`, using `previous_speed` as the hysteresis reference.
    ///
    /// Anything other than an unpaused CW/CCW yields `duty_off`.
    pub fn compute_duty(&self, mode: SpindleMode, speed: f32, previous_speed: f32) -> f32 {
        if !mode.is_running() {
            return self.duty_off;
        }
        let Some(band) = self.band(mode.direction()) else {
            return self.duty_off;
        };

        let mapped = match self.curve {
            DutyCurve::Linear => {
                let lerp = (speed - band.speed_lo) / (band.speed_hi - band.speed_lo);
                lerp * (band.duty_hi - band.duty_lo) + band.duty_lo
            }
            DutyCurve::Cubic([c0, c1, c2, c3]) => c0 + speed * (c1 + speed * (c2 + speed * c3)),
        };

        // f32::min ignores NaN, so a degenerate curve still lands on duty_hi.
        let mut duty = mapped.min(band.duty_hi);
        if speed < previous_speed && duty < band.duty_lo {
            duty = band.duty_lo;
        }
        duty.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectionBand;

    fn linear() -> DutyMapping {
        DutyMapping {
            cw: DirectionBand {
                speed_lo: 0.0,
                speed_hi: 1000.0,
                duty_lo: 0.2,
                duty_hi: 0.8,
            },
            ccw: DirectionBand {
                speed_lo: 0.0,
                speed_hi: 2000.0,
                duty_lo: 0.1,
                duty_hi: 0.5,
            },
            duty_off: 0.05,
            curve: DutyCurve::Linear,
        }
    }

    #[test]
    fn off_and_paused_map_to_off_duty() {
        let m = linear();
        assert_eq!(m.compute_duty(SpindleMode::OFF, 500.0, 0.0), 0.05);
        assert_eq!(m.compute_duty(SpindleMode::CW.paused(), 500.0, 0.0), 0.05);
    }

    #[test]
    fn linear_interpolates_per_direction() {
        let m = linear();
        let cw = m.compute_duty(SpindleMode::CW, 500.0, 0.0);
        assert!((cw - 0.5).abs() < 1e-6);
        let ccw = m.compute_duty(SpindleMode::CCW, 1000.0, 0.0);
        assert!((ccw - 0.3).abs() < 1e-6);
    }

    #[test]
    fn high_clamp_is_unconditional() {
        let m = linear();
        assert_eq!(m.compute_duty(SpindleMode::CW, 5000.0, 0.0), 0.8);
        assert_eq!(m.compute_duty(SpindleMode::CW, 5000.0, 9000.0), 0.8);
    }

    #[test]
    fn low_clamp_only_while_decreasing() {
        // speed_lo above zero so small speeds map below duty_lo
        let mut m = linear();
        m.cw.speed_lo = 200.0;
        let rising = m.compute_duty(SpindleMode::CW, 100.0, 0.0);
        assert!(rising < 0.2);
        assert!(rising >= 0.0);
        let falling = m.compute_duty(SpindleMode::CW, 100.0, 300.0);
        assert_eq!(falling, 0.2);
        let holding = m.compute_duty(SpindleMode::CW, 100.0, 100.0);
        assert_eq!(holding, rising);
    }

    #[test]
    fn duty_never_negative() {
        let mut m = linear();
        m.cw.speed_lo = 10_000.0;
        m.cw.speed_hi = 20_000.0;
        assert_eq!(m.compute_duty(SpindleMode::CW, 0.0, 0.0), 0.0);
    }

    #[test]
    fn cubic_ignores_speed_band() {
        let mut m = linear();
        m.curve = DutyCurve::Cubic([0.1, 0.0005, 0.0, 0.0]);
        let d = m.compute_duty(SpindleMode::CW, 400.0, 0.0);
        assert!((d - 0.3).abs() < 1e-6);
        // still capped by duty_hi
        assert_eq!(m.compute_duty(SpindleMode::CW, 100_000.0, 0.0), 0.8);
    }
}
