//! Commandable speed band per direction.

use spindle_traits::Direction;

use crate::config::{DirectionBand, DutyMapping};

impl DutyMapping {
    /// Band for a running direction; `None` for OFF.
    #[inline]
    pub fn band(&self, direction: Direction) -> Option<&DirectionBand> {
        match direction {
            Direction::Cw => Some(&self.cw),
            Direction::Ccw => Some(&self.ccw),
            Direction::Off => None,
        }
    }

    /// Configured `(speed_lo, speed_hi)` for CW or CCW.
    pub fn speed_limits(&self, direction: Direction) -> Option<(f32, f32)> {
        self.band(direction).map(|b| (b.speed_lo, b.speed_hi))
    }

    /// Clamp `speed` into the direction's band. OFF passes the value through.
    pub fn clamp_speed(&self, direction: Direction, speed: f32) -> f32 {
        match self.speed_limits(direction) {
            Some((lo, hi)) => speed.max(lo).min(hi),
            None => speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> DutyMapping {
        DutyMapping {
            cw: DirectionBand {
                speed_lo: 1000.0,
                speed_hi: 24000.0,
                duty_lo: 0.1,
                duty_hi: 0.9,
            },
            ccw: DirectionBand {
                speed_lo: 500.0,
                speed_hi: 8000.0,
                duty_lo: 0.2,
                duty_hi: 0.8,
            },
            ..DutyMapping::default()
        }
    }

    #[test]
    fn limits_follow_direction() {
        let m = mapping();
        assert_eq!(m.speed_limits(Direction::Cw), Some((1000.0, 24000.0)));
        assert_eq!(m.speed_limits(Direction::Ccw), Some((500.0, 8000.0)));
        assert_eq!(m.speed_limits(Direction::Off), None);
    }

    #[test]
    fn clamp_hits_bounds_exactly() {
        let m = mapping();
        assert_eq!(m.clamp_speed(Direction::Cw, 10.0), 1000.0);
        assert_eq!(m.clamp_speed(Direction::Cw, 99_999.0), 24000.0);
        assert_eq!(m.clamp_speed(Direction::Ccw, 9000.0), 8000.0);
        assert_eq!(m.clamp_speed(Direction::Ccw, 4000.0), 4000.0);
        assert_eq!(m.clamp_speed(Direction::Off, 99_999.0), 99_999.0);
    }

    #[test]
    fn clamp_is_idempotent() {
        let m = mapping();
        let once = m.clamp_speed(Direction::Cw, 50_000.0);
        assert_eq!(m.clamp_speed(Direction::Cw, once), once);
    }
}
