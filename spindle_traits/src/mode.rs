//! Spindle mode and the command shapes handed to the planner queue.

/// Base rotation state of the spindle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Direction {
    #[default]
    Off,
    Cw,
    Ccw,
}

impl Direction {
    /// True for CW or CCW.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Direction::Cw | Direction::Ccw)
    }

    #[inline]
    fn bits(self) -> u8 {
        match self {
            Direction::Off => 0,
            Direction::Cw => 1,
            Direction::Ccw => 2,
        }
    }
}

/// `{OFF, CW, CCW}` crossed with an independent PAUSED flag.
///
/// A paused mode remembers its direction so a resume can restore it; the
/// physical outputs are always driven from [`SpindleMode::raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SpindleMode {
    direction: Direction,
    paused: bool,
}

impl SpindleMode {
    pub const OFF: Self = Self::new(Direction::Off);
    pub const CW: Self = Self::new(Direction::Cw);
    pub const CCW: Self = Self::new(Direction::Ccw);

    /// Flag bit carried alongside the direction bits in packed form.
    pub const PAUSED_BIT: u8 = 0x80;

    pub const fn new(direction: Direction) -> Self {
        Self {
            direction,
            paused: false,
        }
    }

    #[inline]
    pub fn direction(self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_paused(self) -> bool {
        self.paused
    }

    /// Same direction with the PAUSED flag set.
    #[inline]
    pub fn paused(self) -> Self {
        Self {
            paused: true,
            ..self
        }
    }

    /// Same direction with the PAUSED flag stripped.
    #[inline]
    pub fn raw(self) -> Self {
        Self {
            paused: false,
            ..self
        }
    }

    #[inline]
    pub fn is_off(self) -> bool {
        self.direction == Direction::Off
    }

    /// CW or CCW and not paused.
    #[inline]
    pub fn is_running(self) -> bool {
        self.direction.is_running() && !self.paused
    }

    pub fn bits(self) -> u8 {
        let flag = if self.paused { Self::PAUSED_BIT } else { 0 };
        self.direction.bits() | flag
    }

    /// Decode packed bits; unknown direction values yield `None`.
    pub fn from_bits(bits: u8) -> Option<Self> {
        let direction = match bits & !Self::PAUSED_BIT {
            0 => Direction::Off,
            1 => Direction::Cw,
            2 => Direction::Ccw,
            _ => return None,
        };
        Some(Self {
            direction,
            paused: bits & Self::PAUSED_BIT != 0,
        })
    }
}

impl From<Direction> for SpindleMode {
    fn from(direction: Direction) -> Self {
        Self::new(direction)
    }
}

/// Numeric slots carried by one planner queue entry.
pub const PAYLOAD_SLOTS: usize = 6;

/// Which spindle callback a queued entry targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Control,
    Speed,
}

/// A spindle change deferred to its place in the motion stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpindleCommand {
    Control(SpindleMode),
    Speed(f32),
}

impl SpindleCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            SpindleCommand::Control(_) => CommandKind::Control,
            SpindleCommand::Speed(_) => CommandKind::Speed,
        }
    }

    /// Pack into the planner's fixed-size payload; the value lives in slot 0.
    pub fn payload(&self) -> [f32; PAYLOAD_SLOTS] {
        let mut value = [0.0; PAYLOAD_SLOTS];
        value[0] = match self {
            SpindleCommand::Control(mode) => f32::from(mode.bits()),
            SpindleCommand::Speed(speed) => *speed,
        };
        value
    }

    pub fn from_payload(kind: CommandKind, value: &[f32; PAYLOAD_SLOTS]) -> Option<Self> {
        match kind {
            CommandKind::Control => {
                let raw = value[0];
                if !raw.is_finite()
                    || raw.fract() != 0.0
                    || raw < 0.0
                    || raw > f32::from(u8::MAX)
                {
                    return None;
                }
                SpindleMode::from_bits(raw as u8).map(SpindleCommand::Control)
            }
            CommandKind::Speed => Some(SpindleCommand::Speed(value[0])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_keeps_direction() {
        let m = SpindleMode::CCW.paused();
        assert!(m.is_paused());
        assert_eq!(m.direction(), Direction::Ccw);
        assert_eq!(m.raw(), SpindleMode::CCW);
        assert!(!m.is_running());
    }

    #[test]
    fn bits_carry_pause_flag() {
        assert_eq!(SpindleMode::OFF.bits(), 0);
        assert_eq!(SpindleMode::CW.bits(), 1);
        assert_eq!(SpindleMode::CW.paused().bits(), 0x81);
        assert_eq!(SpindleMode::from_bits(0x82), Some(SpindleMode::CCW.paused()));
        assert_eq!(SpindleMode::from_bits(3), None);
    }

    #[test]
    fn control_payload_decodes_back() {
        let cmd = SpindleCommand::Control(SpindleMode::CW.paused());
        let value = cmd.payload();
        assert_eq!(value[0], 129.0);
        assert!(value[1..].iter().all(|v| *v == 0.0));
        assert_eq!(
            SpindleCommand::from_payload(CommandKind::Control, &value),
            Some(cmd)
        );
    }

    #[test]
    fn garbage_control_payload_is_rejected() {
        let mut value = [0.0; PAYLOAD_SLOTS];
        value[0] = f32::NAN;
        assert_eq!(SpindleCommand::from_payload(CommandKind::Control, &value), None);
        value[0] = -1.0;
        assert_eq!(SpindleCommand::from_payload(CommandKind::Control, &value), None);
    }

    #[test]
    fn fractional_control_payload_is_rejected() {
        let mut value = [0.0; PAYLOAD_SLOTS];
        value[0] = 129.7;
        assert_eq!(SpindleCommand::from_payload(CommandKind::Control, &value), None);
        value[0] = 1.5;
        assert_eq!(SpindleCommand::from_payload(CommandKind::Control, &value), None);
    }
}
