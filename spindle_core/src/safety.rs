//! Safety gate: decides what the spindle may do given e-stop, interlock and pause.
//!
//! Priority ladder: e-stop > interlock/pause > normal.

use spindle_traits::{MachineState, SpindleMode};

/// Safety inputs sampled once at the start of every invocation.
///
/// The pause-already-active flag travels on the requested mode itself
/// ([`SpindleMode::is_paused`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetySignals {
    pub estop_active: bool,
    pub safety_fault_active: bool,
}

impl SafetySignals {
    pub fn sample<M: MachineState + ?Sized>(machine: &M) -> Self {
        Self {
            estop_active: machine.estop_active(),
            safety_fault_active: machine.safety_fault_active(),
        }
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Logical mode to persist; may carry PAUSED so a resume can recover it.
    pub effective: SpindleMode,
    /// Mode driven onto the enable/direction lines; never paused.
    pub raw: SpindleMode,
    /// Caller must move the machine into feed-hold and request a status report.
    pub trigger_hold: bool,
}

pub fn resolve(requested: SpindleMode, signals: SafetySignals) -> Resolution {
    let raw = requested.raw();

    if signals.estop_active {
        return Resolution {
            effective: SpindleMode::OFF,
            raw: SpindleMode::OFF,
            trigger_hold: false,
        };
    }

    let paused = requested.is_paused();
    if (paused || signals.safety_fault_active) && !raw.is_off() {
        return Resolution {
            effective: raw.paused(),
            raw: SpindleMode::OFF,
            trigger_hold: !paused,
        };
    }

    Resolution {
        effective: raw,
        raw,
        trigger_hold: false,
    }
}
