//! Outcome of one spindle invocation.

/// What the soft-start ramp did on this invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampStatus {
    /// Off or paused: off duty written, ramp reset, applied speed now 0.
    Stopped { duty: f32 },
    /// One increment toward the target was written.
    Stepped { speed: f32, duty: f32 },
    /// A step is due but the inter-step delay has not elapsed yet.
    Waiting,
    /// Applied speed already equals the target.
    Converged,
}

impl RampStatus {
    /// Duty written to the actuator on this invocation, if any.
    pub fn duty(&self) -> Option<f32> {
        match self {
            RampStatus::Stopped { duty } | RampStatus::Stepped { duty, .. } => Some(*duty),
            RampStatus::Waiting | RampStatus::Converged => None,
        }
    }
}
