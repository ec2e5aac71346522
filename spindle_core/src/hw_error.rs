//! Maps `Box<dyn Error>` from trait boundaries to typed `SpindleError`.
//!
//! The traits in `spindle_traits` use `Box<dyn Error + Send + Sync>` so any
//! platform driver can plug in; this module converts those to our typed error
//! enum, with an optional feature-gated path for `spindle_hardware::HwError`
//! downcasting.

use crate::error::SpindleError;

/// Which collaborator produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwSite {
    Pwm,
    Output,
    Queue,
}

/// Map a trait-boundary error to a typed `SpindleError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to the call site.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static), site: HwSite) -> SpindleError {
    #[cfg(feature = "hardware-errors")]
    {
        use spindle_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            match hw {
                HwError::QueueFull => return SpindleError::QueueFull,
                HwError::DutyOutOfRange(_) => return SpindleError::ActuatorWrite(hw.to_string()),
                _ => {}
            }
        }
    }

    let s = e.to_string();
    match site {
        HwSite::Pwm => SpindleError::ActuatorWrite(s),
        HwSite::Output => SpindleError::Output(s),
        HwSite::Queue => {
            if s.to_lowercase().contains("full") {
                SpindleError::QueueFull
            } else {
                SpindleError::Queue(s)
            }
        }
    }
}
