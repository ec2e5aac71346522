//! Collaborator contracts and shared value types for the spindle subsystem.
//!
//! The core never touches hardware directly: PWM, the enable/direction lines,
//! machine safety state and the motion-planner queue all sit behind these traits.

pub mod clock;
pub mod mode;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use mode::{CommandKind, Direction, PAYLOAD_SLOTS, SpindleCommand, SpindleMode};

use std::time::Duration;

/// PWM peripheral driving the spindle ESC / motor driver.
///
/// Also owns the soft-start timer; the ramp treats it as the only source of
/// timing truth.
pub trait PwmDriver {
    fn set_frequency(
        &mut self,
        channel: u8,
        hz: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_duty(
        &mut self,
        channel: u8,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn soft_start_enabled(&self) -> bool;
    fn soft_start_elapsed(&self, delay: Duration) -> bool;
    fn begin_soft_start(&mut self);
    fn end_soft_start(&mut self);
}

/// A single logical digital output line (spindle enable or direction).
pub trait DigitalOutput {
    fn set(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Machine-level safety signals plus the few transitions the spindle may request.
pub trait MachineState {
    fn estop_active(&self) -> bool;
    fn safety_fault_active(&self) -> bool;
    /// Move the motion system into feed-hold.
    fn request_hold(&mut self);
    /// Ask the reporting subsystem for an immediate status report.
    fn request_status_report(&mut self);
    /// Start (or continue) a machining cycle.
    fn cycle_start(&mut self);
}

/// Deferred, in-order execution alongside motion segments.
pub trait PlannerQueue {
    fn queue_command(
        &mut self,
        cmd: SpindleCommand,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: PwmDriver + ?Sized> PwmDriver for Box<T> {
    fn set_frequency(
        &mut self,
        channel: u8,
        hz: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_frequency(channel, hz)
    }
    fn set_duty(
        &mut self,
        channel: u8,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_duty(channel, duty)
    }
    fn soft_start_enabled(&self) -> bool {
        (**self).soft_start_enabled()
    }
    fn soft_start_elapsed(&self, delay: Duration) -> bool {
        (**self).soft_start_elapsed(delay)
    }
    fn begin_soft_start(&mut self) {
        (**self).begin_soft_start();
    }
    fn end_soft_start(&mut self) {
        (**self).end_soft_start();
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Box<T> {
    fn set(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set()
    }
    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).clear()
    }
}

impl<T: MachineState + ?Sized> MachineState for Box<T> {
    fn estop_active(&self) -> bool {
        (**self).estop_active()
    }
    fn safety_fault_active(&self) -> bool {
        (**self).safety_fault_active()
    }
    fn request_hold(&mut self) {
        (**self).request_hold();
    }
    fn request_status_report(&mut self) {
        (**self).request_status_report();
    }
    fn cycle_start(&mut self) {
        (**self).cycle_start();
    }
}

impl<T: PlannerQueue + ?Sized> PlannerQueue for Box<T> {
    fn queue_command(
        &mut self,
        cmd: SpindleCommand,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).queue_command(cmd)
    }
}
