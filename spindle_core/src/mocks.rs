//! Test and helper mocks for spindle_core

use spindle_traits::{DigitalOutput, MachineState, PlannerQueue, SpindleCommand};

/// Machine with no e-stop, no interlock, and no interest in holds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMachine;

impl MachineState for NoopMachine {
    fn estop_active(&self) -> bool {
        false
    }
    fn safety_fault_active(&self) -> bool {
        false
    }
    fn request_hold(&mut self) {}
    fn request_status_report(&mut self) {}
    fn cycle_start(&mut self) {}
}

/// Output line that accepts every write; useful when the test only watches PWM.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPin;

impl DigitalOutput for NoopPin {
    fn set(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A queue that rejects everything; for controllers driven only by immediate commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingQueue;

impl PlannerQueue for RejectingQueue {
    fn queue_command(
        &mut self,
        _cmd: SpindleCommand,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("no planner attached")))
    }
}
