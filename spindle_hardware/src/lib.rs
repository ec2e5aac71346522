pub mod error;
#[cfg(feature = "hardware")]
pub mod rpi;
pub mod util;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spindle_traits::{
    Clock, CommandKind, DigitalOutput, MachineState, PAYLOAD_SLOTS, PlannerQueue, PwmDriver,
    SpindleCommand,
};

use crate::error::HwError;
use crate::util::{SoftStartTimer, lock};

#[derive(Debug, Default)]
struct PwmInner {
    frequency_hz: f32,
    duty: f32,
    writes: Vec<(u8, f32)>,
    timer: SoftStartTimer,
    fail_writes: usize,
}

/// Simulated PWM peripheral with a clock-driven soft-start timer.
///
/// Clones share state, so a test can keep a handle after moving one into the
/// controller.
#[derive(Clone)]
pub struct SimulatedPwm {
    inner: Arc<Mutex<PwmInner>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl std::fmt::Debug for SimulatedPwm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("SimulatedPwm")
            .field("frequency_hz", &inner.frequency_hz)
            .field("duty", &inner.duty)
            .field("writes", &inner.writes.len())
            .finish()
    }
}

impl SimulatedPwm {
    pub fn new(clock: impl Clock + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PwmInner::default())),
            clock: Arc::new(clock),
        }
    }

    /// Last duty accepted by the peripheral.
    pub fn duty(&self) -> f32 {
        lock(&self.inner).duty
    }

    pub fn frequency(&self) -> f32 {
        lock(&self.inner).frequency_hz
    }

    /// Every accepted `(channel, duty)` write, oldest first.
    pub fn duty_writes(&self) -> Vec<(u8, f32)> {
        lock(&self.inner).writes.clone()
    }

    /// Reject the next `n` duty writes.
    pub fn fail_writes(&self, n: usize) {
        lock(&self.inner).fail_writes = n;
    }
}

impl PwmDriver for SimulatedPwm {
    fn set_frequency(
        &mut self,
        _channel: u8,
        hz: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.inner).frequency_hz = hz;
        Ok(())
    }

    fn set_duty(
        &mut self,
        channel: u8,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            return Err(Box::new(HwError::Pwm("simulated write rejection".into())));
        }
        if !(0.0..=1.0).contains(&duty) {
            return Err(Box::new(HwError::DutyOutOfRange(duty)));
        }
        inner.duty = duty;
        inner.writes.push((channel, duty));
        tracing::trace!(channel, duty, "pwm duty (simulated)");
        Ok(())
    }

    fn soft_start_enabled(&self) -> bool {
        lock(&self.inner).timer.enabled()
    }

    fn soft_start_elapsed(&self, delay: Duration) -> bool {
        lock(&self.inner).timer.elapsed(&*self.clock, delay)
    }

    fn begin_soft_start(&mut self) {
        let now = self.clock.now();
        lock(&self.inner).timer.begin(now);
    }

    fn end_soft_start(&mut self) {
        lock(&self.inner).timer.end();
    }
}

/// Simulated digital output line.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPin {
    level: Arc<AtomicBool>,
    fail: Arc<AtomicBool>,
}

impl SimulatedPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }

    /// Make every subsequent write fail until cleared.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    fn write(&self, level: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(Box::new(HwError::Gpio("simulated line fault".into())));
        }
        self.level.store(level, Ordering::Relaxed);
        Ok(())
    }
}

impl DigitalOutput for SimulatedPin {
    fn set(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write(true)
    }
    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write(false)
    }
}

/// Simulated machine: e-stop and interlock flags toggled externally, requests counted.
#[derive(Debug, Clone, Default)]
pub struct SimulatedMachine {
    estop: Arc<AtomicBool>,
    fault: Arc<AtomicBool>,
    holds: Arc<AtomicUsize>,
    reports: Arc<AtomicUsize>,
    cycle_starts: Arc<AtomicUsize>,
}

impl SimulatedMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_estop(&self, active: bool) {
        self.estop.store(active, Ordering::Relaxed);
    }

    pub fn set_safety_fault(&self, active: bool) {
        self.fault.store(active, Ordering::Relaxed);
    }

    pub fn hold_requests(&self) -> usize {
        self.holds.load(Ordering::Relaxed)
    }

    pub fn status_reports(&self) -> usize {
        self.reports.load(Ordering::Relaxed)
    }

    pub fn cycle_starts(&self) -> usize {
        self.cycle_starts.load(Ordering::Relaxed)
    }
}

impl MachineState for SimulatedMachine {
    fn estop_active(&self) -> bool {
        self.estop.load(Ordering::Relaxed)
    }
    fn safety_fault_active(&self) -> bool {
        self.fault.load(Ordering::Relaxed)
    }
    fn request_hold(&mut self) {
        self.holds.fetch_add(1, Ordering::Relaxed);
    }
    fn request_status_report(&mut self) {
        self.reports.fetch_add(1, Ordering::Relaxed);
    }
    fn cycle_start(&mut self) {
        self.cycle_starts.fetch_add(1, Ordering::Relaxed);
    }
}

type PlannerEntry = (CommandKind, [f32; PAYLOAD_SLOTS]);

/// Bounded FIFO standing in for the motion planner's command buffer.
///
/// Entries are stored in the planner's packed form: a callback kind plus a
/// fixed-size numeric payload.
#[derive(Debug, Clone)]
pub struct SimulatedPlanner {
    buf: Arc<Mutex<VecDeque<PlannerEntry>>>,
    capacity: usize,
}

impl Default for SimulatedPlanner {
    fn default() -> Self {
        Self::with_capacity(48)
    }
}

impl SimulatedPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Dequeue and decode the next command in planner order.
    ///
    /// Entries whose payload does not decode are dropped with a warning.
    pub fn pop_front(&self) -> Option<SpindleCommand> {
        let mut buf = lock(&self.buf);
        while let Some((kind, value)) = buf.pop_front() {
            match SpindleCommand::from_payload(kind, &value) {
                Some(cmd) => return Some(cmd),
                None => {
                    tracing::warn!(?kind, slot0 = value[0], "dropping undecodable planner entry");
                }
            }
        }
        None
    }

    /// Packed payload of the next entry without dequeuing it.
    pub fn peek_payload(&self) -> Option<(CommandKind, [f32; PAYLOAD_SLOTS])> {
        lock(&self.buf).front().copied()
    }

    pub fn len(&self) -> usize {
        lock(&self.buf).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.buf).is_empty()
    }
}

impl PlannerQueue for SimulatedPlanner {
    fn queue_command(
        &mut self,
        cmd: SpindleCommand,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut buf = lock(&self.buf);
        if buf.len() >= self.capacity {
            return Err(Box::new(HwError::QueueFull));
        }
        buf.push_back((cmd.kind(), cmd.payload()));
        Ok(())
    }
}
