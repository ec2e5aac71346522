#![allow(dead_code)]

use std::time::Duration;

use spindle_core::{
    DirectionBand, DutyMapping, RampCfg, RampStatus, Spindle, SpindleError,
};
use spindle_hardware::{SimulatedMachine, SimulatedPin, SimulatedPlanner, SimulatedPwm};
use spindle_traits::ManualClock;

pub const DELAY: Duration = Duration::from_millis(10);
pub const DUTY_OFF: f32 = 0.05;

pub fn mapping() -> DutyMapping {
    DutyMapping {
        cw: DirectionBand {
            speed_lo: 0.0,
            speed_hi: 10_000.0,
            duty_lo: 0.0,
            duty_hi: 1.0,
        },
        ccw: DirectionBand {
            speed_lo: 500.0,
            speed_hi: 8_000.0,
            duty_lo: 0.2,
            duty_hi: 0.9,
        },
        duty_off: DUTY_OFF,
        ..DutyMapping::default()
    }
}

/// A controller wired to simulated collaborators, with handles kept for inspection.
pub struct Rig {
    pub spindle: Spindle,
    pub clock: ManualClock,
    pub pwm: SimulatedPwm,
    pub enable: SimulatedPin,
    pub direction: SimulatedPin,
    pub machine: SimulatedMachine,
    pub planner: SimulatedPlanner,
}

impl Rig {
    pub fn new(increment: f32) -> Self {
        Self::with_planner(increment, SimulatedPlanner::new())
    }

    pub fn with_planner(increment: f32, planner: SimulatedPlanner) -> Self {
        let clock = ManualClock::new();
        let pwm = SimulatedPwm::new(clock.clone());
        let enable = SimulatedPin::new();
        let direction = SimulatedPin::new();
        let machine = SimulatedMachine::new();
        let spindle = Spindle::builder()
            .with_pwm(pwm.clone())
            .with_outputs(enable.clone(), direction.clone())
            .with_machine(machine.clone())
            .with_queue(planner.clone())
            .with_mapping(mapping())
            .with_ramp(RampCfg {
                increment,
                delay: DELAY,
            })
            .build()
            .expect("build spindle");
        Self {
            spindle,
            clock,
            pwm,
            enable,
            direction,
            machine,
            planner,
        }
    }

    /// Pop and execute everything the planner holds, returning the last status.
    pub fn drain(&mut self) -> Option<RampStatus> {
        let mut last = None;
        while let Some(cmd) = self.planner.pop_front() {
            last = Some(self.spindle.execute_queued(cmd).expect("execute queued"));
        }
        last
    }

    /// Advance the clock one delay per tick until converged; returns every stepped speed.
    pub fn ramp_to_convergence(&mut self) -> Vec<f32> {
        let mut speeds = Vec::new();
        for _ in 0..1000 {
            self.clock.advance(DELAY);
            match self.spindle.tick().expect("tick") {
                RampStatus::Stepped { speed, .. } => speeds.push(speed),
                RampStatus::Waiting => {}
                RampStatus::Converged | RampStatus::Stopped { .. } => return speeds,
            }
        }
        panic!("ramp did not converge");
    }

    /// Command a running direction and speed through the planner, then ramp fully.
    pub fn spin_up(&mut self, mode: spindle_core::SpindleMode, speed: f32) {
        self.spindle.request_speed(speed).expect("queue speed");
        self.spindle.request_mode(mode).expect("queue mode");
        self.drain();
        self.ramp_to_convergence();
        assert!(self.spindle.is_converged());
    }
}

pub fn spindle_error(err: &eyre::Report) -> Option<&SpindleError> {
    err.chain().find_map(|e| e.downcast_ref::<SpindleError>())
}
