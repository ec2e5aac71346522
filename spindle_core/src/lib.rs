#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Spindle command/ramp engine (hardware-agnostic).
//!
//! This crate turns a commanded spindle direction and speed into a safe,
//! smoothly ramped PWM duty. All hardware interactions go through the traits
//! in `spindle_traits`.
//!
//! ## Architecture
//!
//! - **Speed limits**: per-direction commandable band (`limits` module)
//! - **Duty mapping**: linear or cubic speed→duty with asymmetric clamping (`duty`)
//! - **Safety gate**: e-stop > interlock/pause > normal (`safety`)
//! - **Soft start**: timed incremental convergence toward the target (`ramp`)
//! - **Controller**: queued and immediate entry points (`SpindleCore`, `Spindle`)

pub mod builder;
pub mod config;
pub mod conversions;
pub mod controller;
pub mod duty;
pub mod error;
pub mod hw_error;
pub mod limits;
pub mod mocks;
pub mod ramp;
pub mod safety;
pub mod status;

pub use builder::{Missing, Set, Spindle, SpindleBuilder, SpindleG, build_spindle};
pub use config::{DirectionBand, DutyCurve, DutyMapping, PwmCfg, RampCfg};
pub use controller::SpindleCore;
pub use error::{BuildError, SpindleError};
pub use ramp::{SoftStartRamper, SpindleRuntimeState};
pub use safety::{Resolution, SafetySignals, resolve};
pub use status::RampStatus;

pub use spindle_traits::{Direction, SpindleCommand, SpindleMode};
