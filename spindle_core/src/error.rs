use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpindleError {
    /// A ramp step was due but the increment is not strictly positive.
    #[error("invalid ramp configuration: increment must be > 0")]
    InvalidRampConfiguration,
    #[error("actuator write failed: {0}")]
    ActuatorWrite(String),
    #[error("spindle output line failed: {0}")]
    Output(String),
    #[error("planner queue rejected command: {0}")]
    Queue(String),
    #[error("planner queue full")]
    QueueFull,
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing pwm driver")]
    MissingPwm,
    #[error("missing enable/direction outputs")]
    MissingOutputs,
    #[error("missing machine state")]
    MissingMachine,
    #[error("missing planner queue")]
    MissingQueue,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
