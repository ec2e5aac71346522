use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("duty {0} outside [0, 1]")]
    DutyOutOfRange(f32),
    #[error("planner queue full")]
    QueueFull,
}

pub type Result<T> = std::result::Result<T, HwError>;
