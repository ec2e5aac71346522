//! Raspberry Pi backend: GPIO lines and the hardware PWM peripheral via rppal.

use std::time::Duration;

use rppal::gpio::{Gpio, OutputPin};
use rppal::pwm::{Channel, Polarity, Pwm};
use spindle_traits::{Clock, DigitalOutput, MonotonicClock, PwmDriver};

use crate::error::HwError;
use crate::util::SoftStartTimer;

/// A BCM GPIO pin driven as a plain output (spindle enable / direction).
pub struct GpioLine {
    pin: OutputPin,
}

impl GpioLine {
    pub fn new(bcm: u8) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(bcm)
            .map_err(|e| HwError::Gpio(format!("pin {bcm}: {e}")))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl DigitalOutput for GpioLine {
    fn set(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin.set_high();
        Ok(())
    }
    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin.set_low();
        Ok(())
    }
}

/// Hardware PWM channel 0 or 1.
pub struct HardwarePwm {
    pwm: Pwm,
    channel: u8,
    timer: SoftStartTimer,
    clock: MonotonicClock,
}

fn channel(n: u8) -> Result<Channel, HwError> {
    match n {
        0 => Ok(Channel::Pwm0),
        1 => Ok(Channel::Pwm1),
        other => Err(HwError::Pwm(format!("no hardware pwm channel {other}"))),
    }
}

impl HardwarePwm {
    pub fn new(ch: u8, frequency_hz: f32, duty: f32) -> Result<Self, HwError> {
        let pwm = Pwm::with_frequency(
            channel(ch)?,
            f64::from(frequency_hz.max(0.0)),
            f64::from(duty.clamp(0.0, 1.0)),
            Polarity::Normal,
            true,
        )
        .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(Self {
            pwm,
            channel: ch,
            timer: SoftStartTimer::default(),
            clock: MonotonicClock::new(),
        })
    }

    fn check_channel(&self, requested: u8) -> Result<(), HwError> {
        if requested == self.channel {
            Ok(())
        } else {
            Err(HwError::Pwm(format!(
                "channel {requested} requested but pwm{} is open",
                self.channel
            )))
        }
    }
}

impl PwmDriver for HardwarePwm {
    fn set_frequency(
        &mut self,
        channel: u8,
        hz: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_channel(channel)?;
        let duty = self
            .pwm
            .duty_cycle()
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        self.pwm
            .set_frequency(f64::from(hz), duty)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }

    fn set_duty(
        &mut self,
        channel: u8,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_channel(channel)?;
        if !(0.0..=1.0).contains(&duty) {
            return Err(Box::new(HwError::DutyOutOfRange(duty)));
        }
        self.pwm
            .set_duty_cycle(f64::from(duty))
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }

    fn soft_start_enabled(&self) -> bool {
        self.timer.enabled()
    }

    fn soft_start_elapsed(&self, delay: Duration) -> bool {
        self.timer.elapsed(&self.clock, delay)
    }

    fn begin_soft_start(&mut self) {
        self.timer.begin(self.clock.now());
    }

    fn end_soft_start(&mut self) {
        self.timer.end();
    }
}
