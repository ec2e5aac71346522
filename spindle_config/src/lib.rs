#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the spindle subsystem.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The speed→duty table is per direction; the curve selector picks linear
//!   interpolation or a calibrated cubic polynomial.
use serde::Deserialize;
use serde::de::Deserializer;

/// One direction's commandable speed band and the duty range it maps to.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DirectionBand {
    pub speed_lo: f32,
    pub speed_hi: f32,
    pub duty_lo: f32,
    pub duty_hi: f32,
}

impl Default for DirectionBand {
    fn default() -> Self {
        Self {
            speed_lo: 1000.0,
            speed_hi: 24000.0,
            duty_lo: 0.125,
            duty_hi: 0.2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PwmCfg {
    /// PWM channel the spindle ESC is wired to.
    pub channel: u8,
    /// Carrier frequency. Negative values are clamped to 0 at init.
    pub frequency_hz: f32,
    /// Duty written whenever the spindle is off or paused.
    pub duty_off: f32,
    pub cw: DirectionBand,
    pub ccw: DirectionBand,
}

impl Default for PwmCfg {
    fn default() -> Self {
        Self {
            channel: 1,
            frequency_hz: 100.0,
            duty_off: 0.1,
            cw: DirectionBand::default(),
            ccw: DirectionBand::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    #[default]
    Linear,
    Cubic,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MappingCfg {
    pub curve: Curve,
    /// Cubic coefficients `[c0, c1, c2, c3]`. Accepts either:
    /// - array: [0.05, 1.2e-5, 0.0, 0.0]
    /// - table: { c0 = 0.05, c1 = 1.2e-5, c2 = 0.0, c3 = 0.0 }
    #[serde(default, deserialize_with = "de_cubic")]
    pub cubic: Option<[f32; 4]>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RampCfg {
    /// Speed change per soft-start step (RPM).
    pub increment_rpm: f32,
    /// Minimum time between steps (ms).
    pub delay_ms: u64,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self {
            increment_rpm: 100.0,
            delay_ms: 50,
        }
    }
}

/// GPIO lines for the hardware backend; the PWM channel comes from `[pwm]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pins {
    pub enable: u8,
    pub direction: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control-loop cadence in milliseconds.
    pub tick_ms: u64,
    /// Upper bound on ticks before the CLI gives up waiting for convergence.
    pub max_ticks: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            max_ticks: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pwm: PwmCfg,
    #[serde(default)]
    pub mapping: MappingCfg,
    #[serde(default)]
    pub ramp: RampCfg,
    /// Only needed by the hardware backend.
    #[serde(default)]
    pub pins: Option<Pins>,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CubicToml {
    Array([f32; 4]),
    Table { c0: f32, c1: f32, c2: f32, c3: f32 },
}

fn de_cubic<'de, D>(deserializer: D) -> Result<Option<[f32; 4]>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<CubicToml> = Option::deserialize(deserializer)?;
    Ok(opt.map(|c| match c {
        CubicToml::Array(a) => a,
        CubicToml::Table { c0, c1, c2, c3 } => [c0, c1, c2, c3],
    }))
}

fn validate_band(name: &str, b: &DirectionBand) -> eyre::Result<()> {
    if !b.speed_lo.is_finite() || !b.speed_hi.is_finite() {
        eyre::bail!("pwm.{name} speeds must be finite");
    }
    if b.speed_lo < 0.0 {
        eyre::bail!("pwm.{name}.speed_lo must be >= 0");
    }
    if b.speed_lo >= b.speed_hi {
        eyre::bail!("pwm.{name}.speed_lo must be < speed_hi");
    }
    if !(0.0..=1.0).contains(&b.duty_lo) || !(0.0..=1.0).contains(&b.duty_hi) {
        eyre::bail!("pwm.{name} duties must be in [0.0, 1.0]");
    }
    if b.duty_lo > b.duty_hi {
        eyre::bail!("pwm.{name}.duty_lo must be <= duty_hi");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // PWM
        if !self.pwm.frequency_hz.is_finite() {
            eyre::bail!("pwm.frequency_hz must be finite");
        }
        if !(0.0..=1.0).contains(&self.pwm.duty_off) {
            eyre::bail!("pwm.duty_off must be in [0.0, 1.0]");
        }
        validate_band("cw", &self.pwm.cw)?;
        validate_band("ccw", &self.pwm.ccw)?;

        // Mapping
        if self.mapping.curve == Curve::Cubic {
            match self.mapping.cubic {
                None => eyre::bail!("mapping.cubic is required when mapping.curve = \"cubic\""),
                Some(c) if c.iter().any(|v| !v.is_finite()) => {
                    eyre::bail!("mapping.cubic coefficients must be finite")
                }
                Some(_) => {}
            }
        }

        // Ramp
        if !self.ramp.increment_rpm.is_finite() || self.ramp.increment_rpm <= 0.0 {
            eyre::bail!("ramp.increment_rpm must be > 0");
        }
        if self.ramp.delay_ms > 60 * 1000 {
            eyre::bail!("ramp.delay_ms is unreasonably large (>60s)");
        }

        // Pins
        if let Some(p) = &self.pins {
            if p.enable == p.direction {
                eyre::bail!("pins.enable and pins.direction must differ");
            }
            if self.pwm.channel > 1 {
                eyre::bail!("pwm.channel must be 0 or 1 when [pins] is set");
            }
        }

        // Runner
        if self.runner.tick_ms == 0 {
            eyre::bail!("runner.tick_ms must be >= 1");
        }
        if self.runner.max_ticks == 0 {
            eyre::bail!("runner.max_ticks must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
