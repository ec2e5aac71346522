#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must either fail to parse or yield a Config whose
    // validation and conversion into the runtime mapping never panic.
    if let Ok(cfg) = spindle_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let mapping = spindle_core::DutyMapping::from(&cfg);
        for dir in [spindle_core::Direction::Cw, spindle_core::Direction::Ccw] {
            let _ = mapping.clamp_speed(dir, cfg.pwm.cw.speed_hi);
            let _ = mapping.compute_duty(dir.into(), cfg.pwm.ccw.speed_lo, 0.0);
        }
    }
});
