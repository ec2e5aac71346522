use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use spindle_core::{
    DirectionBand, DutyCurve, DutyMapping, RampCfg, RampStatus, SoftStartRamper, SpindleMode,
    SpindleRuntimeState,
};
use spindle_hardware::SimulatedPwm;
use spindle_traits::ManualClock;

fn mapping(curve: DutyCurve) -> DutyMapping {
    DutyMapping {
        cw: DirectionBand {
            speed_lo: 0.0,
            speed_hi: 24_000.0,
            duty_lo: 0.05,
            duty_hi: 0.95,
        },
        curve,
        ..DutyMapping::default()
    }
}

pub fn bench_compute_duty(c: &mut Criterion) {
    let mut g = c.benchmark_group("compute_duty");
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(1));
    }

    let speeds: Vec<f32> = (0..10_000).map(|i| i as f32 * 2.4).collect();
    for (name, curve) in [
        ("linear", DutyCurve::Linear),
        ("cubic", DutyCurve::Cubic([0.05, 3.0e-5, 1.0e-10, 0.0])),
    ] {
        let m = mapping(curve);
        g.bench_function(name, |b| {
            b.iter(|| {
                let mut prev = 0.0f32;
                for &s in black_box(&speeds) {
                    black_box(m.compute_duty(SpindleMode::CW, s, prev));
                    prev = s;
                }
            });
        });
    }
    g.finish();
}

pub fn bench_full_ramp(c: &mut Criterion) {
    let m = mapping(DutyCurve::Linear);
    c.bench_function("ramp_0_to_24000_by_100", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new();
                let pwm = SimulatedPwm::new(clock.clone());
                let st = SpindleRuntimeState::new(RampCfg {
                    increment: 100.0,
                    delay: Duration::from_millis(1),
                });
                (clock, pwm, st)
            },
            |(clock, mut pwm, mut st)| {
                let ramper = SoftStartRamper {
                    channel: 1,
                    mapping: &m,
                };
                while let Ok(RampStatus::Stepped { .. }) =
                    ramper.step(&mut pwm, &mut st, SpindleMode::CW, black_box(24_000.0))
                {
                    clock.advance(Duration::from_millis(1));
                }
                black_box(st.previous_applied_speed());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(ramp, bench_compute_duty, bench_full_ramp);
criterion_main!(ramp);
