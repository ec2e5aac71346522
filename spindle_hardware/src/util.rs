use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use spindle_traits::Clock;

/// Soft-start delay timer shared by the PWM backends.
///
/// Disabled until `begin()`; `elapsed(delay)` compares against the instant of
/// the last `begin()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftStartTimer {
    started: Option<Instant>,
}

impl SoftStartTimer {
    pub fn begin(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn end(&mut self) {
        self.started = None;
    }

    pub fn enabled(&self) -> bool {
        self.started.is_some()
    }

    /// True when disabled or when `delay` has passed since `begin()`.
    pub fn elapsed(&self, clock: &dyn Clock, delay: Duration) -> bool {
        match self.started {
            Some(t0) => clock.elapsed_since(t0) >= delay,
            None => true,
        }
    }
}

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_traits::ManualClock;

    #[test]
    fn timer_measures_from_begin() {
        let clock = ManualClock::new();
        let mut t = SoftStartTimer::default();
        assert!(!t.enabled());
        t.begin(clock.now());
        assert!(t.enabled());
        assert!(!t.elapsed(&clock, Duration::from_millis(5)));
        clock.advance(Duration::from_millis(5));
        assert!(t.elapsed(&clock, Duration::from_millis(5)));
        t.end();
        assert!(!t.enabled());
    }
}
