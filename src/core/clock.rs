use std::time::{Duration, Instant};

/// Minimal app clock - tracks delta time and paces the next tick
#[derive(Debug)]
pub struct Clock {
    last_tick: Instant,
}

impl Clock {
    /// Create new clock starting now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Get delta time since last tick and advance clock
    /// Returns delta in seconds
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        delta
    }

    /// Instant at which the next tick is due for a loop paced at `rate` Hz
    pub fn next_deadline(&self, rate: f32) -> Instant {
        let period = Duration::from_secs_f32(1.0 / rate.max(1.0));
        self.last_tick + period
    }

    /// Reset clock to current time
    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clock_measures_delta() {
        let mut clock = Clock::new();

        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();

        // At least the slept time
        assert!(delta >= 0.009);
    }

    #[test]
    fn clock_resets() {
        let mut clock = Clock::new();

        thread::sleep(Duration::from_millis(10));
        clock.reset();

        let delta = clock.tick();
        // Should be very small since we just reset
        assert!(delta < 0.005);
    }

    #[test]
    fn clock_deadline_follows_rate() {
        let clock = Clock::new();
        let deadline = clock.next_deadline(25.0);
        let period = deadline.duration_since(clock.last_tick);
        assert_eq!(period, Duration::from_secs_f32(0.04));
    }
}
