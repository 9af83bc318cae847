/// Self-contained timers - accumulate delta time and decide when to fire

/// Fixed rate timer - fires at specific Hz
#[derive(Debug, Clone, Copy)]
pub struct FixedHz {
    pub interval: f32,
    pub accumulator: f32,
}

impl FixedHz {
    /// Create timer that fires at given frequency
    pub fn new(hz: f32) -> Self {
        Self {
            interval: 1.0 / hz,
            accumulator: 0.0,
        }
    }

    /// Timer that fires once every `seconds`
    pub fn every(seconds: f32) -> Self {
        Self {
            interval: seconds,
            accumulator: 0.0,
        }
    }

    /// Update with delta, returns true if should fire
    pub fn tick(&mut self, delta: f32) -> bool {
        self.accumulator += delta;

        if self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            true
        } else {
            false
        }
    }
}

/// Throttled timer - minimum interval between fires
///
/// Leftover time is discarded on each fire, so a stalled loop never produces
/// a burst of catch-up ticks.
#[derive(Debug, Clone, Copy)]
pub struct Throttled {
    min_interval: f32,
    time_since_last: f32,
}

impl Throttled {
    /// Create throttled timer with minimum interval
    pub fn new(min_interval: f32) -> Self {
        Self {
            min_interval,
            time_since_last: min_interval, // Allow immediate first tick
        }
    }

    /// Throttle to at most `rate` fires per second
    pub fn per_second(rate: f32) -> Self {
        Self::new(1.0 / rate.max(f32::EPSILON))
    }

    /// Attempt to fire, returns true if enough time has passed
    pub fn try_tick(&mut self, delta: f32) -> bool {
        self.time_since_last += delta;

        if self.time_since_last >= self.min_interval {
            self.time_since_last = 0.0;
            true
        } else {
            false
        }
    }
}
