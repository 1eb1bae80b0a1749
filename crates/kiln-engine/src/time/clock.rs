use std::time::{Duration, Instant};

use super::Timespan;

/// Frame timing snapshot returned by [`Clock::tick`].
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous tick.
    pub delta: Timespan,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Elapsed-time and frame-delta clock.
///
/// Delta time is clamped so a debugger pause or a minimized window does not produce a
/// huge step (or a zero one from a tight loop).
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    last_tick: Instant,
    delta: Timespan,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl Clock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            delta: Timespan::ZERO,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts elapsed-time measurement and returns the time measured so far.
    ///
    /// Also rebases the tick baseline, so the next delta does not include the pause.
    pub fn restart(&mut self) -> Timespan {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.start);
        self.start = now;
        self.last_tick = now;
        elapsed.into()
    }

    /// Time since creation or the last [`restart`](Self::restart).
    pub fn elapsed_time(&self) -> Timespan {
        self.start.elapsed().into()
    }

    /// Delta measured by the last [`tick`](Self::tick).
    pub fn delta_time(&self) -> Timespan {
        self.delta
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Advances the clock by one frame.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last_tick)
            .clamp(self.dt_min, self.dt_max);

        self.last_tick = now;
        self.delta = dt.into();

        let ft = FrameTime {
            delta: self.delta,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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

    #[test]
    fn delta_is_clamped() {
        let mut clock = Clock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        let base = clock.last_tick;

        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert_eq!(ft.delta, Timespan::from_seconds(0.1));
        assert_eq!(ft.frame_index, 0);

        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert_eq!(ft.delta, Timespan::from_seconds(0.001));
        assert_eq!(clock.delta_time(), ft.delta);
        assert_eq!(clock.frame_index(), 2);
    }

    #[test]
    fn restart_resets_elapsed_time() {
        let mut clock = Clock::new();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.restart().as_millis() >= 2.0);
        assert!(clock.elapsed_time().as_millis() < 1000.0);
    }
}
