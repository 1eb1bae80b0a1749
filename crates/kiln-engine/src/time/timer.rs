use std::time::Instant;

use super::Timespan;

/// Stopwatch.
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Timespan {
        self.start.elapsed().into()
    }

    /// Returns the elapsed time and starts a new measurement.
    pub fn stop(&mut self) -> Timespan {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.start);
        self.start = now;
        elapsed.into()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn stop_starts_a_new_lap() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        let lap = timer.stop();
        assert!(lap.as_millis() >= 5.0);
        assert!(timer.elapsed() < lap);
    }
}
