use std::fmt;
use std::time::Duration;

/// Duration in seconds.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
pub struct Timespan {
    seconds: f32,
}

impl Timespan {
    pub const ZERO: Self = Self { seconds: 0.0 };

    #[inline]
    pub const fn from_seconds(seconds: f32) -> Self {
        Self { seconds }
    }

    #[inline]
    pub const fn as_seconds(self) -> f32 {
        self.seconds
    }

    #[inline]
    pub fn as_millis(self) -> f32 {
        self.seconds * 1e3
    }

    #[inline]
    pub fn as_micros(self) -> f32 {
        self.seconds * 1e6
    }

    #[inline]
    pub fn as_nanos(self) -> f32 {
        self.seconds * 1e9
    }
}

impl From<Duration> for Timespan {
    fn from(d: Duration) -> Self {
        Self::from_seconds(d.as_secs_f32())
    }
}

impl From<Timespan> for f32 {
    fn from(t: Timespan) -> Self {
        t.seconds
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sec", self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions() {
        let t = Timespan::from_seconds(0.5);
        assert_eq!(t.as_millis(), 500.0);
        assert_eq!(t.as_micros(), 500_000.0);
        assert_eq!(Timespan::from(Duration::from_millis(250)).as_seconds(), 0.25);
        assert_eq!(t.to_string(), "0.5 sec");
    }
}
