//! Time subsystem.
//!
//! - [`Timespan`]: a duration in seconds
//! - [`Clock`]: one per window; `tick()` once per presented frame
//! - [`Timer`]: stopwatch for ad-hoc measurements

mod clock;
mod timer;
mod timespan;

pub use clock::{Clock, FrameTime};
pub use timer::Timer;
pub use timespan::Timespan;
