//! Pure countdown logic with no platform dependencies.
//! Testable on host against a manual clock, driven by any poll loop.

mod clock;
mod engine;
mod error;
mod finish;
mod laps;

pub mod effects;
pub mod format;
pub mod sinks;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use engine::{validate_requested_ms, TimerEngine, TimerState};
pub use error::TimerError;
pub use finish::{ConsumerId, FinishEvent, FinishSignal};
pub use format::{format_time, parse_duration};
pub use laps::{Lap, LapTracker};
