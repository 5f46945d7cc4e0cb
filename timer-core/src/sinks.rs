//! Call shapes of the collaborators around the engine.
//!
//! The engine never calls these itself; they describe what the application
//! layer must provide so that display, input and notification code can be
//! swapped without touching timing logic.

use crate::laps::Lap;

/// Yields the duration the user has configured, in milliseconds.
pub trait DurationInput {
    fn requested_ms(&self) -> u64;
}

pub trait DisplaySink {
    fn show_time(&mut self, text: &str);
    fn show_laps(&mut self, laps: &[Lap]);
}

pub trait NotificationSink {
    fn play_finish_pattern(&self);
    fn vibrate(&self, pattern: &[u32]);
}

pub trait TitleSink {
    fn set_title(&mut self, title: &str);
    fn restore_title(&mut self);
}
