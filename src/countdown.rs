use timer_core::format::hms_parts;
use timer_core::sinks::DurationInput;
use timer_core::{ClockSource, Lap, SystemClock, TimerEngine, TimerError, TimerState};

const MAX_HOURS: u64 = 99;
const MAX_MINUTES: u64 = 59;
const MAX_SECONDS: u64 = 59;

/// The three duration fields the user edits, each clamped to its range.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DurationFields {
    hours: u64,
    minutes: u64,
    seconds: u64,
}

impl DurationFields {
    pub fn new(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self {
            hours: hours.min(MAX_HOURS),
            minutes: minutes.min(MAX_MINUTES),
            seconds: seconds.min(MAX_SECONDS),
        }
    }

    /// Split a duration into fields. Anything past 99:59:59 is clamped.
    pub fn from_ms(ms: u64) -> Self {
        let (h, m, s) = hms_parts(ms);
        if h > MAX_HOURS {
            return Self::new(MAX_HOURS, MAX_MINUTES, MAX_SECONDS);
        }
        Self::new(h, m, s)
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }
}

impl DurationInput for DurationFields {
    fn requested_ms(&self) -> u64 {
        (self.hours * 3600 + self.minutes * 60 + self.seconds) * 1000
    }
}

pub const DEFAULT_PRESETS_MIN: [u32; 5] = [1, 3, 5, 10, 25];

/// One countdown plus the input that configures it.
pub struct CountdownState<C: ClockSource = SystemClock> {
    pub timer: TimerEngine<C>,
    pub input: DurationFields,
    pub presets_min: Vec<u32>,
}

impl CountdownState<SystemClock> {
    pub fn new(input: DurationFields, presets_min: Vec<u32>) -> Self {
        Self::with_timer(TimerEngine::new(), input, presets_min)
    }
}

impl<C: ClockSource> CountdownState<C> {
    pub fn with_timer(
        mut timer: TimerEngine<C>,
        input: DurationFields,
        presets_min: Vec<u32>,
    ) -> Self {
        timer.reset(input.requested_ms());
        Self {
            timer,
            input,
            presets_min,
        }
    }

    /// Start/pause toggle. Returns the state after the toggle.
    pub fn toggle(&mut self) -> TimerState {
        match self.timer.state() {
            TimerState::Running => {
                self.timer.pause();
            }
            _ => {
                if !self.timer.start(Some(self.input.requested_ms())) {
                    log::info!("nothing to count down, set a duration first");
                }
            }
        }
        self.timer.state()
    }

    pub fn reset(&mut self) {
        self.timer.reset(self.input.requested_ms());
    }

    /// Replace the input. The timer picks it up right away unless running.
    pub fn set_input(&mut self, input: DurationFields) {
        self.input = input;
        if !self.timer.is_running() {
            // Only fails while running, which was just ruled out
            if let Err(e) = self.timer.set_remaining(input.requested_ms()) {
                log::warn!("input not applied: {}", e);
            }
        }
    }

    pub fn apply_preset(&mut self, minutes: u32) {
        self.set_input(DurationFields::from_ms(u64::from(minutes) * 60 * 1000));
    }

    pub fn lap(&mut self) -> Result<Lap, TimerError> {
        self.timer.record_lap()
    }

    pub fn clear_laps(&mut self) {
        self.timer.clear_laps();
    }

    pub fn remaining_ms(&self) -> u64 {
        self.timer.current_remaining()
    }
}
