/// One user-marked checkpoint of a countdown run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Lap {
    /// Time consumed since the previous lap (or since the run started).
    pub duration_ms: u64,
    /// Remaining time at the moment the lap was taken.
    pub remaining_at_lap_ms: u64,
}

/// Lap sequence plus the remaining-time snapshot the next lap is measured from.
///
/// The tracker never reads the clock itself; the engine hands it the current
/// remaining time so both agree on a single reading.
#[derive(Clone, Debug, Default)]
pub struct LapTracker {
    laps: Vec<Lap>,
    cursor: Option<u64>,
}

impl LapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, current_remaining_ms: u64) -> Lap {
        let anchor = *self.cursor.get_or_insert(current_remaining_ms);
        let lap = Lap {
            duration_ms: anchor.saturating_sub(current_remaining_ms),
            remaining_at_lap_ms: current_remaining_ms,
        };
        self.laps.push(lap);
        self.cursor = Some(current_remaining_ms);
        lap
    }

    /// Drop all laps. `anchor` is the remaining time to measure the next lap
    /// from, or `None` when the timer is not running.
    pub fn clear(&mut self, anchor: Option<u64>) {
        self.laps.clear();
        self.cursor = anchor;
    }

    /// Re-anchor without touching the recorded laps.
    pub fn anchor(&mut self, remaining_ms: u64) {
        self.cursor = Some(remaining_ms);
    }

    /// Anchor only if nothing has been anchored since the last clear.
    pub fn anchor_if_unset(&mut self, remaining_ms: u64) {
        self.cursor.get_or_insert(remaining_ms);
    }

    pub fn reset(&mut self) {
        self.clear(None);
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    /// Sum of all lap durations.
    pub fn total_ms(&self) -> u64 {
        self.laps.iter().map(|lap| lap.duration_ms).sum()
    }
}
