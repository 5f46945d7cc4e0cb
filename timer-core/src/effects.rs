//! Time-sequenced side effects that run after a finish, outside the engine.

pub const FLASH_PERIOD_MS: u64 = 500;
pub const FLASH_STEPS: u64 = 6;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlashFrame {
    /// Show the alert title.
    Alert,
    /// Show the normal title.
    Original,
    /// Sequence over; restore the normal title and drop the effect.
    Done,
}

/// Flashing-title sequence started by a finish event.
///
/// Pure function of the clock: the owner polls [`frame_at`](Self::frame_at)
/// as often as it likes and applies whatever frame comes back.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TitleFlash {
    started_at_ms: u64,
}

impl TitleFlash {
    pub fn new(started_at_ms: u64) -> Self {
        Self { started_at_ms }
    }

    pub fn frame_at(&self, now_ms: u64) -> FlashFrame {
        let step = now_ms.saturating_sub(self.started_at_ms) / FLASH_PERIOD_MS;
        match step {
            0 => FlashFrame::Original,
            s if s >= FLASH_STEPS => FlashFrame::Done,
            s if s % 2 == 1 => FlashFrame::Alert,
            _ => FlashFrame::Original,
        }
    }
}
