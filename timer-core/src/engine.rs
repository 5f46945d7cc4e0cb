use crate::clock::{ClockSource, SystemClock};
use crate::error::TimerError;
use crate::finish::{ConsumerId, FinishEvent, FinishSignal};
use crate::laps::{Lap, LapTracker};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Countdown state machine.
///
/// While running only the absolute deadline is authoritative; remaining time is
/// recomputed from the clock on every read, so irregular polling never
/// accumulates error. In every other state the stored remaining time is
/// authoritative and there is no deadline.
#[derive(Debug)]
pub struct TimerEngine<C: ClockSource = SystemClock> {
    clock: C,
    state: TimerState,
    remaining_ms: u64,
    deadline_ms: Option<u64>,
    laps: LapTracker,
    finish: FinishSignal,
    runs: u64,
}

impl TimerEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for TimerEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> TimerEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: TimerState::Idle,
            remaining_ms: 0,
            deadline_ms: None,
            laps: LapTracker::new(),
            finish: FinishSignal::new(),
            runs: 0,
        }
    }

    /// Start a fresh run or resume a paused one.
    ///
    /// `requested_ms` is only consulted when there is no remaining time left
    /// (idle at zero, finished, or paused at zero). Returns `false`, changing
    /// nothing, when already running or when there is nothing to count down.
    pub fn start(&mut self, requested_ms: Option<u64>) -> bool {
        if self.state == TimerState::Running {
            return false;
        }

        let adopt = self.remaining_ms == 0;
        if adopt && requested_ms.unwrap_or(0) == 0 {
            log::debug!("start ignored: no duration ({:?})", self.state);
            return false;
        }
        let resume = self.state == TimerState::Paused && !adopt;
        if adopt {
            self.remaining_ms = requested_ms.unwrap_or(0);
        }

        let now = self.clock.now_ms();
        self.deadline_ms = Some(now.saturating_add(self.remaining_ms));
        if resume {
            self.laps.anchor_if_unset(self.remaining_ms);
            log::debug!("resumed with {} ms left", self.remaining_ms);
        } else {
            self.runs += 1;
            self.finish.arm();
            self.laps.anchor(self.remaining_ms);
            log::debug!("run {} started for {} ms", self.runs, self.remaining_ms);
        }
        self.state = TimerState::Running;
        true
    }

    /// Validate a caller-supplied duration before starting with it.
    ///
    /// Rejection happens before any state is touched.
    pub fn start_requested(&mut self, requested_ms: f64) -> Result<bool, TimerError> {
        let requested = validate_requested_ms(requested_ms)?;
        Ok(self.start(Some(requested)))
    }

    /// Freeze the remaining time. Returns `false` if not running.
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.remaining_ms = self.current_remaining();
        self.deadline_ms = None;
        self.state = TimerState::Paused;
        log::debug!("paused with {} ms left", self.remaining_ms);
        true
    }

    /// Back to idle with `configured_ms` on the clock; laps are dropped.
    pub fn reset(&mut self, configured_ms: u64) {
        self.state = TimerState::Idle;
        self.remaining_ms = configured_ms;
        self.deadline_ms = None;
        self.laps.reset();
        log::debug!("reset to {} ms", configured_ms);
    }

    /// Poll the deadline. Returns `true` only on the tick that finishes the run.
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        let now = self.clock.now_ms();
        self.remaining_ms = self.remaining_at(now);
        if self.remaining_ms > 0 {
            return false;
        }

        self.deadline_ms = None;
        self.state = TimerState::Finished;
        let event = FinishEvent {
            run: self.runs,
            finished_at_ms: now,
            laps: self.laps.len(),
        };
        log::info!("run {} finished after {} laps", event.run, event.laps);
        self.finish.fire(event);
        true
    }

    /// Replace the remaining time while not running (input or preset change).
    ///
    /// A new duration abandons any paused or finished run: the timer goes back
    /// to idle and that run's laps are dropped, so the next start is a fresh run.
    pub fn set_remaining(&mut self, ms: u64) -> Result<(), TimerError> {
        if self.state == TimerState::Running {
            return Err(TimerError::Precondition {
                op: "set_remaining",
                state: self.state,
            });
        }
        self.state = TimerState::Idle;
        self.remaining_ms = ms;
        self.laps.reset();
        log::debug!("remaining set to {} ms", ms);
        Ok(())
    }

    pub fn current_remaining(&self) -> u64 {
        match self.state {
            TimerState::Running => self.remaining_at(self.clock.now_ms()),
            _ => self.remaining_ms,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Mark a lap. Rejected without side effects unless running.
    pub fn record_lap(&mut self) -> Result<Lap, TimerError> {
        if self.state != TimerState::Running {
            return Err(TimerError::Precondition {
                op: "record_lap",
                state: self.state,
            });
        }
        let lap = self.laps.record(self.current_remaining());
        log::debug!("lap {}: {} ms", self.laps.len(), lap.duration_ms);
        Ok(lap)
    }

    pub fn clear_laps(&mut self) {
        let anchor = self.is_running().then(|| self.current_remaining());
        self.laps.clear(anchor);
    }

    pub fn laps(&self) -> &[Lap] {
        self.laps.laps()
    }

    /// Register a finish consumer; consumers run in registration order.
    pub fn on_finish<F>(&mut self, consumer: F) -> ConsumerId
    where
        F: FnMut(&FinishEvent) + 'static,
    {
        self.finish.subscribe(consumer)
    }

    pub fn remove_consumer(&mut self, id: ConsumerId) -> bool {
        self.finish.unsubscribe(id)
    }

    /// Number of fresh runs started so far.
    pub fn run_count(&self) -> u64 {
        self.runs
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn remaining_at(&self, now_ms: u64) -> u64 {
        self.deadline_ms
            .map(|deadline| deadline.saturating_sub(now_ms))
            .unwrap_or(0)
    }
}

/// Turn a floating point millisecond value into a requested duration.
pub fn validate_requested_ms(ms: f64) -> Result<u64, TimerError> {
    if !ms.is_finite() {
        return Err(TimerError::InvalidDuration(format!("{} is not finite", ms)));
    }
    if ms < 0.0 {
        return Err(TimerError::InvalidDuration(format!("{} is negative", ms)));
    }
    // u64::MAX rounds up to 2^64 as f64, so anything at or above it is out of range
    if ms >= u64::MAX as f64 {
        return Err(TimerError::InvalidDuration(format!("{} is too long", ms)));
    }
    Ok(ms as u64)
}
