use std::io::Write;

use timer_core::sinks::{DisplaySink, TitleSink};
use timer_core::{format_time, ClockSource, Lap, TimerState};

use crate::countdown::CountdownState;

pub const APP_TITLE: &str = "Countdown";
pub const ALERT_TITLE: &str = "⏰ Time's up!";
const MAX_VISIBLE_LAPS: usize = 10;

const CLEAR: &str = "\x1b[2J\x1b[H";

pub const HELP_TEXT: &str = "COUNTDOWN HELP
ENTER / s   start or pause
r           reset to the input duration
l           mark a lap (while running)
c           clear laps
p <min>     use a preset, e.g. p 5
d <time>    set input: SS, MM:SS or HH:MM:SS
sound       toggle the finish beeps
vibrate     toggle vibration
q           quit";

/// Title shown while a countdown is in progress.
pub fn running_title(remaining_ms: u64, running: bool) -> Option<String> {
    if running && remaining_ms > 0 {
        Some(format!("{} · Timer", format_time(remaining_ms)))
    } else {
        None
    }
}

pub fn lap_line(index: usize, lap: &Lap) -> String {
    format!(
        "Lap {:2}  {}  (left {})",
        index + 1,
        format_time(lap.duration_ms),
        format_time(lap.remaining_at_lap_ms)
    )
}

fn state_label(state: TimerState) -> &'static str {
    match state {
        TimerState::Idle => "ready",
        TimerState::Running => "running",
        TimerState::Paused => "paused",
        TimerState::Finished => "finished",
    }
}

/// ANSI terminal surface: text goes to `out`, the title through the OSC 0
/// escape sequence.
pub struct TerminalScreen<W: Write> {
    out: W,
    title: String,
}

impl<W: Write> TerminalScreen<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            title: APP_TITLE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            log::warn!("can't write to terminal: {}", e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            log::warn!("can't flush terminal: {}", e);
        }
    }
}

impl<W: Write> DisplaySink for TerminalScreen<W> {
    fn show_time(&mut self, text: &str) {
        self.emit(&format!("\n      {}\n\n", text));
    }

    fn show_laps(&mut self, laps: &[Lap]) {
        // Most recent first
        for (i, lap) in laps.iter().enumerate().rev().take(MAX_VISIBLE_LAPS) {
            let line = lap_line(i, lap);
            self.emit(&format!("  {}\n", line));
        }
        if laps.len() > MAX_VISIBLE_LAPS {
            self.emit(&format!("  ... {} earlier\n", laps.len() - MAX_VISIBLE_LAPS));
        }
    }
}

impl<W: Write> TitleSink for TerminalScreen<W> {
    fn set_title(&mut self, title: &str) {
        if self.title == title {
            return;
        }
        self.title = title.to_string();
        self.emit(&format!("\x1b]0;{}\x07", title));
        self.flush();
    }

    fn restore_title(&mut self) {
        self.set_title(APP_TITLE);
    }
}

pub fn draw_countdown<W: Write, C: ClockSource>(
    screen: &mut TerminalScreen<W>,
    state: &CountdownState<C>,
    alerts_label: &str,
) {
    let remaining = state.remaining_ms();
    let timer_state = state.timer.state();

    screen.emit(CLEAR);
    screen.emit(&format!("COUNTDOWN  [{}]\n", state_label(timer_state)));
    screen.show_time(&format_time(remaining));
    screen.emit(&format!(
        "input {:02}:{:02}:{:02}   presets {:?} min   {}\n\n",
        state.input.hours(),
        state.input.minutes(),
        state.input.seconds(),
        state.presets_min,
        alerts_label
    ));
    screen.show_laps(state.timer.laps());
    screen.emit("\nENTER=start/pause  r=reset  l=lap  c=clear laps  ?=help  q=quit\n> ");
    screen.flush();
}

pub fn draw_help<W: Write>(screen: &mut TerminalScreen<W>) {
    screen.emit(CLEAR);
    for line in HELP_TEXT.lines() {
        screen.emit(&format!("  {}\n", line));
    }
    screen.emit("\nPress ENTER to close\n> ");
    screen.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::{DurationFields, DEFAULT_PRESETS_MIN};
    use timer_core::{ManualClock, TimerEngine};

    fn rendered(screen: &TerminalScreen<Vec<u8>>) -> String {
        String::from_utf8_lossy(screen.output()).into_owned()
    }

    #[test]
    fn test_running_title() {
        assert_eq!(running_title(65_000, true), Some("01:05 · Timer".to_string()));
        assert_eq!(running_title(65_000, false), None);
        assert_eq!(running_title(0, true), None);
    }

    #[test]
    fn test_lap_line() {
        let lap = Lap { duration_ms: 2_000, remaining_at_lap_ms: 3_000 };
        assert_eq!(lap_line(0, &lap), "Lap  1  00:02  (left 00:03)");
    }

    #[test]
    fn test_title_only_written_on_change() {
        let mut screen = TerminalScreen::new(Vec::new());
        screen.set_title("04:59 · Timer");
        screen.set_title("04:59 · Timer");
        assert_eq!(rendered(&screen).matches("\x1b]0;").count(), 1);
        screen.restore_title();
        assert_eq!(screen.title(), APP_TITLE);
    }

    #[test]
    fn test_laps_most_recent_first() {
        let mut screen = TerminalScreen::new(Vec::new());
        let laps: Vec<Lap> = (0..12)
            .map(|i| Lap { duration_ms: 1_000, remaining_at_lap_ms: 60_000 - i * 1_000 })
            .collect();
        screen.show_laps(&laps);
        let text = rendered(&screen);
        let first = text.lines().next().unwrap();
        assert!(first.contains("Lap 12"));
        assert!(!text.contains("Lap  2 "));
        assert!(text.contains("... 2 earlier"));
    }

    #[test]
    fn test_draw_countdown() {
        let clock = ManualClock::new(0);
        let state = CountdownState::with_timer(
            TimerEngine::with_clock(clock),
            DurationFields::new(0, 5, 0),
            DEFAULT_PRESETS_MIN.to_vec(),
        );
        let mut screen = TerminalScreen::new(Vec::new());
        draw_countdown(&mut screen, &state, "sound on");
        let text = rendered(&screen);
        assert!(text.contains("COUNTDOWN  [ready]"));
        assert!(text.contains("05:00"));
        assert!(text.contains("input 00:05:00"));
    }
}
