use std::io::Write;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use timer_core::sinks::NotificationSink;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub sound: bool,
    pub vibration: bool,
    pub title_flash: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
            title_flash: true,
        }
    }
}

/// On/off durations in milliseconds, starting with "on".
pub const VIBRATION_PATTERN: [u32; 5] = [200, 120, 200, 120, 400];

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Waveform {
    Triangle,
    Square,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tone {
    pub offset_ms: u64,
    pub freq_hz: u32,
    pub duration_ms: u64,
    pub waveform: Waveform,
    pub gain: f32,
}

/// Three short rising beeps then a longer one.
pub const FINISH_TONES: [Tone; 4] = [
    tone(0, 880, 150, Waveform::Triangle, 0.05),
    tone(200, 988, 150, Waveform::Triangle, 0.05),
    tone(400, 1046, 150, Waveform::Triangle, 0.05),
    tone(700, 880, 500, Waveform::Square, 0.06),
];

const fn tone(
    offset_ms: u64,
    freq_hz: u32,
    duration_ms: u64,
    waveform: Waveform,
    gain: f32,
) -> Tone {
    Tone {
        offset_ms,
        freq_hz,
        duration_ms,
        waveform,
        gain,
    }
}

/// Time to wait before each tone, given the pattern's absolute offsets.
pub fn tone_delays(tones: &[Tone]) -> Vec<u64> {
    let mut last = 0;
    tones
        .iter()
        .map(|tone| {
            let wait = tone.offset_ms.saturating_sub(last);
            last = tone.offset_ms;
            wait
        })
        .collect()
}

/// Notification sink for a plain terminal: the bell stands in for the tones,
/// and with no haptics available the vibration pattern is only logged.
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn play_finish_pattern(&self) {
        let spawned = thread::Builder::new()
            .name("finish-beeps".into())
            .spawn(|| {
                for (tone, wait) in FINISH_TONES.iter().zip(tone_delays(&FINISH_TONES)) {
                    thread::sleep(Duration::from_millis(wait));
                    let mut out = std::io::stdout();
                    if out.write_all(b"\x07").and_then(|_| out.flush()).is_err() {
                        return;
                    }
                    log::debug!(
                        "beep {} Hz {:?} for {} ms at gain {}",
                        tone.freq_hz,
                        tone.waveform,
                        tone.duration_ms,
                        tone.gain
                    );
                }
            });
        if let Err(e) = spawned {
            log::warn!("can't play finish pattern: {}", e);
        }
    }

    fn vibrate(&self, pattern: &[u32]) {
        log::info!("vibrate {:?}", pattern);
    }
}

pub fn fire_alert(config: &AlertConfig, sink: &dyn NotificationSink) {
    if config.sound {
        sink.play_finish_pattern();
    }
    if config.vibration {
        sink.vibrate(&VIBRATION_PATTERN);
    }
}
