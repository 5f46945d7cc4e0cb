mod alerts;
mod countdown;
mod storage;
mod ui;

use std::cell::RefCell;
use std::error::Error as StdError;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use timer_core::effects::{FlashFrame, TitleFlash};
use timer_core::sinks::{DurationInput, TitleSink};
use timer_core::{parse_duration, ClockSource, FinishEvent, TimerError, TimerState};
use tracing_subscriber::EnvFilter;

use crate::alerts::{fire_alert, AlertConfig, TerminalNotifier};
use crate::countdown::{CountdownState, DurationFields};
use crate::storage::{Preferences, StorageError, TimerStorage};
use crate::ui::TerminalScreen;

#[derive(Parser, Debug)]
#[command(name = "countdown")]
#[command(about = "Countdown timer with laps and finish alerts")]
#[command(version)]
struct Args {
    /// Initial duration: SS, MM:SS or HH:MM:SS (defaults to the last one used)
    #[arg(short, long)]
    duration: Option<String>,

    /// Display refresh period in milliseconds while running
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Don't beep when the countdown finishes
    #[arg(long)]
    no_sound: bool,

    /// Don't vibrate when the countdown finishes
    #[arg(long)]
    no_vibrate: bool,

    /// Don't flash the terminal title when the countdown finishes
    #[arg(long)]
    no_flash: bool,

    /// Store the effective alert settings and poll period as preferences
    #[arg(long)]
    save: bool,

    /// Preferences file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("invalid --duration")]
    Duration(#[from] TimerError),

    #[error("preferences")]
    Storage(#[from] StorageError),

    #[error("can't start worker thread")]
    Spawn(#[source] io::Error),
}

#[derive(Debug)]
enum AppOp {
    Redraw,
    Input(String),
    Pump,
    Finished(FinishEvent),
    Quit,
}

#[derive(Debug)]
enum PumpOp {
    Start(u64),
    Stop,
    Quit,
}

#[derive(Debug, PartialEq)]
enum Command {
    Toggle,
    Reset,
    Lap,
    ClearLaps,
    Preset(u32),
    SetDuration(String),
    ToggleSound,
    ToggleVibration,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    match word {
        "" | "s" => Some(Command::Toggle),
        "r" | "R" => Some(Command::Reset),
        "l" => Some(Command::Lap),
        "c" => Some(Command::ClearLaps),
        "p" => rest.parse().ok().map(Command::Preset),
        "d" if !rest.is_empty() => Some(Command::SetDuration(rest.to_string())),
        "sound" => Some(Command::ToggleSound),
        "vibrate" => Some(Command::ToggleVibration),
        "?" | "h" | "help" => Some(Command::Help),
        "q" | "quit" => Some(Command::Quit),
        _ => None,
    }
}

/// An empty line on the help screen just closes it; anything else is also
/// dispatched as a command.
fn closes_help_only(line: &str) -> bool {
    line.trim().is_empty()
}

struct CountdownApp<C: ClockSource> {
    countdown: CountdownState<C>,
    screen: TerminalScreen<io::Stdout>,
    storage: TimerStorage,
    prefs: Preferences,
    alerts: Rc<RefCell<AlertConfig>>,

    pump: Sender<PumpOp>,
    pump_running: bool,
    flash: Option<TitleFlash>,
    help_visible: bool,
}

impl<C: ClockSource> CountdownApp<C> {
    fn now_ms(&self) -> u64 {
        self.countdown.timer.clock().now_ms()
    }

    fn redraw(&mut self) {
        if self.help_visible {
            ui::draw_help(&mut self.screen);
            return;
        }
        let label = {
            let alerts = self.alerts.borrow();
            format!(
                "sound {}  vibrate {}",
                if alerts.sound { "on" } else { "off" },
                if alerts.vibration { "on" } else { "off" }
            )
        };
        ui::draw_countdown(&mut self.screen, &self.countdown, &label);
        self.update_title();
    }

    fn update_title(&mut self) {
        if self.flash.is_some() {
            return;
        }
        let running = self.countdown.timer.is_running();
        match ui::running_title(self.countdown.remaining_ms(), running) {
            Some(title) => self.screen.set_title(&title),
            None => self.screen.restore_title(),
        }
    }

    fn start_pump(&mut self) {
        if !self.pump_running {
            self.pump_running = true;
            self.pump.send(PumpOp::Start(self.prefs.poll_ms)).ok();
            log::debug!("pump started at {} ms", self.prefs.poll_ms);
        }
    }

    fn stop_pump(&mut self) {
        if self.pump_running {
            self.pump_running = false;
            self.pump.send(PumpOp::Stop).ok();
            log::debug!("pump stopped");
        }
    }

    fn sync_pump(&mut self) {
        if self.countdown.timer.is_running() || self.flash.is_some() {
            self.start_pump();
        } else {
            self.stop_pump();
        }
    }

    fn handle_pump(&mut self) {
        // Finish consumers run inside tick(); the resulting Finished op
        // arrives through the channel after this pump.
        self.countdown.timer.tick();

        if let Some(flash) = self.flash {
            match flash.frame_at(self.now_ms()) {
                FlashFrame::Alert => self.screen.set_title(ui::ALERT_TITLE),
                FlashFrame::Original => self.screen.restore_title(),
                FlashFrame::Done => {
                    self.flash = None;
                    self.screen.restore_title();
                }
            }
        }

        self.sync_pump();
        if !self.help_visible {
            self.redraw();
        }
    }

    fn handle_finished(&mut self, event: FinishEvent) {
        log::info!("countdown finished (run {}, {} laps)", event.run, event.laps);
        if self.alerts.borrow().title_flash {
            self.flash = Some(TitleFlash::new(event.finished_at_ms));
        }
        self.sync_pump();
        self.redraw();
    }

    fn cancel_flash(&mut self) {
        if self.flash.take().is_some() {
            self.screen.restore_title();
        }
    }

    fn handle_input(&mut self, line: &str) -> bool {
        if self.help_visible {
            self.help_visible = false;
            if closes_help_only(line) {
                self.redraw();
                return true;
            }
        }

        let Some(command) = parse_command(line) else {
            log::info!("unknown command {:?}, '?' for help", line.trim());
            self.redraw();
            return true;
        };
        log::debug!("command {:?}", command);

        match command {
            Command::Toggle => {
                let before = self.countdown.timer.state();
                let after = self.countdown.toggle();
                if before != TimerState::Paused && after == TimerState::Running {
                    self.cancel_flash();
                }
            }
            Command::Reset => {
                self.countdown.reset();
                self.cancel_flash();
            }
            Command::Lap => {
                if let Err(e) = self.countdown.lap() {
                    log::info!("{}", e);
                }
            }
            Command::ClearLaps => self.countdown.clear_laps(),
            Command::Preset(minutes) => {
                self.countdown.apply_preset(minutes);
                self.remember_input();
            }
            Command::SetDuration(text) => match parse_duration(&text) {
                Ok(ms) => {
                    self.countdown.set_input(DurationFields::from_ms(ms));
                    self.remember_input();
                }
                Err(e) => log::warn!("{}", e),
            },
            Command::ToggleSound => {
                let mut alerts = self.alerts.borrow_mut();
                alerts.sound = !alerts.sound;
            }
            Command::ToggleVibration => {
                let mut alerts = self.alerts.borrow_mut();
                alerts.vibration = !alerts.vibration;
            }
            Command::Help => self.help_visible = true,
            Command::Quit => return false,
        }

        self.sync_pump();
        self.redraw();
        true
    }

    fn remember_input(&mut self) {
        self.prefs.last_duration_ms = self.countdown.input.requested_ms();
        self.prefs.alerts = self.alerts.borrow().clone();
        if let Err(e) = self.storage.save_preferences(&self.prefs) {
            log::error!("Failed to save preferences: {:?}", e);
        }
    }
}

fn pump_thread(ctl: Receiver<PumpOp>, main: Sender<AppOp>) {
    let mut interval_ms = storage::DEFAULT_POLL_MS;
    let mut running = false;

    loop {
        if running {
            thread::sleep(Duration::from_millis(interval_ms));
            if main.send(AppOp::Pump).is_err() {
                break;
            }
        }

        // Non-blocking while pumping, block-wait when stopped
        let op = if running {
            match ctl.try_recv() {
                Ok(op) => Some(op),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match ctl.recv() {
                Ok(op) => Some(op),
                Err(_) => break,
            }
        };

        match op {
            Some(PumpOp::Start(ms)) => {
                interval_ms = if ms == 0 { 100 } else { ms };
                running = true;
            }
            Some(PumpOp::Stop) => running = false,
            Some(PumpOp::Quit) => break,
            None => {}
        }
    }
}

fn input_thread(main: Sender<AppOp>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if main.send(AppOp::Input(line)).is_err() {
                    return;
                }
            }
            Err(e) => {
                log::error!("stdin: {}", e);
                break;
            }
        }
    }
    main.send(AppOp::Quit).ok();
}

fn run(args: Args) -> Result<(), AppError> {
    let storage = match args.config {
        Some(ref path) => TimerStorage::at_path(path.clone()),
        None => TimerStorage::new(),
    };
    let mut prefs = storage.load_preferences();

    if let Some(ms) = args.poll_ms {
        prefs.poll_ms = ms;
    }
    if args.no_sound {
        prefs.alerts.sound = false;
    }
    if args.no_vibrate {
        prefs.alerts.vibration = false;
    }
    if args.no_flash {
        prefs.alerts.title_flash = false;
    }
    let initial_ms = match &args.duration {
        Some(text) => parse_duration(text)?,
        None => prefs.last_duration_ms,
    };
    if args.save {
        storage.save_preferences(&prefs)?;
        log::info!("preferences saved");
    }

    let (tx, rx) = mpsc::channel();
    let (pump_tx, pump_rx) = mpsc::channel();

    let pump_main = tx.clone();
    let pump_handle = thread::Builder::new()
        .name("pump".into())
        .spawn(move || pump_thread(pump_rx, pump_main))
        .map_err(AppError::Spawn)?;
    let input_main = tx.clone();
    thread::Builder::new()
        .name("input".into())
        .spawn(move || input_thread(input_main))
        .map_err(AppError::Spawn)?;

    let mut countdown = CountdownState::new(
        DurationFields::from_ms(initial_ms),
        prefs.presets_min.clone(),
    );

    let alerts = Rc::new(RefCell::new(prefs.alerts.clone()));
    let consumer_alerts = alerts.clone();
    countdown.timer.on_finish(move |_| {
        fire_alert(&consumer_alerts.borrow(), &TerminalNotifier);
    });
    let finished_tx = tx.clone();
    countdown.timer.on_finish(move |event| {
        finished_tx.send(AppOp::Finished(*event)).ok();
    });

    let mut app = CountdownApp {
        countdown,
        screen: TerminalScreen::new(io::stdout()),
        storage,
        prefs,
        alerts,
        pump: pump_tx,
        pump_running: false,
        flash: None,
        help_visible: false,
    };

    tx.send(AppOp::Redraw).ok();
    drop(tx);

    while let Ok(op) = rx.recv() {
        match op {
            AppOp::Redraw => app.redraw(),
            AppOp::Input(line) => {
                if !app.handle_input(&line) {
                    break;
                }
            }
            AppOp::Pump => app.handle_pump(),
            AppOp::Finished(event) => app.handle_finished(event),
            AppOp::Quit => break,
        }
    }

    app.stop_pump();
    app.screen.restore_title();
    app.pump.send(PumpOp::Quit).ok();
    if pump_handle.join().is_err() {
        log::error!("pump thread panicked");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                message.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            log::error!("{}", message);
            ExitCode::FAILURE
        }
    }
}
