pub mod ui;

use std::{
    collections::VecDeque,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc::Receiver,
    time::Duration,
};

use anyhow::{bail, Context};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEventKind, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};

use dotboard::{
    app_dirs::AppDirs,
    calibration::Calibrator,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    feed::{FingertipSource, ReplayFeed},
    game::DotGame,
    geometry::{GameArea, Point},
    history::HistoryDb,
    input::{CameraSource, InputMode, InputNormalizer, InputSource, MouseSource, RescaleArea},
    layout::TargetLayout,
    levels::{self, GameMode, Level},
    notify::{DeviceChannel, DeviceInbox, DeviceReport, DeviceSink, BOARD_DEVICE, KNEE_DEVICE},
    runtime::{BoardEvent, CrosstermEventSource, FixedTicker, Runner},
    session::{EndReason, SessionConfig},
    summary::{Feedback, SessionSummary},
    trajectory::{AngleLog, TrajectoryLog},
};

const FPS: u32 = 30;
const DEFAULT_RANDOM_TARGETS: usize = 12;
/// Screen-space window shown on the terminal board.
const VIEWPORT_SIDE: f64 = 700.0;
const DEVICE_LOG_LINES: usize = 3;

/// rehabilitation dot-touching game for a projected board
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Light up dots on a board one at a time and touch them in order, with the mouse or a camera-tracked fingertip. Sessions end on a win, a timeout or an early exit and are logged for progress tracking."
)]
pub struct Cli {
    /// config file to use instead of the per-user one
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// play a session (the default)
    Play(PlayArgs),
    /// compute the camera-to-screen mapping from the 4 clicked corners
    Calibrate {
        /// camera pixel of a board corner as X,Y; give it 4 times, clockwise from top-left
        #[clap(long = "corner", value_parser = parse_point)]
        corners: Vec<Point>,

        /// forget the stored calibration
        #[clap(long, conflicts_with = "corners")]
        clear: bool,
    },
    /// list recently played sessions
    History {
        /// number of sessions to show
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// list the game modes, levels and their dot orders
    Levels,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    /// game mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<GameMode>,

    /// level within the game mode
    #[clap(short = 'l', long, value_enum)]
    level: Option<Level>,

    /// where touches come from
    #[clap(short = 'i', long, value_enum)]
    input: Option<InputMode>,

    /// CSV of camera-space fingertip samples (columns x,y) replayed one per tick
    #[clap(long)]
    feed: Option<PathBuf>,

    /// light up random dots instead of the level's order
    #[clap(long)]
    random: bool,

    /// dots to touch in random play
    #[clap(long, requires = "random")]
    targets: Option<usize>,

    /// session time limit in seconds
    #[clap(long)]
    max_secs: Option<u64>,

    /// seed for random play
    #[clap(long)]
    seed: Option<u64>,

    /// squeeze fingertip positions into the dot area, or into the projected board frame
    #[clap(long, value_enum, num_args = 0..=1, default_missing_value = "dots")]
    rescale: Option<RescaleArea>,

    /// remember mode, level and input as the defaults
    #[clap(long)]
    save: bool,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {s:?}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(Point::new(x, y))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Results,
}

pub struct App {
    pub mode: GameMode,
    pub level: Level,
    pub random: bool,
    pub session_config: SessionConfig,
    pub game: DotGame<DeviceSink, SystemClock>,
    pub input: InputSource,
    /// The feed as loaded. Every session replays a fresh copy.
    pub recorded_feed: Option<ReplayFeed>,
    pub feed: Option<ReplayFeed>,
    pub viewport: GameArea,
    pub cursor: Option<Point>,
    pub trajectory: TrajectoryLog,
    pub angles: AngleLog,
    pub devices: Vec<(&'static str, Receiver<String>)>,
    pub inbox: DeviceInbox,
    pub device_log: VecDeque<String>,
    pub state: AppState,
    pub history: Option<HistoryDb>,
    pub log_dir: Option<PathBuf>,
    pub last_summary: Option<SessionSummary>,
    pub best_duration: Option<f64>,
    /// Whether `last_summary` has been written out.
    pub saved: bool,
}

impl App {
    pub fn new(config: &Config, args: &PlayArgs) -> anyhow::Result<Self> {
        let screen = config.screen();
        let mode = args.mode.unwrap_or(config.game_mode);
        let level = args.level.unwrap_or(config.level);
        let input_mode = args.input.unwrap_or(config.input_mode);
        let max_duration = args
            .max_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.max_duration());

        let session_config = if args.random {
            levels::random_config(args.targets.unwrap_or(DEFAULT_RANDOM_TARGETS), max_duration)
        } else {
            levels::session_config(mode, level, max_duration)
        };

        let mut channel = DeviceChannel::with_default_devices();
        let devices = vec![
            (BOARD_DEVICE, channel.register(BOARD_DEVICE)),
            (KNEE_DEVICE, channel.register(KNEE_DEVICE)),
        ];
        let mut game = DotGame::with_parts(
            TargetLayout::standard_grid(screen),
            DeviceSink::new(channel),
            SystemClock,
        );
        if let Some(seed) = args.seed {
            game = game.with_seed(seed);
        }

        let input = match input_mode {
            InputMode::Mouse => InputSource::Mouse(MouseSource),
            InputMode::Finger => {
                let transform = config.calibration.map(|c| c.transform);
                if transform.is_none() {
                    warn!("no calibration stored, fingertip pixels are used as screen pixels");
                }
                let mut camera = CameraSource::new(transform, screen);
                if let Some(area) = args.rescale {
                    camera = camera.with_game_area(area.area(screen));
                }
                InputSource::Camera(camera)
            }
        };

        let feed = match (&args.feed, input_mode) {
            (Some(path), InputMode::Finger) => Some(
                ReplayFeed::from_path(path)
                    .with_context(|| format!("reading fingertip feed {}", path.display()))?,
            ),
            (Some(_), InputMode::Mouse) => {
                warn!("fingertip feed ignored in mouse mode");
                None
            }
            (None, InputMode::Finger) => {
                warn!("no fingertip feed, finger input stays idle");
                None
            }
            (None, InputMode::Mouse) => None,
        };

        let trajectory = TrajectoryLog::new(game.now());
        let angles = AngleLog::new(game.now());
        Ok(Self {
            mode,
            level,
            random: args.random,
            session_config,
            game,
            input,
            recorded_feed: feed.clone(),
            feed,
            viewport: GameArea::centered(screen, VIEWPORT_SIDE, VIEWPORT_SIDE),
            cursor: None,
            trajectory,
            angles,
            devices,
            inbox: DeviceInbox::new(),
            device_log: VecDeque::new(),
            state: AppState::Playing,
            history: None,
            log_dir: None,
            last_summary: None,
            best_duration: None,
            saved: true,
        })
    }

    pub fn with_history(mut self, history: Option<HistoryDb>) -> Self {
        self.history = history;
        self
    }

    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn mode_label(&self) -> String {
        if self.random {
            "Random".to_string()
        } else {
            self.mode.to_string()
        }
    }

    pub fn level_label(&self) -> String {
        if self.random {
            format!("{} dots", self.session_config.targets_to_win)
        } else {
            self.level.to_string()
        }
    }

    pub fn start_session(&mut self) -> anyhow::Result<()> {
        self.save_session();
        self.game.start(self.session_config.clone())?;
        self.trajectory = TrajectoryLog::new(self.game.now());
        self.angles = AngleLog::new(self.game.now());
        self.feed = self.recorded_feed.clone();
        self.cursor = None;
        self.last_summary = None;
        self.state = AppState::Playing;
        self.drain_devices();
        info!(
            "started {} / {} with {:?} input",
            self.mode_label(),
            self.level_label(),
            self.input.mode()
        );
        Ok(())
    }

    pub fn on_tick(&mut self) {
        if self.state != AppState::Playing {
            return;
        }
        let sample = match (&self.input, self.feed.as_mut()) {
            (InputSource::Camera(_), Some(feed)) => feed.next_fingertip(),
            _ => None,
        };
        let point = self.input.normalize(sample);
        if let Some(p) = point {
            self.track(p);
        }
        self.game.process(point);
        self.settle();
    }

    /// Mouse events on `board`, the terminal cells the dots are drawn in.
    pub fn on_mouse(&mut self, board: Rect, mouse: MouseEvent) {
        if self.state != AppState::Playing || self.input.mode() != InputMode::Mouse {
            return;
        }
        let Some(p) = ui::cell_to_screen(board, self.viewport, mouse.column, mouse.row) else {
            return;
        };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.track(p);
                let point = self.input.normalize(Some(p));
                self.game.process(point);
                self.settle();
            }
            MouseEventKind::Moved | MouseEventKind::Drag(_) => self.track(p),
            _ => {}
        }
    }

    pub fn abort(&mut self) {
        if self.game.abort() {
            self.settle();
        }
    }

    fn track(&mut self, p: Point) {
        self.cursor = Some(p);
        self.trajectory.record(self.game.now(), p);
    }

    fn drain_devices(&mut self) {
        for (device, rx) in &self.devices {
            while let Ok(msg) = rx.try_recv() {
                self.device_log.push_back(format!("{device} <- {msg}"));
            }
        }
        for (device, report) in self.inbox.drain() {
            match report {
                DeviceReport::Angle(angle) => {
                    if device == KNEE_DEVICE && self.state == AppState::Playing {
                        self.angles.record(self.game.now(), angle);
                    }
                    self.device_log
                        .push_back(format!("{device} -> angle {angle:.1}"));
                }
            }
        }
        while self.device_log.len() > DEVICE_LOG_LINES {
            self.device_log.pop_front();
        }
    }

    fn settle(&mut self) {
        self.drain_devices();
        if self.state == AppState::Playing && self.game.has_finished() {
            self.conclude_session();
            self.state = AppState::Results;
        }
    }

    /// Holds the finished session on the results screen until it is rated
    /// and saved.
    fn conclude_session(&mut self) {
        let Some(summary) = self.game.take_summary() else {
            return;
        };
        info!(
            "session ended: {} with {} hits in {:.2}s",
            summary.end_reason, summary.hits, summary.duration_seconds
        );

        if let (Some(db), false) = (&self.history, self.random) {
            let stored = db
                .best_duration(self.mode, self.level)
                .unwrap_or_else(|e| {
                    warn!("could not read best time: {}", e);
                    None
                });
            let this_run =
                (summary.end_reason == EndReason::Win).then_some(summary.duration_seconds);
            self.best_duration = match (stored, this_run) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }

        self.last_summary = Some(summary);
        self.saved = false;
    }

    /// How the player felt about the session on the results screen. Only
    /// counts before the session is saved.
    pub fn rate(&mut self, feedback: Feedback) {
        if self.state != AppState::Results || self.saved {
            return;
        }
        if let Some(summary) = self.last_summary.as_mut() {
            summary.feedback = Some(feedback);
        }
    }

    /// Writes the finished session to the log dir and the history once.
    pub fn save_session(&mut self) {
        if self.saved {
            return;
        }
        self.saved = true;
        let Some(summary) = &self.last_summary else {
            return;
        };

        if let Some(dir) = &self.log_dir {
            match summary.write_json(dir) {
                Ok(path) => info!("summary saved to {}", path.display()),
                Err(e) => warn!("could not write session summary: {}", e),
            }
            let stamp = summary.stamp();
            if !self.trajectory.is_empty() {
                let path = dir.join(format!("trajectory_{stamp}.csv"));
                match self.trajectory.write_csv(&path) {
                    Ok(()) => info!("trajectory saved to {}", path.display()),
                    Err(e) => warn!("could not write trajectory: {}", e),
                }
            }
            if !self.angles.is_empty() {
                let path = dir.join(format!("angles_{stamp}.csv"));
                match self.angles.write_csv(&path) {
                    Ok(()) => info!("knee angles saved to {}", path.display()),
                    Err(e) => warn!("could not write knee angles: {}", e),
                }
            }
        }

        if let Some(db) = &self.history {
            if let Err(e) = db.record(summary, self.mode, self.level, self.input.mode()) {
                warn!("could not record session history: {}", e);
            }
        }
    }
}

/// Returns false when a logger was already installed.
fn init_logging(to_file: bool) -> bool {
    let default_level = if to_file { "info" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if to_file {
        // the alternate screen owns the terminal while playing
        let file = AppDirs::log_file_path().and_then(|path| {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).ok()?;
            }
            OpenOptions::new().create(true).append(true).open(path).ok()
        });
        match file {
            Some(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    match builder.try_init() {
        Ok(()) => true,
        Err(e) => {
            eprintln!("logging disabled: {e}");
            false
        }
    }
}

fn open_history() -> Option<HistoryDb> {
    let path = AppDirs::history_db_path()?;
    match HistoryDb::open(&path) {
        Ok(db) => Some(db),
        Err(e) => {
            warn!("history unavailable at {}: {}", path.display(), e);
            None
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };

    match cli.command {
        None => play(&store, PlayArgs::default()),
        Some(Command::Play(args)) => play(&store, args),
        Some(Command::Calibrate { corners, clear }) => calibrate(&store, &corners, clear),
        Some(Command::History { limit }) => show_history(limit),
        Some(Command::Levels) => {
            show_levels();
            Ok(())
        }
    }
}

fn play(store: &FileConfigStore, args: PlayArgs) -> anyhow::Result<()> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }
    init_logging(true);

    let mut config = store.load();
    if args.save {
        config.game_mode = args.mode.unwrap_or(config.game_mode);
        config.level = args.level.unwrap_or(config.level);
        config.input_mode = args.input.unwrap_or(config.input_mode);
        store
            .save(&config)
            .with_context(|| format!("saving {}", store.path().display()))?;
    }

    let mut app = App::new(&config, &args)?
        .with_history(open_history())
        .with_log_dir(AppDirs::session_log_dir());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::from_fps(FPS));
    app.start_session()?;

    loop {
        terminal.draw(|f| ui::screen::current_screen(&app.state).render(&*app, f))?;

        match runner.step() {
            BoardEvent::Tick => app.on_tick(),
            BoardEvent::Resize => {}
            BoardEvent::Mouse(mouse) => {
                let size = terminal.size()?;
                let board = ui::board_inner(Rect::new(0, 0, size.width, size.height));
                app.on_mouse(board, mouse);
            }
            BoardEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    app.abort();
                    app.save_session();
                    break;
                }
                match (app.state, key.code) {
                    (AppState::Playing, KeyCode::Esc) => app.abort(),
                    (AppState::Results, KeyCode::Esc | KeyCode::Char('q')) => {
                        app.save_session();
                        break;
                    }
                    (AppState::Results, KeyCode::Char('r')) => app.start_session()?,
                    (AppState::Results, KeyCode::Char(c)) => {
                        if let Some(feedback) = feedback_key(c) {
                            app.rate(feedback);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

/// Results-screen keys 1, 2 and 3 in the order of `Feedback::ALL`.
fn feedback_key(c: char) -> Option<Feedback> {
    let index = c.to_digit(10)?.checked_sub(1)?;
    Feedback::ALL.get(index as usize).copied()
}

fn calibrate(store: &FileConfigStore, corners: &[Point], clear: bool) -> anyhow::Result<()> {
    init_logging(false);
    let mut config = store.load();

    if clear {
        config.calibration = None;
        store
            .save(&config)
            .with_context(|| format!("saving {}", store.path().display()))?;
        println!("calibration cleared");
        return Ok(());
    }

    let mut calibrator = Calibrator::with_calibration(config.screen(), config.calibration);
    let calibration = match calibrator.calibrate(corners) {
        Ok(c) => c,
        Err(e) => {
            let kept = if config.calibration.is_some() {
                "previous calibration kept"
            } else {
                "still uncalibrated"
            };
            bail!("calibration refused: {e} ({kept})");
        }
    };

    config.calibration = Some(calibration);
    store
        .save(&config)
        .with_context(|| format!("saving {}", store.path().display()))?;

    println!("calibration saved to {}", store.path().display());
    for row in calibration.transform.matrix() {
        println!("  {}", row.iter().map(|v| format!("{v:>12.6}")).join(" "));
    }
    Ok(())
}

fn show_history(limit: usize) -> anyhow::Result<()> {
    init_logging(false);
    let Some(path) = AppDirs::history_db_path() else {
        bail!("no state directory for the history database");
    };
    let db = HistoryDb::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let entries = db.recent(limit)?;
    if entries.is_empty() {
        println!("no sessions played yet");
        return Ok(());
    }
    for e in entries {
        println!(
            "{}  {:<16} {:<8} {:<7} {:<12} {:>3} dots {:>8.2}s",
            e.played_at.format("%Y-%m-%d %H:%M"),
            e.game_mode,
            e.level,
            e.input_mode,
            e.end_reason,
            e.hits,
            e.duration_seconds
        );
    }
    Ok(())
}

fn show_levels() {
    for mode in GameMode::ALL {
        println!("{mode}");
        for level in Level::ALL {
            let order = levels::visit_order(mode, level);
            println!(
                "  {} ({} dots): {}",
                level,
                order.len(),
                order.iter().join(" ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn board() -> Rect {
        Rect::new(1, 2, 98, 40)
    }

    fn click_at_target(app: &mut App) {
        let target = *app.game.active_target().unwrap();
        // aim for the cell whose center is nearest the target center
        let v = app.viewport;
        let b = board();
        let col = ((target.center.x - v.origin.x) / v.width * f64::from(b.width)).floor() as u16;
        let row = ((target.center.y - v.origin.y) / v.height * f64::from(b.height)).floor() as u16;
        app.on_mouse(
            b,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: b.x + col,
                row: b.y + row,
                modifiers: KeyModifiers::NONE,
            },
        );
    }

    #[test]
    fn parses_corner_points() {
        assert_eq!(parse_point("10,20.5").unwrap(), Point::new(10.0, 20.5));
        assert_eq!(parse_point(" 3 , 4 ").unwrap(), Point::new(3.0, 4.0));
        assert!(parse_point("10").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn clicking_every_dot_wins_and_logs() {
        let dir = tempdir().unwrap();
        let args = PlayArgs {
            mode: Some(GameMode::CircleTheDots),
            level: Some(Level::One),
            input: Some(InputMode::Mouse),
            ..PlayArgs::default()
        };
        let mut app = App::new(&Config::default(), &args)
            .unwrap()
            .with_history(Some(HistoryDb::open_in_memory().unwrap()))
            .with_log_dir(Some(dir.path().to_path_buf()));
        app.start_session().unwrap();
        assert_eq!(app.game.current_target(), Some(7));

        for _ in 0..5 {
            assert_eq!(app.state, AppState::Playing);
            click_at_target(&mut app);
        }

        assert_eq!(app.state, AppState::Results);
        let summary = app.last_summary.clone().unwrap();
        assert_eq!(summary.end_reason, EndReason::Win);
        assert_eq!(summary.hits, 5);
        assert!(app.best_duration.is_some());
        assert!(app.device_log.iter().any(|l| l.starts_with(BOARD_DEVICE)));

        // nothing is written until the player has had a chance to rate
        assert!(!dir.path().join(summary.file_name()).exists());
        app.rate(Feedback::Happy);
        app.save_session();
        app.rate(Feedback::Sad);

        let json = fs::read_to_string(dir.path().join(summary.file_name())).unwrap();
        let written: SessionSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(written.feedback, Some(Feedback::Happy));
        let stamp = summary.stamp();
        assert!(dir.path().join(format!("trajectory_{stamp}.csv")).exists());
        let recent = app.history.as_ref().unwrap().recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].feedback.as_deref(), Some("happy"));

        // saving again or restarting does not log the session twice
        app.save_session();
        app.start_session().unwrap();
        assert_eq!(app.history.as_ref().unwrap().recent(10).unwrap().len(), 1);
    }

    #[test]
    fn retry_saves_the_unrated_session() {
        let db = HistoryDb::open_in_memory().unwrap();
        let mut app = App::new(&Config::default(), &PlayArgs::default())
            .unwrap()
            .with_history(Some(db));
        app.start_session().unwrap();
        app.abort();
        app.start_session().unwrap();

        let recent = app.history.as_ref().unwrap().recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].end_reason, "early_abort");
        assert_eq!(recent[0].feedback, None);
    }

    #[test]
    fn second_logger_install_is_reported() {
        init_logging(false);
        assert!(!init_logging(false));
    }

    #[test]
    fn number_keys_pick_a_rating() {
        assert_eq!(feedback_key('1'), Some(Feedback::Happy));
        assert_eq!(feedback_key('2'), Some(Feedback::Medium));
        assert_eq!(feedback_key('3'), Some(Feedback::Sad));
        assert_eq!(feedback_key('0'), None);
        assert_eq!(feedback_key('4'), None);
        assert_eq!(feedback_key('r'), None);
    }

    #[test]
    fn knee_angles_are_logged_beside_the_trajectory() {
        let dir = tempdir().unwrap();
        let mut app = App::new(&Config::default(), &PlayArgs::default())
            .unwrap()
            .with_log_dir(Some(dir.path().to_path_buf()));
        let knee = app.inbox.uplink(KNEE_DEVICE);
        app.start_session().unwrap();

        assert!(knee.send(r#"{"field":"angle","value":42.5}"#));
        assert!(knee.send("not json"));
        app.on_tick();
        assert_eq!(app.angles.samples().len(), 1);
        assert_eq!(app.angles.samples()[0].angle, 42.5);
        assert!(app.device_log.iter().any(|l| l == "KneeESP -> angle 42.5"));

        app.abort();
        assert!(knee.send(r#"{"field":"angle","value":10.0}"#));
        app.on_tick();
        assert_eq!(app.angles.samples().len(), 1);

        app.save_session();
        let stamp = app.last_summary.as_ref().unwrap().stamp();
        let mut reader = csv::Reader::from_path(dir.path().join(format!("angles_{stamp}.csv"))).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["t", "angle"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "42.5");
    }

    #[test]
    fn clicks_off_target_do_nothing() {
        let mut app = App::new(&Config::default(), &PlayArgs::default()).unwrap();
        app.start_session().unwrap();
        app.on_mouse(
            board(),
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 1,
                row: 2,
                modifiers: KeyModifiers::NONE,
            },
        );
        assert_eq!(app.game.state().hits, 0);
        assert!(app.cursor.is_some());
        assert_eq!(app.state, AppState::Playing);
    }

    #[test]
    fn escape_ends_session_early() {
        let mut app = App::new(&Config::default(), &PlayArgs::default()).unwrap();
        app.start_session().unwrap();
        app.abort();
        assert_eq!(app.state, AppState::Results);
        assert_eq!(
            app.last_summary.as_ref().map(|s| s.end_reason),
            Some(EndReason::EarlyAbort)
        );

        // restart from results
        app.start_session().unwrap();
        assert_eq!(app.state, AppState::Playing);
        assert!(app.last_summary.is_none());
    }

    #[test]
    fn replayed_fingertips_drive_finger_mode() {
        let dir = tempdir().unwrap();
        let layout = TargetLayout::standard_grid(Config::default().screen());
        let centers: Vec<Point> = levels::visit_order(GameMode::CircleTheDots, Level::One)
            .into_iter()
            .map(|id| layout.get(id).unwrap().center)
            .collect();
        let feed_path = dir.path().join("feed.csv");
        let mut csv = String::from("x,y\n,\n");
        for c in &centers {
            csv.push_str(&format!("{},{}\n", c.x, c.y));
        }
        fs::write(&feed_path, csv).unwrap();

        let mut app = App::new(
            &Config::default(),
            &PlayArgs {
                input: Some(InputMode::Finger),
                mode: Some(GameMode::CircleTheDots),
                level: Some(Level::One),
                feed: Some(feed_path),
                ..PlayArgs::default()
            },
        )
        .unwrap();

        app.start_session().unwrap();
        for _ in 0..centers.len() + 1 {
            app.on_tick();
        }
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.game.state().hits, centers.len());
        assert!(app.feed.as_ref().unwrap().is_exhausted());

        // a retry replays the recording from the top
        app.start_session().unwrap();
        assert_eq!(app.feed.as_ref().unwrap().remaining(), centers.len() + 1);
        for _ in 0..centers.len() + 1 {
            app.on_tick();
        }
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.game.state().end_reason, Some(EndReason::Win));
    }

    #[test]
    fn rescale_flag_defaults_to_the_dot_area() {
        let cli = Cli::try_parse_from(["dotboard", "play", "--rescale"]).unwrap();
        assert_matches::assert_matches!(
            cli.command,
            Some(Command::Play(PlayArgs { rescale: Some(RescaleArea::Dots), .. }))
        );
        let cli = Cli::try_parse_from(["dotboard", "play", "--rescale", "board"]).unwrap();
        assert_matches::assert_matches!(
            cli.command,
            Some(Command::Play(PlayArgs { rescale: Some(RescaleArea::Board), .. }))
        );
        let cli = Cli::try_parse_from(["dotboard", "play"]).unwrap();
        assert_matches::assert_matches!(
            cli.command,
            Some(Command::Play(PlayArgs { rescale: None, .. }))
        );
    }

    #[test]
    fn mouse_is_ignored_in_finger_mode() {
        let mut app = App::new(
            &Config::default(),
            &PlayArgs {
                input: Some(InputMode::Finger),
                ..PlayArgs::default()
            },
        )
        .unwrap();
        app.start_session().unwrap();
        click_at_target(&mut app);
        assert_eq!(app.game.state().hits, 0);
        assert!(app.cursor.is_none());
    }
}
