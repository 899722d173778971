pub mod ui;

use bellboard::{
    app_dirs::AppDirs,
    board::{Board, SaveError},
    config::{FileStateStore, StateStore},
    device::{BellDevice, DeviceError, HttpBellDevice},
    editor::Edit,
    runtime::{BoardEvent, BoardEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    schedule::{DayId, Lesson, ShiftId},
};
use chrono::{Local, NaiveDateTime};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

/// Minutes moved per keypress when nudging lesson times.
const TIME_STEP_MINUTES: i32 = 5;
const MAX_NAME_LEN: usize = 32;

/// school bell dashboard and schedule editor
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Terminal dashboard for a school's bell schedule: shows the current lesson or break, edits the weekly timetable and pushes ring times to the bell device."
)]
pub struct Cli {
    /// weekday to show instead of today (monday, tue, ...)
    #[clap(short, long)]
    day: Option<DayId>,

    /// shift to show (1 or 2)
    #[clap(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
    shift: Option<u8>,

    /// schedule file to load and save
    #[clap(long)]
    state_file: Option<PathBuf>,

    /// bell device address, e.g. 192.168.4.1
    #[clap(long)]
    device: Option<String>,

    /// print the current status and exit
    #[clap(long)]
    status: bool,

    /// send the selected day's bell times to the device and exit
    #[clap(long)]
    push: bool,

    /// set the device clock from this machine and exit
    #[clap(long)]
    sync_time: bool,

    /// ring the bell for SECS seconds (default 5) and exit
    #[clap(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "5")]
    test_bell: Option<u32>,

    /// read the device clock, compare its bell times with the selected day and exit
    #[clap(long)]
    check_device: bool,
}

impl Cli {
    fn shift_id(&self) -> Option<ShiftId> {
        self.shift.map(|n| match n {
            2 => ShiftId::Second,
            _ => ShiftId::First,
        })
    }

    fn is_one_shot(&self) -> bool {
        self.status || self.device_action()
    }

    fn device_action(&self) -> bool {
        self.push || self.sync_time || self.check_device || self.test_bell.is_some()
    }

    fn store(&self) -> FileStateStore {
        self.state_file
            .as_ref()
            .map(FileStateStore::with_path)
            .unwrap_or_default()
    }

    fn board(&self, store: &dyn StateStore, now: NaiveDateTime) -> Board {
        let mut board = Board::from_saved(store.load(), now.date());
        if let Some(day) = self.day {
            board.select_day(day);
        }
        if let Some(shift) = self.shift_id() {
            board.select_shift(shift);
        }
        if let Some(url) = &self.device {
            board.config.device_url = url.clone();
        }
        board
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Dashboard,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Name,
    Start,
    End,
}

impl InputField {
    pub fn prompt(self) -> &'static str {
        match self {
            InputField::Name => "Lesson name",
            InputField::Start => "Start (HH:MM)",
            InputField::End => "End (HH:MM)",
        }
    }
}

/// Text being typed into the selected lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub field: InputField,
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub board: Board,
    pub screen: AppScreen,
    /// Selected row in the editor.
    pub cursor: usize,
    pub input: Option<Input>,
    pub notice: Option<Notice>,
    pub now: NaiveDateTime,
    store: Box<dyn StateStore>,
    device: Box<dyn BellDevice>,
}

impl App {
    pub fn new(
        board: Board,
        store: Box<dyn StateStore>,
        device: Box<dyn BellDevice>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            board,
            screen: AppScreen::Dashboard,
            cursor: 0,
            input: None,
            notice: None,
            now,
            store,
            device,
        }
    }

    pub fn on_tick(&mut self, now: NaiveDateTime) {
        self.now = now;
        self.board.tick(now);
        self.clamp_cursor();
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        if self.input.is_some() {
            self.on_input_key(key);
            return Flow::Continue;
        }
        match self.screen {
            AppScreen::Dashboard => self.on_dashboard_key(key),
            AppScreen::Editor => {
                self.on_editor_key(key);
                Flow::Continue
            }
        }
    }

    pub fn selected_lesson(&self) -> Option<&Lesson> {
        self.board.lessons().get(self.cursor)
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Left => self.board.select_day(self.board.selected_day.prev()),
            KeyCode::Right => self.board.select_day(self.board.selected_day.next()),
            KeyCode::Char('t') => self.board.follow_today(self.now.date()),
            KeyCode::Tab => self.board.toggle_shift(),
            KeyCode::Enter | KeyCode::Char('e') => {
                // the day being edited must not move at midnight
                self.board.select_day(self.board.selected_day);
                self.screen = AppScreen::Editor;
                self.cursor = 0;
            }
            KeyCode::Char(c) => self.on_device_key(c),
            _ => {}
        }
        Flow::Continue
    }

    fn on_editor_key(&mut self, key: KeyEvent) {
        let shift = self.board.selected_shift;
        match key.code {
            KeyCode::Esc => self.screen = AppScreen::Dashboard,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                self.cursor += 1;
                self.clamp_cursor();
            }
            KeyCode::Left => {
                self.board.select_day(self.board.selected_day.prev());
                self.cursor = 0;
            }
            KeyCode::Right => {
                self.board.select_day(self.board.selected_day.next());
                self.cursor = 0;
            }
            KeyCode::Tab => {
                self.board.toggle_shift();
                self.cursor = 0;
            }
            KeyCode::Char('[') => self.nudge(InputField::Start, -TIME_STEP_MINUTES),
            KeyCode::Char(']') => self.nudge(InputField::Start, TIME_STEP_MINUTES),
            KeyCode::Char('-') => self.nudge(InputField::End, -TIME_STEP_MINUTES),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.nudge(InputField::End, TIME_STEP_MINUTES)
            }
            KeyCode::Char('n') => self.begin_input(InputField::Name),
            KeyCode::Char('S') => self.begin_input(InputField::Start),
            KeyCode::Char('E') => self.begin_input(InputField::End),
            KeyCode::Char('a') => {
                if self.commit(Edit::AddLesson { shift }) {
                    self.cursor = self.board.lessons().len().saturating_sub(1);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.commit(Edit::DeleteLesson { shift, id });
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    self.commit(Edit::ToggleLesson { shift, id });
                }
            }
            KeyCode::Char('o') => {
                self.commit(Edit::ToggleDay);
            }
            KeyCode::Char('s') => self.save(),
            KeyCode::Char(c) => self.on_device_key(c),
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Backspace => {
                input.buffer.pop();
            }
            KeyCode::Char(c) if input.buffer.chars().count() < MAX_NAME_LEN => {
                input.buffer.push(c)
            }
            KeyCode::Enter => {
                if let Some(Input { field, buffer }) = self.input.take() {
                    self.set_field(field, buffer);
                }
            }
            _ => {}
        }
    }

    fn on_device_key(&mut self, c: char) {
        match c {
            'p' => self.push(),
            'y' => self.sync_time(),
            'b' => self.test_bell(),
            'c' => self.check_device(),
            _ => {}
        }
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_lesson().map(|l| l.id.clone())
    }

    fn begin_input(&mut self, field: InputField) {
        let Some(lesson) = self.selected_lesson() else {
            return;
        };
        let buffer = match field {
            InputField::Name => lesson.name.clone(),
            InputField::Start => lesson.start_time.clone(),
            InputField::End => lesson.end_time.clone(),
        };
        self.input = Some(Input { field, buffer });
    }

    fn nudge(&mut self, field: InputField, minutes: i32) {
        let Some(lesson) = self.selected_lesson() else {
            return;
        };
        let current = match field {
            InputField::Start => lesson.start(),
            _ => lesson.end(),
        }
        .unwrap_or_else(|| self.board.selected_shift.default_anchor());
        self.set_field(field, current.add_minutes(minutes).to_string());
    }

    fn set_field(&mut self, field: InputField, value: String) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let shift = self.board.selected_shift;
        let edit = match field {
            InputField::Name => Edit::Rename {
                shift,
                id,
                name: value,
            },
            InputField::Start => Edit::SetStart {
                shift,
                id,
                time: value,
            },
            InputField::End => Edit::SetEnd {
                shift,
                id,
                time: value,
            },
        };
        self.commit(edit);
    }

    fn commit(&mut self, edit: Edit) -> bool {
        match self.board.commit(self.board.selected_day, edit) {
            Ok(()) => {
                self.notice = None;
                self.clamp_cursor();
                true
            }
            Err(err) => {
                self.notice = Some(Notice::error(err.to_string()));
                false
            }
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self
            .cursor
            .min(self.board.lessons().len().saturating_sub(1));
    }

    fn save(&mut self) {
        self.notice = Some(match self.board.save(self.store.as_ref()) {
            Ok(()) => Notice::info("Schedule saved"),
            Err(err) => Notice::error(err.to_string()),
        });
    }

    fn push(&mut self) {
        if !self.board.can_save() {
            self.notice = Some(Notice::error(SaveError::InvalidTimes.to_string()));
            return;
        }
        let day = self.board.selected_day;
        let result = self.device.save_config(&self.board.bell_config(day));
        self.report(result, format!("Sent {day} bell times to the device"));
    }

    fn sync_time(&mut self) {
        let result = self.device.sync_time(Local::now().fixed_offset());
        self.report(result, "Device clock synchronized".to_string());
    }

    fn test_bell(&mut self) {
        let secs = self.board.config.bell_duration_sec;
        let result = self.device.test_bell(secs);
        self.report(result, format!("Bell rang for {secs}s"));
    }

    fn check_device(&mut self) {
        self.notice = Some(match device_summary(self.device.as_ref(), &self.board) {
            Ok(summary) => Notice::info(summary),
            Err(err) => self.device_error(err),
        });
    }

    fn report(&mut self, result: Result<(), DeviceError>, done: String) {
        self.notice = Some(match result {
            Ok(()) => Notice::info(done),
            Err(err) => self.device_error(err),
        });
    }

    fn device_error(&self, err: DeviceError) -> Notice {
        if err.is_unreachable() {
            Notice::error(format!(
                "Bell device not reachable at {}",
                self.board.config.device_url
            ))
        } else {
            Notice::error(err.to_string())
        }
    }
}

fn init_logging() -> io::Result<()> {
    let Some(path) = AppDirs::log_path() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn status_line(board: &Board, now: NaiveDateTime) -> String {
    format!(
        "{}, {}: {}",
        board.selected_day,
        board.selected_shift,
        board.status(now).text
    )
}

/// Reads the device clock, then compares the bell times stored on the device
/// with the selected day.
fn device_summary(device: &dyn BellDevice, board: &Board) -> Result<String, DeviceError> {
    let time = device.time()?;
    let stored = device.config()?;
    let day = board.selected_day;
    tracing::info!(clock = %time.local, "device reachable");
    let verdict = if stored == board.bell_config(day) {
        "match"
    } else {
        "differ from"
    };
    Ok(format!(
        "connected, device clock {}; bell times {verdict} {day}",
        time.local
    ))
}

fn run_one_shot(cli: &Cli, board: &Board, now: NaiveDateTime) -> Result<(), Box<dyn Error>> {
    if cli.status {
        println!("{}", status_line(board, now));
    }
    if !cli.device_action() {
        return Ok(());
    }

    let device = HttpBellDevice::new(&board.config.device_url)?;
    if cli.push {
        if !board.can_save() {
            return Err(SaveError::InvalidTimes.into());
        }
        device.save_config(&board.bell_config(board.selected_day))?;
        println!(
            "sent {} bell times to {}",
            board.selected_day,
            device.base_url()
        );
    }
    if cli.check_device {
        println!("{}", device_summary(&device, board)?);
    }
    if cli.sync_time {
        device.sync_time(Local::now().fixed_offset())?;
        println!("device clock synchronized");
    }
    if let Some(secs) = cli.test_bell {
        device.test_bell(secs)?;
        println!("bell rang for {secs}s");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(err) = init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let store = cli.store();
    let now = Local::now().naive_local();
    let board = cli.board(&store, now);

    if cli.is_one_shot() {
        return run_one_shot(&cli, &board, now);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let device = HttpBellDevice::new(&board.config.device_url)?;
    tracing::info!(device = device.base_url(), "starting dashboard");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(board, Box::new(store), Box::new(device), now);
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: BoardEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            BoardEvent::Tick => app.on_tick(Local::now().naive_local()),
            BoardEvent::Resize => {}
            BoardEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    return Ok(());
                }
            }
        }
    }
}
