mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use flowforge::{
    beats::BeatCatalog,
    clock::{PlaybackClock, WallClock},
    config::{Config, ConfigStore, FileConfigStore, PracticeSettings},
    history::{HistoryDb, HistoryStats, PracticeRecord},
    runtime::{AppEvent, FixedTicker, Runner, TerminalEvents},
    scheduler::PromptScheduler,
    session::{PracticeSession, PromptFrame, SessionDriver, SessionSummary},
    timing::{format_bpm, Bpm, Frequency},
    util::format_duration,
    word_generator::WordGenerator,
    words::{require_pool, CsvWordSource, Difficulty, EmbeddedWords, WordCandidate, WordSource},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};

const WORDS_PER_LEVEL: usize = 100;
const HISTORY_LIMIT: usize = 20;
const MIN_BPM: f64 = 40.0;
const MAX_BPM: f64 = 220.0;

/// freestyle rap practice over a beat with timed word prompts
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice freestyle over a beat: a new word appears on the downbeat every 4, 8 or 16 bars, picked at random from a difficulty-filtered word list."
)]
pub struct Cli {
    /// beat to practice over, by id or title
    #[clap(short = 'b', long)]
    beat: Option<String>,

    /// override the beat's tempo
    #[clap(long)]
    bpm: Option<f64>,

    /// bars between word prompts (4, 8 or 16)
    #[clap(short = 'f', long, value_parser = parse_frequency)]
    frequency: Option<Frequency>,

    /// word difficulty (1 = easy, 2 = medium, 3 = hard)
    #[clap(short = 'd', long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    /// end the session after this many seconds instead of at the end of the beat
    #[clap(short = 's', long)]
    duration: Option<u32>,

    /// CSV word list with columns text,syllables,difficulty,category
    #[clap(short = 'w', long)]
    words: Option<PathBuf>,

    /// use the built-in words and forget any saved word list
    #[clap(long, conflicts_with = "words")]
    builtin_words: bool,

    /// milliseconds a new word stays highlighted
    #[clap(long)]
    word_display_ms: Option<u64>,

    /// list the available beats and exit
    #[clap(long)]
    list_beats: bool,

    /// show recent practice sessions and exit
    #[clap(long)]
    history: bool,

    /// search practice history by beat title or prompted word and exit
    #[clap(long)]
    search: Option<String>,

    /// list practice sessions at this difficulty (1, 2 or 3) and exit
    #[clap(long, value_parser = parse_difficulty)]
    history_difficulty: Option<Difficulty>,

    /// list practice sessions over this beat id and exit
    #[clap(long)]
    history_beat: Option<String>,

    /// print the practice history as JSON and exit
    #[clap(long)]
    export_history: bool,

    /// delete one practice session by id and exit
    #[clap(long, value_name = "ID")]
    delete_history: Option<i64>,

    /// delete every practice session and exit
    #[clap(long)]
    clear_history: bool,

    /// keep only the newest sessions in the history and exit
    #[clap(long, value_name = "KEEP")]
    prune_history: Option<usize>,

    /// do not record this session in the practice history
    #[clap(long)]
    no_history: bool,
}

fn parse_frequency(s: &str) -> Result<Frequency, String> {
    let bars: u32 = s.parse().map_err(|e| format!("{e}"))?;
    Frequency::try_from(bars).map_err(|e| e.to_string())
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    let level: u8 = s.parse().map_err(|e| format!("{e}"))?;
    Difficulty::try_from(level).map_err(|e| e.to_string())
}

impl Cli {
    fn wants_history(&self) -> bool {
        self.history
            || self.search.is_some()
            || self.history_difficulty.is_some()
            || self.history_beat.is_some()
            || self.export_history
            || self.delete_history.is_some()
            || self.clear_history
            || self.prune_history.is_some()
    }

    fn is_filtered(&self) -> bool {
        self.search.is_some() || self.history_difficulty.is_some() || self.history_beat.is_some()
    }

    /// Merges flags over saved preferences. Flags win.
    fn resolve(&self, catalog: &BeatCatalog, cfg: &Config) -> flowforge::Result<PracticeSettings> {
        let beat = match &self.beat {
            Some(key) => catalog.find(key)?.clone(),
            None => cfg
                .last_beat_id
                .as_deref()
                .and_then(|id| catalog.find(id).ok())
                .or_else(|| catalog.first())
                .cloned()
                .ok_or_else(|| flowforge::Error::UnknownBeat(String::from("(catalog is empty)")))?,
        };
        let bpm = Bpm::new(self.bpm.unwrap_or(beat.bpm))?;

        Ok(PracticeSettings {
            bpm,
            frequency: self.frequency.unwrap_or(cfg.frequency),
            difficulty: self.difficulty.unwrap_or(cfg.difficulty),
            duration_secs: self
                .duration
                .or(beat.duration_secs)
                .map(|secs| secs as f64),
            word_display: Duration::from_millis(self.word_display_ms.unwrap_or(cfg.word_display_ms)),
            words_file: match (&self.words, self.builtin_words) {
                (Some(path), _) => Some(path.clone()),
                (None, true) => None,
                (None, false) => saved_words_file(cfg),
            },
            beat,
        })
    }
}

/// A saved word list that has since gone missing is dropped, so the next save forgets it.
fn saved_words_file(cfg: &Config) -> Option<PathBuf> {
    let path = cfg.words_file.clone()?;
    if path.exists() {
        return Some(path);
    }
    log::warn!(
        "saved word list {} not found, using the built-in words",
        path.display()
    );
    None
}

fn load_words(settings: &PracticeSettings) -> flowforge::Result<Vec<WordCandidate>> {
    let source: Box<dyn WordSource> = match &settings.words_file {
        Some(path) => Box::new(CsvWordSource::from_path(path)?),
        None => Box::new(EmbeddedWords::new()?),
    };
    require_pool(source.as_ref(), WORDS_PER_LEVEL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Practice,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
}

pub struct App<C: PlaybackClock> {
    pub settings: PracticeSettings,
    pub driver: SessionDriver<C>,
    pub state: AppState,
    pub frame: PromptFrame,
    pub summary: Option<SessionSummary>,
    history: Option<HistoryDb>,
}

impl<C: PlaybackClock> App<C> {
    pub fn new(settings: PracticeSettings, pool: Vec<WordCandidate>, clock: C) -> Self {
        let mut generator = WordGenerator::new(pool);
        generator.set_difficulty(settings.difficulty);
        let scheduler = PromptScheduler::new(settings.bpm, settings.frequency);
        let session =
            PracticeSession::new(scheduler, generator).with_word_display(settings.word_display);
        let driver = SessionDriver::new(clock, session).with_duration_limit(settings.duration_secs);
        let frame = driver.session().frame();

        Self {
            settings,
            driver,
            state: AppState::Practice,
            frame,
            summary: None,
            history: None,
        }
    }

    pub fn with_history(mut self, history: HistoryDb) -> Self {
        self.history = Some(history);
        self
    }

    pub fn on_tick(&mut self) {
        if let Some(frame) = self.driver.poll() {
            self.frame = frame;
        }
        if self.driver.is_finished() {
            self.finish();
        }
    }

    /// Stops playback, records the run and shows the summary.
    pub fn finish(&mut self) {
        let summary = self.driver.stop();
        if summary.duration_secs > 0.0 {
            if let Some(db) = &self.history {
                let record = PracticeRecord::from_summary(
                    &summary,
                    &self.settings.beat.id,
                    &self.settings.beat.title,
                    self.settings.bpm.get(),
                    self.settings.frequency,
                    self.settings.difficulty,
                );
                if let Err(e) = db.record(&record) {
                    log::warn!("could not record practice session: {e}");
                }
            }
        }
        self.frame = self.driver.session().frame();
        self.summary = Some(summary);
        self.state = AppState::Summary;
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
        self.driver.session_mut().set_difficulty(difficulty);
    }

    fn cycle_frequency(&mut self) {
        self.settings.frequency = self.settings.frequency.next();
        self.driver
            .session_mut()
            .set_frequency(self.settings.frequency);
    }

    fn nudge_bpm(&mut self, delta: f64) {
        let target = (self.settings.bpm.get() + delta).clamp(MIN_BPM, MAX_BPM);
        if let Ok(bpm) = Bpm::new(target) {
            self.settings.bpm = bpm;
            self.driver.session_mut().set_bpm(bpm);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            if self.state == AppState::Practice && self.frame.elapsed > 0.0 {
                self.finish();
            }
            return Action::Quit;
        }

        match self.state {
            AppState::Practice => match key.code {
                KeyCode::Char(' ') => self.driver.toggle(),
                KeyCode::Char('s') => self.finish(),
                KeyCode::Char('1') => self.set_difficulty(Difficulty::Easy),
                KeyCode::Char('2') => self.set_difficulty(Difficulty::Medium),
                KeyCode::Char('3') => self.set_difficulty(Difficulty::Hard),
                KeyCode::Char('f') => self.cycle_frequency(),
                KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_bpm(1.0),
                KeyCode::Char('-') => self.nudge_bpm(-1.0),
                _ => {}
            },
            AppState::Summary => match key.code {
                KeyCode::Char('r') | KeyCode::Char(' ') => {
                    self.summary = None;
                    self.state = AppState::Practice;
                }
                KeyCode::Char('q') => return Action::Quit,
                _ => {}
            },
        }
        Action::Continue
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let catalog = BeatCatalog::embedded()?;

    if cli.list_beats {
        print_beats(&catalog);
        return Ok(());
    }
    if cli.wants_history() {
        let db = HistoryDb::new()?;
        return run_history(&cli, &db, &mut io::stdout().lock());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let settings = cli.resolve(&catalog, &store.load())?;
    let pool = load_words(&settings)?;

    let mut app = App::new(settings, pool, WallClock::new());
    if !cli.no_history {
        match HistoryDb::new() {
            Ok(db) => app = app.with_history(db),
            Err(e) => log::warn!("practice history disabled: {e}"),
        }
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&Config::from(&app.settings)) {
        log::warn!("could not save preferences to {}: {e}", store.path().display());
    }

    result
}

fn start_tui<B: Backend, C: PlaybackClock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(TerminalEvents::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            AppEvent::Tick | AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.handle_key(key) == Action::Quit {
                    break;
                }
            }
        }
        app.on_tick();
    }

    Ok(())
}

fn ui<C: PlaybackClock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn print_beats(catalog: &BeatCatalog) {
    for beat in catalog.all() {
        println!(
            "{:<24} {:>8} {:<10} {}{}",
            beat.id,
            format_bpm(beat.bpm),
            beat.category().to_string(),
            beat.title,
            if beat.is_premium { " (premium)" } else { "" }
        );
    }
}

fn run_history<W: Write>(cli: &Cli, db: &HistoryDb, out: &mut W) -> Result<(), Box<dyn Error>> {
    if let Some(id) = cli.delete_history {
        if db.delete(id)? {
            writeln!(out, "deleted session {id}")?;
        } else {
            writeln!(out, "no session with id {id}")?;
        }
        return Ok(());
    }
    if cli.clear_history {
        db.clear_all()?;
        writeln!(out, "cleared practice history")?;
        return Ok(());
    }
    if let Some(keep) = cli.prune_history {
        let removed = db.prune(keep)?;
        writeln!(out, "removed {removed} sessions, kept the newest {keep}")?;
        return Ok(());
    }
    if cli.export_history {
        writeln!(out, "{}", db.export_json()?)?;
        return Ok(());
    }

    let mut records = match (&cli.search, &cli.history_beat, cli.history_difficulty) {
        (Some(query), _, _) => db.search(query)?,
        (None, Some(beat), _) => db.by_beat(beat)?,
        (None, None, Some(difficulty)) => db.by_difficulty(difficulty)?,
        (None, None, None) => db.recent(HISTORY_LIMIT)?,
    };
    if let Some(beat) = &cli.history_beat {
        records.retain(|r| &r.beat_id == beat);
    }
    if let Some(difficulty) = cli.history_difficulty {
        records.retain(|r| r.difficulty == difficulty);
    }

    let now = chrono::Local::now();
    for r in &records {
        writeln!(
            out,
            "{:>4}  {:<16} {:<24} {:>6} {:>3} prompts  {}",
            r.id.unwrap_or_default(),
            r.age(now),
            r.beat_title,
            format_duration(r.duration_secs),
            r.prompt_count,
            r.difficulty
        )?;
    }

    if !cli.is_filtered() {
        print_stats(&db.stats()?, out)?;
    }
    Ok(())
}

fn print_stats<W: Write>(stats: &HistoryStats, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} sessions, {} total, {} average, longest {}, {} prompts",
        stats.total_sessions,
        format_duration(stats.total_duration_secs),
        format_duration(stats.average_duration_secs),
        format_duration(stats.longest_secs),
        stats.total_prompts
    )?;
    let by_level = stats
        .by_difficulty
        .iter()
        .map(|(d, n)| format!("{d}: {n}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{by_level}")
}
