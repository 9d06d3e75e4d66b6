use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keydash::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    runtime::{CrosstermKeySource, SystemClock},
    sentences::SentenceBank,
    session::{run_session, SessionOutcome, TargetText},
    signing::SigningKey,
    store::ResultsStore,
    summary::SummaryEntry,
    ui::{HistoryWidget, ResultsWidget, TerminalView},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    widgets::Widget,
    Terminal,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// offline typing speed test with tamper-evident result history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An offline typing speed test. Every finished session is saved as an HMAC-signed record, and the cumulative summary is rebuilt from the records that still verify."
)]
pub struct Cli {
    /// custom prompt to type
    #[clap(short = 'p', long, conflicts_with = "sentence")]
    prompt: Option<String>,

    /// built-in sentence to type, numbered from 1 (see --list)
    #[clap(short = 's', long)]
    sentence: Option<usize>,

    /// print the built-in sentences and exit
    #[clap(long)]
    list: bool,

    /// show the history of verified sessions before typing
    #[clap(long)]
    history: bool,

    /// with --history, print the cumulative summary as JSON and exit
    #[clap(long, requires = "history")]
    json: bool,

    /// re-verify every record, rewrite the cumulative summary and exit
    #[clap(long)]
    rebuild: bool,

    /// directory holding session records and the cumulative summary
    #[clap(long)]
    stats_dir: Option<PathBuf>,

    /// tracing filter for the log file, e.g. `debug` or `keydash=trace`
    #[clap(long)]
    log_level: Option<String>,
}

impl Cli {
    fn target(&self, bank: &SentenceBank) -> Result<TargetText, Box<dyn Error>> {
        let target = match (&self.prompt, self.sentence) {
            (Some(prompt), _) => TargetText::new(prompt.as_str())?,
            (None, Some(number)) => bank.get(number)?,
            (None, None) => bank.random()?,
        };
        Ok(target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitType {
    Restart,
    New,
    History,
    Quit,
}

fn exit_type_for(key: KeyEvent) -> Option<ExitType> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Esc => Some(ExitType::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(ExitType::Quit),
        KeyCode::Char('r') => Some(ExitType::Restart),
        KeyCode::Char('n') => Some(ExitType::New),
        KeyCode::Char('h') => Some(ExitType::History),
        _ => None,
    }
}

fn init_logging(filter: &str) -> Result<(), Box<dyn Error>> {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let (filter, bad_filter) = match EnvFilter::try_new(filter) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new("info"), Some(err)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init()?;

    if let Some(err) = bad_filter {
        warn!(%err, "invalid log filter, using info");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = config_store.load();
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level))?;
    if !config_store.exists() {
        match config_store.save(&config) {
            Ok(()) => info!(path = %config_store.path().display(), "wrote default config"),
            Err(err) => warn!(%err, "could not write default config"),
        }
    }

    let bank = SentenceBank::builtin()?;
    if cli.list {
        for (idx, sentence) in bank.sentences().iter().enumerate() {
            println!("{:>2}. {sentence}", idx + 1);
        }
        return Ok(());
    }

    let key = SigningKey::load_or_create(&config.key_file())?;
    let stats_dir = cli.stats_dir.clone().unwrap_or_else(|| config.stats_dir());
    let store = ResultsStore::open(stats_dir, key)?;

    if cli.rebuild {
        let entries = store.rebuild_cumulative_summary()?;
        println!(
            "{} verified sessions written to {}",
            entries.len(),
            store.summary_path().display()
        );
        return Ok(());
    }

    if cli.json {
        let entries = store.rebuild_cumulative_summary()?;
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let target = match cli.target(&bank) {
        Ok(target) => target,
        Err(err) => Cli::command()
            .error(ErrorKind::InvalidValue, err.to_string())
            .exit(),
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut view = TerminalView::new(Terminal::new(backend)?);

    let outcome = start_tui(&mut view, &store, &bank, target, cli.history);

    disable_raw_mode()?;
    execute!(view.terminal_mut().backend_mut(), LeaveAlternateScreen)?;
    view.terminal_mut().show_cursor()?;

    if let Err(err) = &outcome {
        error!(%err, "exiting on error");
    }
    outcome
}

/// Draw `widget` and block until the user picks what happens next.
fn choose<B, W, F>(view: &mut TerminalView<B>, widget: F) -> io::Result<ExitType>
where
    B: Backend,
    W: Widget,
    F: Fn() -> W,
{
    view.draw(widget())?;
    loop {
        match event::read()? {
            Event::Key(key) => {
                if let Some(choice) = exit_type_for(key) {
                    return Ok(choice);
                }
            }
            Event::Resize(_, _) => view.draw(widget())?,
            _ => {}
        }
    }
}

fn show_history<B: Backend>(
    view: &mut TerminalView<B>,
    entries: &[SummaryEntry],
) -> io::Result<ExitType> {
    loop {
        match choose(view, || HistoryWidget::new(entries))? {
            ExitType::History => continue,
            other => return Ok(other),
        }
    }
}

fn start_tui<B: Backend>(
    view: &mut TerminalView<B>,
    store: &ResultsStore,
    bank: &SentenceBank,
    mut target: TargetText,
    history_first: bool,
) -> Result<(), Box<dyn Error>> {
    if history_first {
        let entries = store.rebuild_cumulative_summary()?;
        match show_history(view, &entries)? {
            ExitType::New => target = bank.random()?,
            ExitType::Quit => return Ok(()),
            ExitType::Restart | ExitType::History => {}
        }
    }

    let mut keys = CrosstermKeySource::new();

    loop {
        let clock = SystemClock::new();
        let result = match run_session(&target, &mut keys, view, &clock)? {
            SessionOutcome::Completed(result) => result,
            SessionOutcome::Cancelled => {
                info!("session cancelled");
                break;
            }
        };

        let saved = match store.record_session(&result) {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(%err, "failed to save session");
                None
            }
        };

        let mut choice = choose(view, || ResultsWidget::new(&result, saved.as_ref()))?;
        if choice == ExitType::History {
            let entries = store.load_cumulative_summary()?;
            choice = show_history(view, &entries)?;
        }

        match choice {
            ExitType::Restart => {}
            ExitType::New => target = bank.random()?,
            ExitType::History | ExitType::Quit => break,
        }
    }

    Ok(())
}
