//! Quickfire - timed flashcard challenge sessions
//!
//! CLI entry point.

use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use quickfire::cli::SessionOverrides;
use quickfire::config::{history_path, quickfire_home, Config};
use quickfire::core::{ChallengeEngine, SessionSelector, TickTimer};
use quickfire::error::exit_codes;
use quickfire::logging::init_tracing;
use quickfire::stats::HistoryLog;
use quickfire::storage::{BackgroundRecorder, FileCardStore};

// =============================================================================
// CLI Definition
// =============================================================================

/// Quickfire - timed flashcard challenge sessions
#[derive(Parser)]
#[command(name = "quickfire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a challenge session from a deck
    Play {
        /// Deck file (JSON array of cards)
        deck: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
        /// Print the summary as JSON (prompts go to stderr)
        #[arg(long, short)]
        json: bool,
        /// Do not write the session to the history log
        #[arg(long)]
        no_history: bool,
    },

    /// Show which cards a session would use
    Select {
        /// Deck file (JSON array of cards)
        deck: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// List the cards in a deck with their statistics
    Cards {
        /// Deck file (JSON array of cards)
        deck: PathBuf,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Show recent sessions
    History {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Maximum number of sessions
        #[arg(long, short, default_value_t = 10)]
        limit: usize,
    },

    /// Write a default project config
    Init {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Overwrite an existing config
        #[arg(long, short)]
        force: bool,
    },
}

/// Session flags shared by `play` and `select`.
#[derive(Args, Debug, Clone, Default)]
struct SessionArgs {
    /// Selection mode: random, low-accuracy, not-recent or explicit
    #[arg(long, short)]
    mode: Option<String>,
    /// Number of cards
    #[arg(long, short = 'n')]
    count: Option<usize>,
    /// Countdown in seconds (0 for untimed)
    #[arg(long, short)]
    time_limit: Option<u32>,
    /// Accuracy needed to pass (0 disables)
    #[arg(long)]
    target: Option<u32>,
    /// Card id for explicit selection (repeatable, played in order)
    #[arg(long = "card", value_name = "ID")]
    cards: Vec<String>,
    /// Seed for reproducible selection
    #[arg(long)]
    seed: Option<u64>,
}

impl From<&SessionArgs> for SessionOverrides {
    fn from(args: &SessionArgs) -> Self {
        Self {
            mode: args.mode.clone(),
            count: args.count,
            time_limit: args.time_limit,
            target: args.target,
            cards: args.cards.clone(),
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("quickfire error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Play {
            deck,
            session,
            json,
            no_history,
        } => run_play(&deck, &session, json, no_history, &cwd),
        Commands::Select {
            deck,
            session,
            json,
        } => run_select(&deck, &session, json, &cwd),
        Commands::Cards { deck, json } => run_cards(&deck, json),
        Commands::History { json, limit } => run_history(json, limit),
        Commands::Init { json, quiet, force } => run_init(json, quiet, force, &cwd),
    }
}

/// Convert success status to exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

fn run_play(
    deck: &Path,
    args: &SessionArgs,
    json: bool,
    no_history: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use quickfire::cli::play::{spawn_line_reader, PlayCommand, PlayEvent, PlayOptions};

    let config = Config::load_from_cwd(cwd);
    let session = SessionOverrides::from(args).apply(&config)?;

    let store = Arc::new(FileCardStore::new(deck));
    let recorder = Arc::new(BackgroundRecorder::spawn(store.clone())?);

    let mut builder = ChallengeEngine::builder(store, session.clone())
        .selector(SessionSelector::from_config(&config.selection))
        .sink(recorder.clone());
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let engine = builder.build()?;

    let history = if no_history {
        None
    } else {
        history_path().map(HistoryLog::new)
    };

    let (tx, rx) = mpsc::channel();
    spawn_line_reader(BufReader::new(io::stdin()), tx.clone())?;
    let timer = if session.is_timed() {
        Some(TickTimer::start(Duration::from_secs(1), tx, || {
            PlayEvent::Tick
        })?)
    } else {
        None
    };

    let mut cmd = PlayCommand::new(engine, history);
    let options = PlayOptions { json };
    let output = if options.transcript_to_stderr() {
        cmd.run(&rx, timer, &mut io::stderr())?
    } else {
        cmd.run(&rx, timer, &mut io::stdout())?
    };

    // Results still queued are written before exit.
    recorder.flush();

    if options.json {
        println!("{}", cmd.format_output(&output, &options));
    } else {
        println!("\n{}", cmd.format_output(&output, &options));
    }
    Ok(success_to_exit_code(output.success))
}

fn run_select(
    deck: &Path,
    args: &SessionArgs,
    json: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use quickfire::cli::select::{SelectCommand, SelectOptions};

    let config = Config::load_from_cwd(cwd);
    let session = SessionOverrides::from(args).apply(&config)?;

    let cmd = SelectCommand::new(
        FileCardStore::new(deck),
        SessionSelector::from_config(&config.selection),
    );
    let options = SelectOptions {
        json,
        seed: args.seed,
    };

    let output = cmd.run(&session, &options);
    println!("{}", cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_cards(deck: &Path, json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use quickfire::cli::cards::{CardsCommand, CardsOptions};

    let cmd = CardsCommand::new(FileCardStore::new(deck));
    let options = CardsOptions { json };

    let output = cmd.run(&options);
    println!("{}", cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_history(json: bool, limit: usize) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use quickfire::cli::history::{HistoryCommand, HistoryOptions};

    let path = history_path().ok_or("could not determine the quickfire home directory")?;
    let cmd = HistoryCommand::new(HistoryLog::new(path));
    let options = HistoryOptions { json, limit };

    let output = cmd.run(&options);
    println!("{}", cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_init(
    json: bool,
    quiet: bool,
    force: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use quickfire::cli::init::{InitCommand, InitOptions};

    let cmd = InitCommand::new(cwd, quickfire_home());
    let options = InitOptions { json, quiet, force };

    let output = cmd.run(&options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

// =============================================================================
// Tests
// =============================================================================
