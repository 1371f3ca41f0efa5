use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use rish::config::{self, Config};
use rish::editor::EditorSource;
use rish::eval::Calculator;
use rish::repl::{Exit, ReaderSource, ReplLoop};
use rish::signal;

#[derive(Parser)]
#[command(author, version, about = "A line-oriented shell that waits for complete statements")]
struct Cli {
    /// Line that ends the session
    #[arg(long, value_name = "WORD")]
    exit_command: Option<String>,

    /// Prompt for a new statement
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Prompt while a statement is still open
    #[arg(long, value_name = "TEXT")]
    continuation_prompt: Option<String>,

    /// Do not read or write ~/.rish_history
    #[arg(long)]
    no_history: bool,

    /// Do not evaluate ~/.rishrc at startup
    #[arg(long)]
    no_rc: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            prompt: self.prompt.clone().unwrap_or(defaults.prompt),
            continuation_prompt: self
                .continuation_prompt
                .clone()
                .unwrap_or(defaults.continuation_prompt),
            exit_command: self.exit_command.clone().unwrap_or(defaults.exit_command),
            farewell: defaults.farewell,
            history: !self.no_history,
        }
    }
}

/// Log to stderr, filtered by `RISH_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RISH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Evaluate the RC file (~/.rishrc) if it exists.
fn load_rc(repl: &mut ReplLoop<Calculator>) {
    let Some(path) = config::rc_path() else {
        return;
    };
    if !path.exists() {
        return;
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            for err in repl.preload(&contents) {
                eprintln!("~/.rishrc: {}", err);
            }
        }
        Err(e) => warn!(path = %path.display(), error = %e, "cannot read rc file"),
    }
}

/// Run the interactive REPL with rustyline (when stdin is a TTY).
fn run_interactive(repl: &mut ReplLoop<Calculator>) -> Result<Exit> {
    // The editor reports Ctrl-C itself; the handler covers Ctrl-C during evaluation.
    signal::install_sigint_handler(None).context("installing SIGINT handler")?;

    let history = if repl.config().history {
        config::history_path()
    } else {
        None
    };
    let mut source = match EditorSource::new(history) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to initialize editor: {}", e);
            return run_simple(repl);
        }
    };

    println!("rish {}", config::VERSION);
    println!("Type '{}' to quit, Ctrl-D for EOF", repl.config().exit_command);
    println!();

    let exit = repl.run(&mut source, &mut io::stdout());
    source.save_history();
    let exit = exit?;
    if exit == Exit::EndOfInput {
        println!();
    }
    Ok(exit)
}

/// Run the simple REPL for pipe mode (when stdin is not a TTY).
fn run_simple(repl: &mut ReplLoop<Calculator>) -> Result<Exit> {
    let reprompt = repl.config().prompt.clone();
    signal::install_sigint_handler(Some(&reprompt)).context("installing SIGINT handler")?;

    let mut source = ReaderSource::new(io::stdin().lock())
        .with_prompt(io::stdout())
        .with_sigint();
    Ok(repl.run(&mut source, &mut io::stdout())?)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut repl = ReplLoop::new(Calculator::new(), cli.config());
    if !cli.no_rc {
        load_rc(&mut repl);
    }

    let result = if io::stdin().is_terminal() {
        run_interactive(&mut repl)
    } else {
        run_simple(&mut repl)
    };

    match result {
        Ok(exit) => {
            debug!(?exit, dispatched = repl.session().dispatched, "session ended");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("rish: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
