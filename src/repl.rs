use std::any::Any;
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::eval::Evaluator;
use crate::multiline::InputAccumulator;
use crate::signal;
use crate::types::{EvalError, Session, Value};

/// One thing obtained from a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A physical line, including its terminator when it had one.
    Line(String),
    /// The operator asked to abandon the statement being typed.
    Interrupted,
    /// No more lines will come.
    Eof,
}

/// Failures of the input machinery. Evaluation faults are never reported here.
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("read error: {0}")]
    Io(#[from] io::Error),
    #[error("line editor error: {0}")]
    Readline(#[from] ReadlineError),
    #[error("signal setup failed: {0}")]
    Signal(#[from] nix::Error),
}

/// Where the shell gets its lines from.
pub trait LineSource {
    /// Block until the next line, interrupt, or end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Input, ReplError>;

    /// Report (and forget) an interrupt that arrived out of band while
    /// [`read_line`](Self::read_line) was blocked.
    fn take_interrupt(&mut self) -> bool {
        false
    }

    /// Called before every read so the source can reflect session state.
    fn sync(&mut self, _session: &Session) {}
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The exit command was entered.
    Command,
    /// The line source ran dry.
    EndOfInput,
}

/// Outcome of feeding one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

/// The read → accumulate → test → dispatch cycle.
pub struct ReplLoop<E> {
    evaluator: E,
    session: Session,
    input: InputAccumulator,
    config: Config,
}

impl<E: Evaluator> ReplLoop<E> {
    pub fn new(evaluator: E, config: Config) -> Self {
        Self::with_session(evaluator, Session::new(), config)
    }

    pub fn with_session(evaluator: E, session: Session, config: Config) -> Self {
        ReplLoop {
            evaluator,
            session,
            input: InputAccumulator::new(),
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn accumulator(&self) -> &InputAccumulator {
        &self.input
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// End the session and hand back its state.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Fresh prompt when nothing is pending, continuation prompt otherwise.
    pub fn prompt(&self) -> &str {
        if self.input.is_empty() {
            &self.config.prompt
        } else {
            &self.config.continuation_prompt
        }
    }

    /// Drop the statement in progress. Never ends the session.
    pub fn interrupt(&mut self) {
        if !self.input.is_empty() {
            debug!(pending = self.input.value().len(), "interrupt: discarding partial statement");
        }
        self.input.clear();
    }

    /// Drive the loop until the exit command or end of input.
    pub fn run<S, W>(&mut self, source: &mut S, out: &mut W) -> Result<Exit, ReplError>
    where
        S: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        loop {
            // Interrupts raised since the last read belong to the pending
            // statement, not to the line about to be read.
            if source.take_interrupt() {
                self.interrupt();
            }
            source.sync(&self.session);
            let event = source.read_line(self.prompt())?;

            // An interrupt that landed while we were blocked applies before
            // whatever the read produced.
            if source.take_interrupt() {
                self.interrupt();
            }

            match event {
                Input::Line(line) => {
                    if self.step(&line, out)? == Step::Exit {
                        return Ok(Exit::Command);
                    }
                }
                Input::Interrupted => self.interrupt(),
                Input::Eof => {
                    debug!("end of input");
                    return Ok(Exit::EndOfInput);
                }
            }
            out.flush()?;
        }
    }

    /// Feed one line. The exit command is honoured before anything else,
    /// even in the middle of a statement.
    pub fn step<W: Write + ?Sized>(&mut self, line: &str, out: &mut W) -> io::Result<Step> {
        if line.trim() == self.config.exit_command {
            writeln!(out, "{}", self.config.farewell)?;
            return Ok(Step::Exit);
        }

        self.input.append(line);
        if !self.input.is_complete() {
            trace!("statement continues");
            return Ok(Step::Continue);
        }

        match self.evaluate_buffer() {
            Ok(value) => writeln!(out, "{}", value)?,
            Err(err) => writeln!(out, "{}", err)?,
        }
        Ok(Step::Continue)
    }

    /// Run a script through the same accumulate/evaluate cycle without
    /// printing results. Returns the evaluation errors in order.
    pub fn preload(&mut self, script: &str) -> Vec<EvalError> {
        let mut errors = Vec::new();
        for line in script.split_inclusive('\n') {
            self.input.append(line);
            if !self.input.is_complete() {
                continue;
            }
            if let Err(err) = self.evaluate_buffer() {
                errors.push(err);
            }
        }
        if !self.input.is_empty() {
            warn!(pending = self.input.value(), "discarding incomplete statement");
            self.input.clear();
        }
        errors
    }

    /// Evaluate the buffer and clear it, whatever the outcome.
    fn evaluate_buffer(&mut self) -> Result<Value, EvalError> {
        let text = self.input.value();
        self.session.dispatched += 1;
        debug!(bytes = text.len(), n = self.session.dispatched, "dispatch");

        let evaluator = &mut self.evaluator;
        let session = &mut self.session;
        let result = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(session, text)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                warn!(%message, "evaluator panicked");
                Err(EvalError::new("Panic", message))
            });

        self.input.clear();
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "evaluator panicked".to_string()
    }
}

// ========== Buffered reader source ==========

/// Lines from any [`BufRead`]: piped stdin, rc files, test input.
pub struct ReaderSource<R, W = io::Sink> {
    reader: R,
    prompt_out: Option<W>,
    sigint: bool,
}

impl<R: BufRead> ReaderSource<R> {
    /// A silent source: no prompts, no interrupt polling.
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            prompt_out: None,
            sigint: false,
        }
    }
}

impl<R: BufRead, W: Write> ReaderSource<R, W> {
    /// Write each prompt to `out` before reading.
    pub fn with_prompt<W2: Write>(self, out: W2) -> ReaderSource<R, W2> {
        ReaderSource {
            reader: self.reader,
            prompt_out: Some(out),
            sigint: self.sigint,
        }
    }

    /// Report SIGINTs collected by [`signal::install_sigint_handler`].
    pub fn with_sigint(mut self) -> Self {
        self.sigint = true;
        self
    }
}

impl<R: BufRead, W: Write> LineSource for ReaderSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Input, ReplError> {
        if let Some(out) = self.prompt_out.as_mut() {
            write!(out, "{}", prompt)?;
            out.flush()?;
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line)? {
            0 => Ok(Input::Eof),
            _ => Ok(Input::Line(line)),
        }
    }

    fn take_interrupt(&mut self) -> bool {
        self.sigint && signal::take_interrupt()
    }
}
