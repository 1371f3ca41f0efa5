use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tracing::{debug, warn};

use crate::highlight::RishHelper;
use crate::repl::{Input, LineSource, ReplError};
use crate::signal;
use crate::types::Session;

/// Interactive lines from the terminal through rustyline.
pub struct EditorSource {
    editor: Editor<RishHelper, DefaultHistory>,
    history: Option<PathBuf>,
}

impl EditorSource {
    /// Create the editor and load history from `history` if given.
    pub fn new(history: Option<PathBuf>) -> Result<Self, ReplError> {
        let mut editor = Editor::with_config(
            rustyline::Config::builder()
                .auto_add_history(true)
                .build(),
        )?;
        editor.set_helper(Some(RishHelper::new()));

        if let Some(path) = &history {
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "no history loaded");
            }
        }

        Ok(EditorSource { editor, history })
    }

    /// Write history back to the file it was loaded from.
    pub fn save_history(&mut self) {
        if let Some(path) = &self.history {
            if let Err(e) = self.editor.save_history(path) {
                warn!(path = %path.display(), error = %e, "failed to save history");
            }
        }
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Input, ReplError> {
        match self.editor.readline(prompt) {
            // The editor strips the terminator the user typed
            Ok(mut line) => {
                line.push('\n');
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(err.into()),
        }
    }

    /// Ctrl-C pressed while a statement was being evaluated arrives as SIGINT.
    fn take_interrupt(&mut self) -> bool {
        signal::take_interrupt()
    }

    fn sync(&mut self, session: &Session) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.update_words(session.vars.keys().cloned());
        }
    }
}
