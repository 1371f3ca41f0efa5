/// Version string for the shell.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings for one shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prompt shown when no statement is in progress.
    pub prompt: String,
    /// Prompt shown while a statement is still open.
    pub continuation_prompt: String,
    /// A line equal to this (after trimming) ends the session.
    pub exit_command: String,
    /// Printed when the session ends through the exit command.
    pub farewell: String,
    /// Load and save line-editor history.
    pub history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prompt: "> ".to_string(),
            continuation_prompt: "* ".to_string(),
            exit_command: "quit".to_string(),
            farewell: "closing...".to_string(),
            history: true,
        }
    }
}

/// Return the path to the RC configuration file (~/.rishrc).
pub fn rc_path() -> Option<std::path::PathBuf> {
    dirs_or_home().map(|h| h.join(".rishrc"))
}

/// Return the path to the history file (~/.rish_history).
pub fn history_path() -> Option<std::path::PathBuf> {
    dirs_or_home().map(|h| h.join(".rish_history"))
}

/// Get the user's home directory from $HOME.
fn dirs_or_home() -> Option<std::path::PathBuf> {
    std::env::var("HOME").ok().map(std::path::PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.exit_command, "quit");
        assert_ne!(config.prompt, config.continuation_prompt);
    }

    #[test]
    fn test_paths_file_names() {
        if let Some(path) = rc_path() {
            assert!(path.ends_with(".rishrc"));
        }
        if let Some(path) = history_path() {
            assert!(path.ends_with(".rish_history"));
        }
    }
}
