use std::borrow::Cow;
use std::collections::HashSet;

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper, Result};

use crate::multiline::{BLOCK_KEYWORDS, BRACKET_PAIRS, CLOSING_KEYWORD};
use crate::tokenizer;

/// The rustyline helper for rish.
///
/// Highlights keywords, brackets, numbers and bound variables, and
/// tab-completes keywords and variable names. Statement completeness is
/// decided by the shell loop, not by the editor, so validation accepts
/// every line.
pub struct RishHelper {
    /// Names bound in the session, synced before each readline.
    pub session_words: HashSet<String>,
}

impl Default for RishHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl RishHelper {
    pub fn new() -> Self {
        RishHelper {
            session_words: HashSet::new(),
        }
    }

    /// Update the set of known variable names.
    pub fn update_words(&mut self, words: impl IntoIterator<Item = String>) {
        self.session_words.clear();
        self.session_words.extend(words);
    }
}

impl Helper for RishHelper {}

// ========== Highlighter ==========

/// ANSI color codes.
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Words highlighted besides the block keywords and `end`.
const EXTRA_KEYWORDS: &[&str] = &["elsif", "else", "then", "true", "false", "nil"];

fn is_keyword(word: &str) -> bool {
    word == CLOSING_KEYWORD || BLOCK_KEYWORDS.contains(&word) || EXTRA_KEYWORDS.contains(&word)
}

fn is_bracket(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => BRACKET_PAIRS.iter().any(|(open, close)| c == *open || c == *close),
        _ => false,
    }
}

impl Highlighter for RishHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let tokens = tokenizer::tokenize_with_positions(line);
        if tokens.is_empty() {
            return Cow::Borrowed(line);
        }

        let mut result = String::with_capacity(line.len() + tokens.len() * 10);
        let mut last_end: usize = 0;

        for tok in &tokens {
            // Whitespace and anything else between tokens passes through
            result.push_str(&line[last_end..tok.position]);

            let color = if !tok.word {
                is_bracket(tok.text).then_some(YELLOW)
            } else if is_keyword(tok.text) {
                Some(MAGENTA)
            } else if tokenizer::is_int(tok.text) {
                Some(CYAN)
            } else if self.session_words.contains(tok.text) {
                Some(GREEN)
            } else {
                None
            };

            match color {
                Some(color) => {
                    result.push_str(color);
                    result.push_str(tok.text);
                    result.push_str(RESET);
                }
                None => result.push_str(tok.text),
            }
            last_end = tok.end();
        }

        result.push_str(&line[last_end..]);
        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        // Always re-highlight (simple approach)
        true
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(&'s self, prompt: &'p str, _default: bool) -> Cow<'b, str> {
        Cow::Borrowed(prompt)
    }
}

// ========== Validator ==========

impl Validator for RishHelper {}

// ========== Completer ==========

impl Completer for RishHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let (word_start, word) = find_word_at(line, pos);
        if word.is_empty() {
            return Ok((pos, Vec::new()));
        }
        Ok((word_start, self.candidates(word)))
    }
}

impl RishHelper {
    /// Keywords and session names starting with `prefix`, sorted, without duplicates.
    fn candidates(&self, prefix: &str) -> Vec<Pair> {
        let mut names: Vec<&str> = BLOCK_KEYWORDS
            .iter()
            .chain(EXTRA_KEYWORDS)
            .copied()
            .chain(std::iter::once(CLOSING_KEYWORD))
            .chain(self.session_words.iter().map(String::as_str))
            .filter(|w| w.starts_with(prefix))
            .collect();
        names.sort_unstable();
        names.dedup();

        names
            .into_iter()
            .map(|w| Pair {
                display: w.to_string(),
                replacement: w.to_string(),
            })
            .collect()
    }
}

/// Find the word being typed at the cursor position.
/// Returns (start_position, word_slice).
fn find_word_at(line: &str, pos: usize) -> (usize, &str) {
    let start = line[..pos]
        .char_indices()
        .rev()
        .find(|(_, c)| !tokenizer::is_word_char(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    (start, &line[start..pos])
}

// ========== Hinter (no-op) ==========

impl Hinter for RishHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_keywords_and_numbers() {
        let helper = RishHelper::new();
        let out = helper.highlight("if x > 10", 0);
        assert_eq!(
            out,
            format!("{MAGENTA}if{RESET} x > {CYAN}10{RESET}")
        );
    }

    #[test]
    fn test_highlight_brackets_and_session_words() {
        let mut helper = RishHelper::new();
        helper.update_words(vec!["total".to_string()]);
        let out = helper.highlight("(total)", 0);
        assert_eq!(
            out,
            format!("{YELLOW}({RESET}{GREEN}total{RESET}{YELLOW}){RESET}")
        );
    }

    #[test]
    fn test_highlight_keeps_substrings_plain() {
        let helper = RishHelper::new();
        assert_eq!(helper.highlight("classify  ", 0), "classify  ");
        assert_eq!(helper.highlight("", 0), "");
    }

    #[test]
    fn test_find_word_at() {
        assert_eq!(find_word_at("x = to", 6), (4, "to"));
        assert_eq!(find_word_at("foo(ba", 6), (4, "ba"));
        assert_eq!(find_word_at("", 0), (0, ""));
    }

    #[test]
    fn test_candidates() {
        let mut helper = RishHelper::new();
        helper.update_words(vec!["done".to_string(), "delta".to_string()]);
        let names: Vec<String> = helper.candidates("d").into_iter().map(|p| p.display).collect();
        assert_eq!(names, vec!["def", "delta", "do", "done"]);
        let names: Vec<String> = helper.candidates("e").into_iter().map(|p| p.display).collect();
        assert_eq!(names, vec!["else", "elsif", "end"]);
    }
}
