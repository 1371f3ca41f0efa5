use tracing::trace;

use crate::tokenizer;

/// Keywords that open a block and need one `end` each.
///
/// Not exhaustive: words outside this table (`while`, `case`, ...) never ask
/// for a closer.
pub const BLOCK_KEYWORDS: &[&str] = &["class", "module", "def", "begin", "do", "if", "unless"];

/// The keyword that closes any block opened by [`BLOCK_KEYWORDS`].
pub const CLOSING_KEYWORD: &str = "end";

/// Opener/closer characters, balanced independently of each other.
pub const BRACKET_PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

/// Counts behind the completeness verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Balance {
    /// Whole-token occurrences of block-opening keywords.
    pub required_closers: usize,
    /// Whole-token occurrences of `end`.
    pub actual_closers: usize,
    /// `(openers, closers)` for each entry of [`BRACKET_PAIRS`], in order.
    pub brackets: [(usize, usize); 3],
}

impl Balance {
    /// Measure `text`. Brackets and keywords inside string or comment
    /// contents are counted like any other text.
    pub fn of(text: &str) -> Self {
        let mut balance = Balance::default();

        for word in tokenizer::words(text) {
            if word == CLOSING_KEYWORD {
                balance.actual_closers += 1;
            } else if BLOCK_KEYWORDS.contains(&word) {
                balance.required_closers += 1;
            }
        }

        for c in text.chars() {
            for (i, (open, close)) in BRACKET_PAIRS.iter().enumerate() {
                if c == *open {
                    balance.brackets[i].0 += 1;
                } else if c == *close {
                    balance.brackets[i].1 += 1;
                }
            }
        }

        balance
    }

    /// At least as many `end`s as block openers. Positions are not checked.
    pub fn keywords_balanced(&self) -> bool {
        self.actual_closers >= self.required_closers
    }

    /// Every bracket pair has exactly as many closers as openers.
    pub fn brackets_balanced(&self) -> bool {
        self.brackets.iter().all(|(open, close)| open == close)
    }

    pub fn is_complete(&self) -> bool {
        self.keywords_balanced() && self.brackets_balanced()
    }
}

/// Text typed for the statement currently being entered.
///
/// Chunks are concatenated exactly as given; the accumulator adds no
/// separators of its own.
#[derive(Debug, Default, Clone)]
pub struct InputAccumulator {
    buffer: String,
}

impl InputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn balance(&self) -> Balance {
        Balance::of(&self.buffer)
    }

    /// Check whether the buffer is ready to be evaluated.
    ///
    /// Returns `true` when there are at least as many `end` tokens as
    /// block-opening keywords, and each of `()`, `[]`, `{}` has as many
    /// closers as openers. This is a counting heuristic: `"(]"` is not
    /// complete, `"(])["` is.
    pub fn is_complete(&self) -> bool {
        let balance = self.balance();
        trace!(?balance, "completeness check");
        balance.is_complete()
    }
}
