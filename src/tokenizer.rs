/// A token with its position in the original input string.
/// Used by the syntax highlighter to map tokens back to byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithPosition<'a> {
    pub text: &'a str,
    /// Byte offset of the first character of the token.
    pub position: usize,
    /// `true` for runs of word characters, `false` for single punctuation characters.
    pub word: bool,
}

impl TokenWithPosition<'_> {
    pub fn end(&self) -> usize {
        self.position + self.text.len()
    }
}

/// Word characters are letters, digits (any script) and `_`.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Iterate over the maximal runs of word characters in `text`.
///
/// Everything that is not a word character separates words, so a keyword
/// only matches when it appears as a whole token: `classify` yields the single
/// word `classify`, never `class`.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

/// Split a line into words and single punctuation characters, tracking byte positions.
///
/// Whitespace is dropped; every other non-word character becomes its own token.
pub fn tokenize_with_positions(line: &str) -> Vec<TokenWithPosition<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        if is_word_char(c) {
            if word_start.is_none() {
                word_start = Some(i);
            }
            continue;
        }

        // Flush the word that just ended
        if let Some(start) = word_start.take() {
            tokens.push(TokenWithPosition {
                text: &line[start..i],
                position: start,
                word: true,
            });
        }

        if !c.is_whitespace() {
            tokens.push(TokenWithPosition {
                text: &line[i..i + c.len_utf8()],
                position: i,
                word: false,
            });
        }
    }

    if let Some(start) = word_start {
        tokens.push(TokenWithPosition {
            text: &line[start..],
            position: start,
            word: true,
        });
    }

    tokens
}

/// Check if a string represents an integer.
pub fn is_int(s: &str) -> bool {
    s.parse::<i64>().is_ok()
}
