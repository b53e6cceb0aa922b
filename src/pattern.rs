//! Pattern parsing: escape resolution and per-pattern anchor metadata.
//!
//! A `from` string is a sequence of raw bytes plus the escapes
//!
//! | escape | meaning |
//! |--------|---------|
//! | `\b`   | word boundary |
//! | `\^`   | start of line |
//! | `\$`   | end of line |
//! | `\r` `\t` `\v` `\n` `\f` | the usual control byte |
//! | `\\`   | a literal backslash |
//!
//! Any other escaped byte stands for itself.

use std::fmt;
use thiserror::Error;

/// Bytes that end a word unless configured otherwise.
pub const DEFAULT_WORD_END_CHARS: &[u8] = b" \t\n\r\x0b\x0c";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern {index}: empty from-string")]
    Empty { index: usize },

    #[error("pattern {index}: from-string contains a NUL byte")]
    NulByte { index: usize },
}

/// One resolved element of a `from` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Byte(u8),
    WordBoundary,
    StartOfLine,
    EndOfLine,
}

/// Split a raw `from` string into tokens.
pub fn tokenize(from: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(from.len());
    let mut bytes = from.iter().copied();

    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            tokens.push(Token::Byte(byte));
            continue;
        }
        // A trailing lone backslash is literal.
        let Some(escaped) = bytes.next() else {
            tokens.push(Token::Byte(b'\\'));
            break;
        };
        tokens.push(match escaped {
            b'b' => Token::WordBoundary,
            b'^' => Token::StartOfLine,
            b'$' => Token::EndOfLine,
            b'r' => Token::Byte(b'\r'),
            b't' => Token::Byte(b'\t'),
            b'v' => Token::Byte(0x0b),
            b'n' => Token::Byte(b'\n'),
            b'f' => Token::Byte(0x0c),
            other => Token::Byte(other),
        });
    }

    tokens
}

/// A compiled `(from, to)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    from: Vec<u8>,
    to: Vec<u8>,
    tokens: Vec<Token>,
    starts_at_word: bool,
    ends_at_word: bool,
}

impl Pattern {
    fn compile(index: usize, from: &[u8], to: &[u8]) -> Result<Self, PatternError> {
        if from.is_empty() {
            return Err(PatternError::Empty { index });
        }
        if from.contains(&0) {
            return Err(PatternError::NulByte { index });
        }

        let tokens = tokenize(from);
        let starts_at_word = tokens.len() > 1
            && matches!(tokens[0], Token::WordBoundary | Token::StartOfLine);
        let ends_at_word = tokens.len() > 1
            && matches!(tokens[tokens.len() - 1], Token::WordBoundary | Token::EndOfLine);

        Ok(Self {
            from: from.to_vec(),
            to: to.to_vec(),
            tokens,
            starts_at_word,
            ends_at_word,
        })
    }

    pub fn to(&self) -> &[u8] {
        &self.to
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Effective length: one unit per literal byte or resolved escape.
    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Starts with `\b` or `\^` followed by more tokens.
    pub fn starts_at_word(&self) -> bool {
        self.starts_at_word
    }

    /// Ends with `\b` or `\$` preceded by more tokens.
    pub fn ends_at_word(&self) -> bool {
        self.ends_at_word
    }

    /// The pattern is exactly `\^`: a zero-width match at every line start.
    pub fn is_bare_line_start(&self) -> bool {
        self.tokens == [Token::StartOfLine]
    }

    /// The pattern is exactly `\$`: a zero-width match at every line end.
    pub fn is_bare_line_end(&self) -> bool {
        self.tokens == [Token::EndOfLine]
    }

    /// Leading anchor tokens that never consume input when the match is
    /// placed in the output.
    pub(crate) fn leading_anchor_width(&self) -> usize {
        usize::from(self.starts_at_word || self.is_bare_line_start())
    }

    /// Trailing anchor tokens that were matched against input which must be
    /// scanned again after the replacement.
    pub(crate) fn trailing_anchor_width(&self) -> usize {
        usize::from(self.ends_at_word || self.is_bare_line_end())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' -> '{}'",
            String::from_utf8_lossy(&self.from),
            String::from_utf8_lossy(&self.to)
        )
    }
}

/// Ordered collection of compiled patterns plus the word-ending byte table.
///
/// Pattern order is significant: when two patterns complete with the same
/// length at the same position, the one added first wins.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    word_end: [bool; 256],
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternSet {
    pub fn new() -> Self {
        Self::with_word_end_chars(DEFAULT_WORD_END_CHARS)
    }

    /// Create an empty set whose `\b` matches exactly the given bytes.
    ///
    /// NUL is reserved for end of line and is ignored here.
    pub fn with_word_end_chars(chars: &[u8]) -> Self {
        let mut word_end = [false; 256];
        for &byte in chars.iter().filter(|b| **b != 0) {
            word_end[usize::from(byte)] = true;
        }
        Self {
            patterns: Vec::new(),
            word_end,
        }
    }

    /// Compile and append a `(from, to)` pair.
    pub fn add(
        &mut self,
        from: impl AsRef<[u8]>,
        to: impl AsRef<[u8]>,
    ) -> Result<&Pattern, PatternError> {
        let index = self.patterns.len();
        let pattern = Pattern::compile(index, from.as_ref(), to.as_ref())?;
        self.patterns.push(pattern);
        Ok(&self.patterns[index])
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn is_word_end(&self, byte: u8) -> bool {
        self.word_end[usize::from(byte)]
    }

    pub fn word_end_chars(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|b| self.is_word_end(*b))
    }
}
