//! multireplace: simultaneous multi-pattern string replacement
//!
//! An ordered set of `(from, to)` byte-string pairs is compiled once into a
//! deterministic automaton, which then rewrites any number of input streams in
//! a single left-to-right pass per line.
//!
//! # Matching rules
//!
//! - At each position the longest completing pattern wins; among patterns of
//!   equal length the one given first wins.
//! - Replacement text is never scanned again.
//! - `from` strings may use `\b` (word boundary), `\^` (start of line) and
//!   `\$` (end of line), plus the escapes listed in [`pattern`].
//!
//! # Example
//!
//! ```
//! let automaton = multireplace::compile([("hello", "hi"), ("world", "earth")])?;
//! let replaced = automaton.replace_bytes(b"hello world\n");
//! assert_eq!(replaced.output, b"hi earth\n");
//! assert!(replaced.changed);
//! # Ok::<(), multireplace::CompileError>(())
//! ```
//!
//! Files are rewritten in place with [`Automaton::transform_file`], which
//! writes to a sibling temporary file and renames it over the original only
//! when something changed.

pub mod automaton;
pub mod bitset;
mod cache;
pub mod config;
pub mod edit;
pub mod engine;
pub mod pattern;
pub mod stream;

// Re-exports
pub use automaton::{
    AnchorKind, Automaton, AutomatonBuilder, CompileError, FoundDescriptor, Transition,
};
pub use config::{
    load_from_path, load_from_str, ConfigError, Options, Rule, RulesConfig, RulesOrigin,
};
pub use edit::FileError;
pub use engine::MatchEngine;
pub use pattern::{Pattern, PatternError, PatternSet, Token, DEFAULT_WORD_END_CHARS};
pub use stream::Replaced;

/// Compile `(from, to)` pairs with the default word-ending bytes.
pub fn compile<I, F, T>(pairs: I) -> Result<Automaton, CompileError>
where
    I: IntoIterator<Item = (F, T)>,
    F: AsRef<[u8]>,
    T: AsRef<[u8]>,
{
    let mut patterns = PatternSet::new();
    for (from, to) in pairs {
        patterns.add(from, to)?;
    }
    AutomatonBuilder::new(&patterns).build()
}
