//! The compiled replacement automaton.
//!
//! An [`Automaton`] is a DFA over bytes whose transitions either continue to
//! another state or land on a [`FoundDescriptor`] describing how to splice a
//! replacement into the output. It is immutable after construction and can be
//! shared freely between threads; all per-run state lives in
//! [`MatchEngine`](crate::engine::MatchEngine).

pub mod builder;

pub use builder::AutomatonBuilder;

use crate::pattern::PatternError;
use thiserror::Error;

/// State the engine returns to after a replacement or an unmatched byte.
pub const RESTART_STATE: usize = 0;
/// State the engine starts each line in.
pub const LINE_START_STATE: usize = 1;
/// Still at the start of the line, after a bare `\^` has been replaced.
pub const AFTER_LINE_PREFIX_STATE: usize = 2;
/// Reserved final descriptor meaning "end of line, nothing matched".
pub const NO_MATCH: usize = 0;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("no replacement patterns given")]
    EmptyPatternSet,

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("automaton construction is inconsistent: {message}")]
    Inconsistent { message: String },
}

/// One entry of a state's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep scanning in the given state.
    Continue(usize),
    /// A match (or the end-of-line terminal) was reached.
    Match(usize),
}

/// How the engine treats the end of input after a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// Stop at end of input.
    Plain,
    /// Zero-width line-start match: keep scanning even at end of input, in
    /// [`AFTER_LINE_PREFIX_STATE`].
    LineStart,
}

/// Replacement instructions for one completed match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundDescriptor {
    pub replacement: Vec<u8>,
    /// Bytes to drop from the end of the output before writing `replacement`.
    pub to_offset: usize,
    /// Bytes to rewind the input cursor by after the replacement.
    pub from_offset: isize,
    pub anchor: AnchorKind,
    /// Index of the pattern that produced this descriptor.
    pub pattern: Option<usize>,
}

impl FoundDescriptor {
    fn no_match() -> Self {
        Self {
            replacement: Vec::new(),
            to_offset: 0,
            from_offset: 0,
            anchor: AnchorKind::Plain,
            pattern: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DfaState {
    next: [Transition; 256],
}

impl DfaState {
    pub(crate) fn new(next: [Transition; 256]) -> Self {
        Self { next }
    }
}

#[derive(Debug, Clone)]
pub struct Automaton {
    states: Vec<DfaState>,
    finals: Vec<FoundDescriptor>,
    pattern_count: usize,
}

impl Automaton {
    /// Assemble and check an automaton. `finals` must not include the
    /// reserved no-match entry; it is inserted at index 0 here.
    pub(crate) fn from_parts(
        states: Vec<DfaState>,
        finals: Vec<FoundDescriptor>,
        pattern_count: usize,
    ) -> Result<Self, CompileError> {
        let mut table = Vec::with_capacity(finals.len() + 1);
        table.push(FoundDescriptor::no_match());
        table.extend(finals);

        let automaton = Self {
            states,
            finals: table,
            pattern_count,
        };
        automaton.validate()?;
        Ok(automaton)
    }

    fn validate(&self) -> Result<(), CompileError> {
        if self.states.len() <= AFTER_LINE_PREFIX_STATE {
            return Err(CompileError::Inconsistent {
                message: format!("only {} states built", self.states.len()),
            });
        }

        for (index, state) in self.states.iter().enumerate() {
            for (byte, transition) in state.next.iter().enumerate() {
                let in_range = match *transition {
                    Transition::Continue(target) => target < self.states.len(),
                    Transition::Match(found) => found < self.finals.len(),
                };
                if !in_range {
                    return Err(CompileError::Inconsistent {
                        message: format!(
                            "state {index} byte {byte} has out-of-range transition {transition:?}"
                        ),
                    });
                }
            }
        }

        if self.finals[1..].iter().any(|f| f.pattern.is_none()) {
            return Err(CompileError::Inconsistent {
                message: "final descriptor without a pattern".to_string(),
            });
        }

        Ok(())
    }

    #[inline]
    pub(crate) fn transition(&self, state: usize, byte: u8) -> Transition {
        self.states[state].next[usize::from(byte)]
    }

    #[inline]
    pub(crate) fn found(&self, index: usize) -> &FoundDescriptor {
        &self.finals[index]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of final descriptors, including the reserved no-match entry.
    pub fn found_count(&self) -> usize {
        self.finals.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    /// All final descriptors; index 0 is the reserved no-match entry.
    pub fn finals(&self) -> &[FoundDescriptor] {
        &self.finals
    }
}
