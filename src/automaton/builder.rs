//! Subset construction from a pattern set to a replacement DFA.
//!
//! Every token of every pattern gets a numbered follow position (starting at
//! 1), and each pattern is terminated by an end marker. A DFA state is a set
//! of live follow positions together with the best match completed so far.
//! Three seed sets start the construction:
//!
//! - state 0 (restart): positions live anywhere inside a line,
//! - state 1 (line start): positions live at the first byte of a line,
//! - state 2 (after line prefix): state 1 without any bare `\^`.
//!
//! A bare `\^` fires on whatever byte comes first, and scanning of the line
//! resumes in state 2 so that other line-start patterns still apply.
//!
//! The end of a line is fed to the automaton as the sentinel byte 0, which is
//! how `\$` and a trailing `\b` get matched.

use super::{
    AnchorKind, Automaton, CompileError, DfaState, FoundDescriptor, Transition, NO_MATCH,
    RESTART_STATE,
};
use crate::bitset::BitSet;
use crate::cache::{PendingFinal, StateCache, StateSet};
use crate::pattern::{PatternSet, Token};

/// One slot of the follow-position table.
#[derive(Debug, Clone, Copy)]
struct FollowPosition {
    /// `None` marks the end of a pattern.
    token: Option<Token>,
    pattern: usize,
    /// Tokens matched once this position has been passed.
    len: usize,
}

impl FollowPosition {
    fn is_end(&self) -> bool {
        self.token.is_none()
    }

    fn is_anchor(&self) -> bool {
        matches!(self.token, Some(Token::WordBoundary | Token::EndOfLine))
    }
}

/// Builds an [`Automaton`] from a [`PatternSet`].
pub struct AutomatonBuilder<'a> {
    patterns: &'a PatternSet,
}

impl<'a> AutomatonBuilder<'a> {
    pub fn new(patterns: &'a PatternSet) -> Self {
        Self { patterns }
    }

    pub fn build(self) -> Result<Automaton, CompileError> {
        if self.patterns.is_empty() {
            return Err(CompileError::EmptyPatternSet);
        }

        let follow = self.follow_positions();
        let mut cache = StateCache::new();
        let (restart, line_start, after_prefix) = self.seed_sets(&follow);
        let construction = Construction {
            patterns: self.patterns,
            follow: &follow,
            restart: restart.bits.clone(),
        };
        cache.push_seed(restart);
        cache.push_seed(line_start);
        cache.push_seed(after_prefix);

        // Sets interned while processing are appended to the cache and picked
        // up by later iterations.
        let mut states = Vec::new();
        while states.len() < cache.set_count() {
            let set = cache
                .set(states.len())
                .cloned()
                .ok_or_else(|| CompileError::Inconsistent {
                    message: format!("state set {} vanished", states.len()),
                })?;
            let next = construction.transitions(&set, &mut cache)?;
            states.push(DfaState::new(next));
        }

        let finals = cache
            .into_finals()
            .into_iter()
            .map(|pending| self.descriptor(pending))
            .collect::<Result<Vec<_>, _>>()?;

        let automaton = Automaton::from_parts(states, finals, self.patterns.len())?;
        tracing::debug!(
            patterns = automaton.pattern_count(),
            positions = follow.len(),
            states = automaton.state_count(),
            finals = automaton.found_count(),
            "compiled replacement automaton"
        );
        Ok(automaton)
    }

    /// Lay out the follow-position table. Index 0 is unused.
    fn follow_positions(&self) -> Vec<FollowPosition> {
        let total = 1 + self.patterns.iter().map(|p| p.len() + 1).sum::<usize>();
        let mut follow = Vec::with_capacity(total);
        follow.push(FollowPosition {
            token: None,
            pattern: 0,
            len: 0,
        });

        for (index, pattern) in self.patterns.iter().enumerate() {
            for (pos, token) in pattern.tokens().iter().enumerate() {
                follow.push(FollowPosition {
                    token: Some(*token),
                    pattern: index,
                    len: pos + 1,
                });
            }
            follow.push(FollowPosition {
                token: None,
                pattern: index,
                len: pattern.len(),
            });
        }

        follow
    }

    fn seed_sets(&self, follow: &[FollowPosition]) -> (StateSet, StateSet, StateSet) {
        let mut restart = StateSet::new(follow.len());
        let mut line_start = StateSet::new(follow.len());
        let mut after_prefix = StateSet::new(follow.len());
        let mut has_prefix = false;

        let mut first = 1;
        for (index, pattern) in self.patterns.iter().enumerate() {
            match pattern.tokens()[0] {
                Token::StartOfLine if pattern.is_bare_line_start() => {
                    line_start.bits.set(first + 1);
                    if !has_prefix {
                        has_prefix = true;
                        line_start.found_pattern = Some(index);
                        line_start.found_offset = 1;
                    }
                }
                Token::StartOfLine => {
                    line_start.bits.set(first + 1);
                    after_prefix.bits.set(first + 1);
                }
                Token::EndOfLine => {
                    restart.bits.set(first);
                    line_start.bits.set(first);
                    after_prefix.bits.set(first);
                    if pattern.is_bare_line_end() {
                        for seed in [&mut line_start, &mut after_prefix] {
                            if seed.found_pattern.is_none() {
                                seed.found_pattern = Some(index);
                                seed.found_offset = 0;
                            }
                        }
                    }
                }
                Token::WordBoundary if pattern.starts_at_word() => {
                    restart.bits.set(first);
                    line_start.bits.set(first + 1);
                    after_prefix.bits.set(first + 1);
                }
                _ => {
                    restart.bits.set(first);
                    line_start.bits.set(first);
                    after_prefix.bits.set(first);
                }
            }
            first += pattern.len() + 1;
        }

        (restart, line_start, after_prefix)
    }

    fn descriptor(&self, pending: PendingFinal) -> Result<FoundDescriptor, CompileError> {
        let pattern = self
            .patterns
            .get(pending.pattern)
            .ok_or_else(|| CompileError::Inconsistent {
                message: format!("final refers to unknown pattern {}", pending.pattern),
            })?;

        let to_offset = pending
            .found_offset
            .checked_sub(pattern.leading_anchor_width())
            .ok_or_else(|| CompileError::Inconsistent {
                message: format!(
                    "pattern {} completed at offset {} before its anchor",
                    pending.pattern, pending.found_offset
                ),
            })?;
        let from_offset = signed(pending.found_offset)? - signed(pattern.len())?
            + signed(pattern.trailing_anchor_width())?;

        Ok(FoundDescriptor {
            replacement: pattern.to().to_vec(),
            to_offset,
            from_offset,
            anchor: if pattern.is_bare_line_start() {
                AnchorKind::LineStart
            } else {
                AnchorKind::Plain
            },
            pattern: Some(pending.pattern),
        })
    }
}

fn signed(value: usize) -> Result<isize, CompileError> {
    isize::try_from(value).map_err(|_| CompileError::Inconsistent {
        message: format!("offset {value} does not fit in isize"),
    })
}

/// Read-only context shared by every step of the subset construction.
struct Construction<'a> {
    patterns: &'a PatternSet,
    follow: &'a [FollowPosition],
    restart: BitSet,
}

impl Construction<'_> {
    /// Compute the 256 outgoing transitions of one state set.
    fn transitions(
        &self,
        set: &StateSet,
        cache: &mut StateCache,
    ) -> Result<[Transition; 256], CompileError> {
        let default = if set.bits.iter().any(|i| self.follow[i].is_end()) {
            let pattern = set.found_pattern.ok_or_else(|| CompileError::Inconsistent {
                message: "state holds an end marker but no completed match".to_string(),
            })?;
            Some(Transition::Match(
                cache.intern_final(pattern, set.found_offset + 1),
            ))
        } else {
            None
        };

        // A bare `\^` fires before the first byte is looked at.
        if let Some(prefix) = default.filter(|_| self.holds_line_prefix(set)) {
            return Ok([prefix; 256]);
        }

        // Unmatched input may always restart scanning.
        let mut scratch = set.bits.clone();
        if default.is_none() {
            scratch.union_with(&self.restart);
        }

        let used = self.used_bytes(&scratch);
        let mut next = [Transition::Match(NO_MATCH); 256];
        for byte in 0..=u8::MAX {
            let slot = &mut next[usize::from(byte)];
            *slot = if used[usize::from(byte)] {
                self.advance(set, &scratch, byte, cache)?
            } else if byte == 0 {
                Transition::Match(NO_MATCH)
            } else {
                default.unwrap_or(Transition::Continue(RESTART_STATE))
            };
        }

        Ok(next)
    }

    fn holds_line_prefix(&self, set: &StateSet) -> bool {
        set.bits.iter().any(|i| {
            self.follow[i].is_end()
                && self.follow[i].len == 1
                && self.follow[i - 1].token == Some(Token::StartOfLine)
        })
    }

    /// Bytes for which some live position can make progress.
    fn used_bytes(&self, scratch: &BitSet) -> [bool; 256] {
        let mut used = [false; 256];
        let mut boundary = false;

        for i in scratch {
            let pos = &self.follow[i];
            match pos.token {
                None | Some(Token::EndOfLine) => used[0] = true,
                Some(Token::Byte(byte)) => used[usize::from(byte)] = true,
                Some(Token::WordBoundary) => {
                    boundary = true;
                    if pos.len > 1 && self.follow[i + 1].is_end() {
                        used[0] = true;
                    }
                }
                Some(Token::StartOfLine) => {}
            }
        }

        if boundary {
            for byte in self.patterns.word_end_chars() {
                used[usize::from(byte)] = true;
            }
        }

        used
    }

    fn accepts(&self, i: usize, byte: u8) -> bool {
        let pos = &self.follow[i];
        match pos.token {
            None => true,
            Some(Token::Byte(b)) => b == byte,
            Some(Token::WordBoundary) => {
                self.patterns.is_word_end(byte)
                    || (byte == 0 && pos.len > 1 && self.follow[i + 1].is_end())
            }
            Some(Token::EndOfLine) => byte == 0,
            Some(Token::StartOfLine) => false,
        }
    }

    /// Follow `byte` from `set` and intern the result.
    fn advance(
        &self,
        set: &StateSet,
        scratch: &BitSet,
        byte: u8,
        cache: &mut StateCache,
    ) -> Result<Transition, CompileError> {
        let follow = self.follow;
        let mut next = StateSet {
            bits: BitSet::new(follow.len()),
            found_pattern: set.found_pattern,
            found_offset: set.found_offset + 1,
        };

        let mut found_end = 0;
        for i in scratch {
            if !self.accepts(i, byte) {
                continue;
            }
            let pos = &follow[i];
            let completes = byte == 0 || (!pos.is_end() && follow[i + 1].is_end());
            if completes && pos.len > found_end {
                found_end = pos.len;
            }
            if byte != 0 && !pos.is_end() {
                next.bits.set(i + 1);
            } else {
                next.bits.set(i);
            }
        }

        if found_end == 0 {
            return Ok(Transition::Continue(self.intern(next, cache)));
        }

        // Longest match wins: drop everything that started later than the
        // longest completion, and all but the first equal-length completion.
        let live: Vec<usize> = next.bits.iter().collect();
        let mut have_best = false;
        let mut kept = 0;
        for i in live {
            let bit = if byte == 0 && follow[i].is_anchor() {
                i + 1
            } else {
                i
            };
            let completes = byte == 0 || follow[bit].is_end();
            if follow[bit - 1].len < found_end || (have_best && completes) {
                next.bits.clear(i);
                continue;
            }
            if completes {
                next.found_pattern = Some(follow[bit].pattern);
                if byte != 0 || follow[i].is_anchor() {
                    next.found_offset = found_end;
                }
                have_best = true;
            }
            kept += 1;
        }

        if kept == 1 {
            let pattern = next.found_pattern.ok_or_else(|| CompileError::Inconsistent {
                message: format!("completion on byte {byte} without a pattern"),
            })?;
            return Ok(Transition::Match(
                cache.intern_final(pattern, next.found_offset),
            ));
        }

        Ok(Transition::Continue(self.intern(next, cache)))
    }

    /// Intern a set, ignoring completion bookkeeping when it holds no end
    /// marker (it can never be read back in that case).
    fn intern(&self, mut set: StateSet, cache: &mut StateCache) -> usize {
        if !set.bits.iter().any(|i| self.follow[i].is_end()) {
            set.found_pattern = None;
            set.found_offset = 0;
        }
        cache.intern_set(set)
    }
}
