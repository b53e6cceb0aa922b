//! Line rewriting with a compiled [`Automaton`].

use crate::automaton::{
    AnchorKind, Automaton, Transition, AFTER_LINE_PREFIX_STATE, LINE_START_STATE, NO_MATCH,
    RESTART_STATE,
};

/// Per-run rewriting state: the output buffer and the changed flag.
///
/// An engine borrows the automaton read-only, so any number of engines may
/// run over the same automaton at once.
#[derive(Debug)]
pub struct MatchEngine<'a> {
    automaton: &'a Automaton,
    output: Vec<u8>,
    changed: bool,
}

impl<'a> MatchEngine<'a> {
    pub fn new(automaton: &'a Automaton) -> Self {
        Self {
            automaton,
            output: Vec::new(),
            changed: false,
        }
    }

    /// True once any replacement has been made by this engine.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Rewrite one line (without its terminator).
    ///
    /// The returned slice is valid until the next call. Replacement text is
    /// copied to the output and never scanned again.
    pub fn replace_line(&mut self, line: &[u8]) -> &[u8] {
        let automaton = self.automaton;
        let end = line.len();
        let mut cursor = 0;
        let mut state = LINE_START_STATE;
        // Embedded NUL that already produced a match; it is literal from then on.
        let mut spent_nul = None;
        self.output.clear();

        loop {
            // Scan until a final descriptor is reached. Past the end of the
            // line the sentinel byte 0 is fed in.
            let found = loop {
                if cursor > end {
                    self.output.pop();
                    return &self.output;
                }
                let byte = line.get(cursor).copied().unwrap_or(0);
                self.output.push(byte);
                cursor += 1;
                match automaton.transition(state, byte) {
                    Transition::Continue(next) => state = next,
                    Transition::Match(found) => break found,
                }
            };

            if found == NO_MATCH {
                if cursor > end {
                    self.output.pop();
                    return &self.output;
                }
                // A NUL byte inside the line: keep it and carry on.
                state = RESTART_STATE;
                continue;
            }

            let at = cursor - 1;
            if at < end {
                if spent_nul == Some(at) {
                    state = RESTART_STATE;
                    continue;
                }
                if line[at] == 0 {
                    spent_nul = Some(at);
                }
            }

            let descriptor = automaton.found(found);
            self.changed = true;
            let keep = self.output.len().saturating_sub(descriptor.to_offset);
            self.output.truncate(keep);
            self.output.extend_from_slice(&descriptor.replacement);
            cursor = rewind(cursor, descriptor.from_offset);

            state = match descriptor.anchor {
                AnchorKind::LineStart => AFTER_LINE_PREFIX_STATE,
                AnchorKind::Plain if cursor >= end => return &self.output,
                AnchorKind::Plain => RESTART_STATE,
            };
        }
    }
}

fn rewind(cursor: usize, by: isize) -> usize {
    if by >= 0 {
        cursor.saturating_sub(by.unsigned_abs())
    } else {
        cursor + by.unsigned_abs()
    }
}
