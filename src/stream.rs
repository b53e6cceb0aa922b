//! Streaming rewrite: a line buffer that feeds whole lines to the engine.

use crate::automaton::Automaton;
use crate::engine::MatchEngine;
use std::io::{self, Read, Write};
use std::ops::Range;

const DEFAULT_READ_SIZE: usize = 8192;

/// Growable read buffer that keeps an unfinished line across refills.
struct LineBuffer<R> {
    reader: R,
    buf: Vec<u8>,
    /// Valid bytes in `buf`.
    filled: usize,
    /// Start of the line not yet handed out.
    start: usize,
    /// Bytes below this offset hold no newline past `start`.
    scanned: usize,
    /// Bytes requested from the reader per refill.
    read_size: usize,
    /// Set once the reader is exhausted and a newline had to be synthesized.
    synthetic_eol: bool,
}

impl<R: Read> LineBuffer<R> {
    fn new(reader: R) -> Self {
        Self::with_read_size(reader, DEFAULT_READ_SIZE)
    }

    fn with_read_size(reader: R, read_size: usize) -> Self {
        let read_size = read_size.max(1);
        Self {
            reader,
            buf: vec![0; read_size + read_size / 2 + 1],
            filled: 0,
            start: 0,
            scanned: 0,
            read_size,
            synthetic_eol: false,
        }
    }

    /// Move the last `retain` bytes to the front and read more after them.
    ///
    /// Returns the number of bytes added; 0 means the stream is exhausted.
    fn fill_retaining(&mut self, retain: usize) -> io::Result<usize> {
        while self.buf.len() <= retain + self.read_size {
            let grown = self.buf.len() * 2;
            self.buf.resize(grown, 0);
            self.read_size *= 2;
        }

        self.buf.copy_within(self.filled - retain..self.filled, 0);
        self.filled = retain;

        if self.synthetic_eol {
            return Ok(0);
        }

        let window = self.filled..self.filled + self.read_size;
        let read = loop {
            match self.reader.read(&mut self.buf[window.clone()]) {
                Ok(read) => break read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        };

        if read == 0 && self.filled > 0 && self.buf[self.filled - 1] != b'\n' {
            // Pretend every non-empty stream ends with a newline.
            self.synthetic_eol = true;
            self.buf[self.filled] = b'\n';
            self.filled += 1;
            return Ok(1);
        }

        self.filled += read;
        Ok(read)
    }

    /// Next complete line, without its newline, reading more as needed.
    /// `None` once the stream is exhausted.
    fn next_line(&mut self) -> io::Result<Option<Range<usize>>> {
        loop {
            if let Some(line) = self.complete_line() {
                return Ok(Some(line));
            }
            if self.refill()? == 0 {
                return Ok(None);
            }
        }
    }

    /// Search the bytes read since the last search for a newline.
    fn complete_line(&mut self) -> Option<Range<usize>> {
        let Some(pos) = self.buf[self.scanned..self.filled]
            .iter()
            .position(|b| *b == b'\n')
        else {
            self.scanned = self.filled;
            return None;
        };
        let line = self.start..self.scanned + pos;
        self.start = line.end + 1;
        self.scanned = self.start;
        Some(line)
    }

    /// Keep the unfinished line and read after it.
    fn refill(&mut self) -> io::Result<usize> {
        let read = self.fill_retaining(self.filled - self.start)?;
        self.scanned -= self.start;
        self.start = 0;
        Ok(read)
    }
}

impl Automaton {
    /// Rewrite `reader` into `writer` line by line.
    ///
    /// Returns whether any replacement was made. A final line without a
    /// newline is written back without one.
    pub fn transform<R: Read, W: Write>(&self, reader: R, mut writer: W) -> io::Result<bool> {
        let mut lines = LineBuffer::new(reader);
        let mut engine = MatchEngine::new(self);

        while let Some(line) = lines.next_line()? {
            writer.write_all(engine.replace_line(&lines.buf[line]))?;
            if !lines.synthetic_eol {
                writer.write_all(b"\n")?;
            }
        }

        writer.flush()?;
        Ok(engine.changed())
    }

    /// Rewrite an in-memory buffer with the same line semantics as
    /// [`transform`](Self::transform).
    pub fn replace_bytes(&self, input: &[u8]) -> Replaced {
        let mut engine = MatchEngine::new(self);
        let mut output = Vec::with_capacity(input.len());

        for chunk in input.split_inclusive(|b| *b == b'\n') {
            match chunk.split_last() {
                Some((b'\n', line)) => {
                    output.extend_from_slice(engine.replace_line(line));
                    output.push(b'\n');
                }
                _ => output.extend_from_slice(engine.replace_line(chunk)),
            }
        }

        Replaced {
            output,
            changed: engine.changed(),
        }
    }
}

/// Result of [`Automaton::replace_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    pub output: Vec<u8>,
    pub changed: bool,
}
