//! Character-level input with push-back.
//!
//! The engine reads input one character at a time but the underlying reader
//! is consumed one line at a time, lazily. Characters can be pushed back
//! after being read, which the numeric input instruction uses to backtrack.

use std::collections::VecDeque;
use std::io::{self, BufRead};

pub struct Input<R> {
    reader: R,
    buffer: VecDeque<char>,
    eof: bool,
}

impl<R: BufRead> Input<R> {
    pub fn new(reader: R) -> Self {
        Input {
            reader,
            buffer: VecDeque::new(),
            eof: false,
        }
    }

    /// Next character, or `None` at end of input.
    pub fn next_char(&mut self) -> io::Result<Option<char>> {
        if self.buffer.is_empty() && !self.eof {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                self.eof = true;
            }
            self.buffer.extend(line.chars());
        }
        Ok(self.buffer.pop_front())
    }

    /// Return a character to the stream; it is the next one read.
    pub fn unread(&mut self, c: char) {
        self.buffer.push_front(c);
    }
}
