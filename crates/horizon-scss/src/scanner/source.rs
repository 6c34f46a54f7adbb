//! Raw character sources.

use std::collections::VecDeque;
use std::io::BufRead;

/// A pull-based stream of characters.
pub trait CharSource {
    /// Return the next character, or `None` at end of input.
    fn next_char(&mut self) -> Option<char>;
}

impl<S: CharSource + ?Sized> CharSource for Box<S> {
    fn next_char(&mut self) -> Option<char> {
        (**self).next_char()
    }
}

/// Characters of an owned string.
#[derive(Debug, Clone)]
pub struct StrSource {
    text: String,
    pos: usize,
}

impl StrSource {
    /// Create a source over `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
        }
    }

    /// The part of the input not yet read.
    pub fn remaining(&self) -> &str {
        &self.text[self.pos..]
    }
}

impl CharSource for StrSource {
    fn next_char(&mut self) -> Option<char> {
        let ch = self.text[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }
}

/// Characters decoded from a buffered reader, one line at a time.
///
/// Read errors end the stream; they are logged rather than surfaced because
/// the scanner has no way to resume a half-read source.
pub struct ReaderSource<R> {
    reader: R,
    buffer: VecDeque<char>,
    done: bool,
}

impl<R: BufRead> ReaderSource<R> {
    /// Create a source over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    fn fill(&mut self) {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => self.done = true,
            Ok(_) => self.buffer.extend(line.chars()),
            Err(e) => {
                tracing::error!("Failed to read stylesheet input: {}", e);
                self.done = true;
            }
        }
    }
}

impl<R: BufRead> CharSource for ReaderSource<R> {
    fn next_char(&mut self) -> Option<char> {
        while self.buffer.is_empty() && !self.done {
            self.fill();
        }
        self.buffer.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain(source: &mut impl CharSource) -> String {
        std::iter::from_fn(|| source.next_char()).collect()
    }

    #[test]
    fn str_source_reads_all_chars() {
        let mut source = StrSource::new("a é\nb");
        assert_eq!(drain(&mut source), "a é\nb");
        assert_eq!(source.next_char(), None);
    }

    #[test]
    fn str_source_remaining() {
        let mut source = StrSource::new("abc");
        source.next_char();
        assert_eq!(source.remaining(), "bc");
    }

    #[test]
    fn reader_source_spans_lines() {
        let mut source = ReaderSource::new(Cursor::new(".a {\n  color: red;\n}\n"));
        assert_eq!(drain(&mut source), ".a {\n  color: red;\n}\n");
    }
}
