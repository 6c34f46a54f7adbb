//! The scanner cursor: current character, position and source stack.

use std::collections::VecDeque;

use super::source::{CharSource, StrSource};
use crate::error::{Error, Result, SourceLocation};

/// Maximum number of nested source frames (mixin bodies, imports, branches).
const MAX_FRAMES: usize = 256;

/// Characters of context kept on each side of the cursor for error reports.
const CONTEXT_LEN: usize = 40;

/// One input source on the scanner's stack.
struct Frame {
    source: Box<dyn CharSource>,
    lookahead: VecDeque<char>,
    file: Option<String>,
    line: u32,
}

impl Frame {
    fn fill(&mut self, n: usize) -> bool {
        while self.lookahead.len() < n {
            match self.source.next_char() {
                Some(ch) => self.lookahead.push_back(ch),
                None => return false,
            }
        }
        true
    }

    fn take(&mut self) -> Option<char> {
        self.lookahead
            .pop_front()
            .or_else(|| self.source.next_char())
    }
}

/// Character cursor over a stack of sources.
///
/// Splicing text in (mixin expansion, `@import`, the chosen `@if` branch)
/// pushes a new frame; reading continues in that frame until it runs dry and
/// then falls back to the frame underneath, starting with the character that
/// was current when the splice happened.
pub struct Scanner {
    frames: Vec<Frame>,
    current: Option<char>,
    index: usize,
    recent: VecDeque<char>,
}

impl Scanner {
    /// Create a scanner over `source`. Call [`advance`](Self::advance) to
    /// load the first character.
    pub fn new(source: impl CharSource + 'static, file: Option<String>) -> Self {
        Self {
            frames: vec![Frame {
                source: Box::new(source),
                lookahead: VecDeque::new(),
                file,
                line: 1,
            }],
            current: None,
            index: 0,
            recent: VecDeque::with_capacity(CONTEXT_LEN),
        }
    }

    /// The current character, or `None` at end of input.
    pub fn current(&self) -> Option<char> {
        self.current
    }

    /// Whether the current character is `ch`.
    pub fn at(&self, ch: char) -> bool {
        self.current == Some(ch)
    }

    /// Whether the end of all input was reached.
    pub fn is_eof(&self) -> bool {
        self.current.is_none()
    }

    /// Number of characters consumed so far.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Line number in the file currently being read (1-indexed).
    pub fn line(&self) -> u32 {
        self.frames.last().map_or(1, |frame| frame.line)
    }

    /// Name of the file currently being read.
    pub fn file(&self) -> Option<&str> {
        self.frames.last().and_then(|frame| frame.file.as_deref())
    }

    /// Move to the next character and return it.
    pub fn advance(&mut self) -> Option<char> {
        if let Some(ch) = self.current {
            if self.recent.len() == CONTEXT_LEN {
                self.recent.pop_front();
            }
            self.recent.push_back(ch);
        }

        loop {
            let depth = self.frames.len();
            let Some(frame) = self.frames.last_mut() else {
                self.current = None;
                return None;
            };
            if let Some(ch) = frame.take() {
                if ch == '\n' {
                    frame.line += 1;
                }
                self.current = Some(ch);
                self.index += 1;
                return self.current;
            }
            if depth == 1 {
                self.current = None;
                return None;
            }
            self.frames.pop();
        }
    }

    /// Look at the character after the current one without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        self.peek_nth(0)
    }

    /// Look `n` characters past the next one (`peek_nth(0)` is `peek()`).
    pub fn peek_nth(&mut self, mut n: usize) -> Option<char> {
        for frame in self.frames.iter_mut().rev() {
            if frame.fill(n + 1) {
                return frame.lookahead.get(n).copied();
            }
            n -= frame.lookahead.len();
        }
        None
    }

    /// Splice `text` in front of the remaining input.
    ///
    /// The first character of `text` becomes current; the character that was
    /// current is read again once `text` is exhausted. `file` and `line`
    /// describe where the text came from, for error reports.
    pub fn insert(&mut self, text: &str, file: Option<String>, line: u32) -> Result<()> {
        self.push_frame(Box::new(StrSource::new(text)), file, line)
    }

    /// Splice another source (an imported file) in front of the remaining input.
    pub fn insert_source(
        &mut self,
        source: impl CharSource + 'static,
        file: Option<String>,
    ) -> Result<()> {
        self.push_frame(Box::new(source), file, 1)
    }

    fn push_frame(
        &mut self,
        source: Box<dyn CharSource>,
        file: Option<String>,
        line: u32,
    ) -> Result<()> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(Error::infinite_loop("nested mixin or import expansion"));
        }

        if let Some(ch) = self.current.take()
            && let Some(frame) = self.frames.last_mut()
        {
            frame.lookahead.push_front(ch);
            if ch == '\n' {
                frame.line = frame.line.saturating_sub(1);
            }
            self.index = self.index.saturating_sub(1);
        }

        self.frames.push(Frame {
            source,
            lookahead: VecDeque::new(),
            file,
            line,
        });
        self.advance();
        Ok(())
    }

    /// Skip whitespace. Returns whether anything was skipped.
    pub fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.current.is_some_and(is_whitespace) {
            self.advance();
            skipped = true;
        }
        skipped
    }

    /// Consume `ch` or fail with a scan error.
    pub fn expect(&mut self, ch: char) -> Result<()> {
        if self.current != Some(ch) {
            let found = match self.current {
                Some(found) => format!("'{}'", found.escape_default()),
                None => "end of input".to_string(),
            };
            return Err(Error::scan(format!("'{}' is expected, found {}", ch, found)));
        }
        self.advance();
        Ok(())
    }

    /// Describe the cursor position for error reports.
    pub fn location(&mut self) -> SourceLocation {
        let before: String = self.recent.iter().collect();
        let mut after = String::new();
        if let Some(ch) = self.current {
            after.push(ch);
            for n in 0..CONTEXT_LEN - 1 {
                match self.peek_nth(n) {
                    Some(ch) => after.push(ch),
                    None => break,
                }
            }
        }
        SourceLocation {
            file: self.file().map(str::to_string),
            line: self.line(),
            offset: self.index,
            before,
            after,
        }
    }
}

/// Whitespace as understood by the stylesheet grammar.
pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}
