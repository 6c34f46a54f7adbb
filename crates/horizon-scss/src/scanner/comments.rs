//! Comment stripping.

use super::source::CharSource;

/// Removes `// ...` and `/* ... */` comments from a character stream.
///
/// Quoted strings pass through untouched, and a backslash inside a string
/// keeps the following quote from closing it. Line comments keep their
/// terminating newline so line numbers stay accurate. A `//` directly after
/// a `:` is treated as part of a URL (`http://...`), not as a comment.
pub struct CommentFilter<S> {
    inner: S,
    pending: Option<char>,
    quote: Option<char>,
    escaped: bool,
    previous: Option<char>,
}

impl<S: CharSource> CommentFilter<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: None,
            quote: None,
            escaped: false,
            previous: None,
        }
    }

    fn pull(&mut self) -> Option<char> {
        self.pending.take().or_else(|| self.inner.next_char())
    }

    fn skip_line_comment(&mut self) -> Option<char> {
        loop {
            match self.inner.next_char() {
                Some('\n') => return Some('\n'),
                Some(_) => {}
                None => return None,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let mut star = false;
        while let Some(ch) = self.inner.next_char() {
            if star && ch == '/' {
                return;
            }
            star = ch == '*';
        }
    }

    fn emit(&mut self, ch: char) -> Option<char> {
        self.previous = Some(ch);
        Some(ch)
    }
}

impl<S: CharSource> CharSource for CommentFilter<S> {
    fn next_char(&mut self) -> Option<char> {
        loop {
            let ch = self.pull()?;

            if let Some(quote) = self.quote {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == quote {
                    self.quote = None;
                }
                return self.emit(ch);
            }

            match ch {
                '\'' | '"' => {
                    self.quote = Some(ch);
                    return self.emit(ch);
                }
                '/' => match self.inner.next_char() {
                    Some('/') if self.previous != Some(':') => match self.skip_line_comment() {
                        Some(newline) => return self.emit(newline),
                        None => return None,
                    },
                    Some('*') => {
                        self.skip_block_comment();
                        continue;
                    }
                    next => {
                        self.pending = next;
                        return self.emit('/');
                    }
                },
                _ => return self.emit(ch),
            }
        }
    }
}
