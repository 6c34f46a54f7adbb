//! Raw text readers over the scanner.
//!
//! These helpers consume (or only look at) input without interpreting it.
//! They all agree on what "top level" means: outside quoted strings,
//! parentheses and `#{...}` interpolations.

use crate::scanner::{Scanner, is_name_char};
use crate::{Error, Result};

/// What ends the statement starting at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminator {
    /// `{`: a selector block or a nested-property block.
    OpenBlock,
    /// `;`: a declaration.
    Semicolon,
    /// `}`: the last declaration of a block, without its `;`.
    CloseBlock,
    /// End of input.
    End,
}

/// Tracks quotes, parentheses and interpolations across a character run.
#[derive(Debug, Default)]
pub(crate) struct Nesting {
    quote: Option<char>,
    escaped: bool,
    parens: usize,
    interpolation: usize,
    previous: Option<char>,
}

impl Nesting {
    /// Feed one character. Returns whether it sits at the top level.
    pub(crate) fn step(&mut self, ch: char) -> bool {
        let previous = self.previous.replace(ch);

        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == quote {
                self.quote = None;
            }
            return false;
        }

        match ch {
            '"' | '\'' => {
                self.quote = Some(ch);
                false
            }
            '{' if self.interpolation > 0 || previous == Some('#') => {
                self.interpolation += 1;
                false
            }
            '}' if self.interpolation > 0 => {
                self.interpolation -= 1;
                false
            }
            _ if self.interpolation > 0 => false,
            '(' => {
                self.parens += 1;
                false
            }
            ')' => {
                self.parens = self.parens.saturating_sub(1);
                false
            }
            _ => self.parens == 0,
        }
    }

    fn check_closed(&self) -> Result<()> {
        if self.quote.is_some() {
            Err(Error::scan("unterminated string"))
        } else if self.interpolation > 0 {
            Err(Error::scan("'}' is expected: unterminated interpolation"))
        } else {
            Ok(())
        }
    }
}

/// The character `n` positions from the cursor (`0` is the current one).
fn char_at(scanner: &mut Scanner, n: usize) -> Option<char> {
    match n {
        0 => scanner.current(),
        n => scanner.peek_nth(n - 1),
    }
}

/// Look ahead to the end of the statement at the cursor without consuming it.
pub(crate) fn classify(scanner: &mut Scanner) -> Terminator {
    let mut nesting = Nesting::default();
    let mut n = 0;
    while let Some(ch) = char_at(scanner, n) {
        if nesting.step(ch) {
            match ch {
                '{' => return Terminator::OpenBlock,
                ';' => return Terminator::Semicolon,
                '}' => return Terminator::CloseBlock,
                _ => {}
            }
        }
        n += 1;
    }
    Terminator::End
}

/// Consume input up to (not including) the first top-level character in
/// `stops`, or to the end of input.
pub(crate) fn read_until(scanner: &mut Scanner, stops: &[char]) -> Result<String> {
    let mut nesting = Nesting::default();
    let mut text = String::new();
    while let Some(ch) = scanner.current() {
        if nesting.step(ch) && stops.contains(&ch) {
            break;
        }
        text.push(ch);
        scanner.advance();
    }
    nesting.check_closed()?;
    Ok(text)
}

/// Consume a balanced `open ... close` group and return what is inside.
///
/// Quoted strings are skipped, so brackets inside them do not count.
pub(crate) fn read_balanced(scanner: &mut Scanner, open: char, close: char) -> Result<String> {
    scanner.expect(open)?;

    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut text = String::new();

    loop {
        let Some(ch) = scanner.current() else {
            return Err(Error::scan(format!(
                "'{}' is expected: '{}' is not closed",
                close, open
            )));
        };
        scanner.advance();

        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
        } else if ch == '"' || ch == '\'' {
            quote = Some(ch);
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Ok(text);
            }
        }
        text.push(ch);
    }
}

/// Consume an identifier.
pub(crate) fn read_name(scanner: &mut Scanner) -> String {
    let mut name = String::new();
    while let Some(ch) = scanner.current().filter(|&ch| is_name_char(ch)) {
        name.push(ch);
        scanner.advance();
    }
    name
}

/// Whether the cursor is at `word` followed by a non-identifier character.
pub(crate) fn at_word(scanner: &mut Scanner, word: &str) -> bool {
    let mut n = 0;
    for expected in word.chars() {
        if char_at(scanner, n) != Some(expected) {
            return false;
        }
        n += 1;
    }
    !char_at(scanner, n).is_some_and(is_name_char)
}

/// Consume `word`; the caller has checked it with [`at_word`].
pub(crate) fn skip_word(scanner: &mut Scanner, word: &str) {
    for _ in word.chars() {
        scanner.advance();
    }
}

/// Split `name: value` at the first top-level colon.
pub(crate) fn split_declaration(text: &str) -> Option<(&str, &str)> {
    let mut nesting = Nesting::default();
    text.char_indices()
        .find(|&(_, ch)| nesting.step(ch) && ch == ':')
        .map(|(i, _)| (&text[..i], &text[i + 1..]))
}

/// Byte offset of the `}` closing an interpolation whose `#{` was just
/// consumed.
pub(crate) fn interpolation_end(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
