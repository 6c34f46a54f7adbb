//! Character-level input handling.
//!
//! Raw text flows through a [`CharSource`], has its comments removed by a
//! [`CommentFilter`], and is consumed by the parser through a [`Scanner`].

mod comments;
mod cursor;
mod source;

pub use comments::CommentFilter;
pub use cursor::{Scanner, is_whitespace};
pub use source::{CharSource, ReaderSource, StrSource};

/// Whether `ch` can appear in an identifier (variable, mixin, property name).
pub fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
