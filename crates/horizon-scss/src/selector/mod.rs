//! Selector lists and parent-selector combination.

mod combinator;
mod list;

pub use combinator::{combine, is_possibly_harmful};
pub use list::parse_selectors;
