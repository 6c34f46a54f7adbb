//! Parsing of comma-separated selector lists.

use crate::text::{collapse_whitespace, split_top_level};
use crate::{Error, Result};

/// Split a selector list into normalized selectors.
///
/// Commas inside parentheses, attribute brackets or quotes do not separate
/// selectors. Whitespace inside each selector collapses to a single space, so
/// `h1  +\n h2` becomes `h1 + h2`. Empty entries are dropped; a list with no
/// selectors at all is an error.
pub fn parse_selectors(text: &str) -> Result<Vec<String>> {
    let selectors: Vec<String> = split_top_level(text, ',')
        .into_iter()
        .map(collapse_whitespace)
        .filter(|selector| !selector.is_empty())
        .collect();

    if selectors.is_empty() {
        return Err(Error::scan("Selector expected"));
    }
    Ok(selectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_normalizes() {
        assert_eq!(
            parse_selectors("td.ln ,\n  th").unwrap(),
            vec!["td.ln", "th"]
        );
        assert_eq!(parse_selectors("h1  +\n h2").unwrap(), vec!["h1 + h2"]);
        assert_eq!(parse_selectors("a > b").unwrap(), vec!["a > b"]);
    }

    #[test]
    fn keeps_commas_in_arguments() {
        assert_eq!(
            parse_selectors("a:not(.x, .y), input[value='a,b']").unwrap(),
            vec!["a:not(.x, .y)", "input[value='a,b']"]
        );
    }

    #[test]
    fn compound_parent_references() {
        assert_eq!(parse_selectors("&:hover, &.active").unwrap(), vec!["&:hover", "&.active"]);
        assert_eq!(parse_selectors("+ li").unwrap(), vec!["+ li"]);
    }

    #[test]
    fn empty_list_is_an_error() {
        assert!(matches!(parse_selectors(" , "), Err(Error::Scan { .. })));
        assert!(parse_selectors("").is_err());
    }
}
