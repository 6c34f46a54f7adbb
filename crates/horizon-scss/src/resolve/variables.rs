//! `$name` substitution in values.

use std::sync::LazyLock;

use regex::Regex;

use super::ScopeStack;
use crate::{Error, Result};

/// Substitution passes before giving up on a self-referential value.
pub const MAX_PASSES: usize = 100;

static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([a-zA-Z_][a-zA-Z0-9_-]*)").expect("valid variable pattern"));

/// Whether `text` still references a variable.
pub fn has_variables(text: &str) -> bool {
    VARIABLE_REGEX.is_match(text)
}

/// Replace every `$name` in `text` with the variable's value.
///
/// Values may themselves contain references, so substitution repeats until
/// nothing is left; more than [`MAX_PASSES`] rounds is reported as an
/// infinite loop.
pub fn apply_variables(text: &str, scopes: &mut ScopeStack) -> Result<String> {
    let mut current = text.to_string();

    for _ in 0..MAX_PASSES {
        if !has_variables(&current) {
            return Ok(current);
        }

        let mut next = String::with_capacity(current.len());
        let mut last = 0;
        for captures in VARIABLE_REGEX.captures_iter(&current) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            next.push_str(&current[last..whole.start()]);
            next.push_str(&scopes.resolve(name.as_str())?);
            last = whole.end();
        }
        next.push_str(&current[last..]);
        current = next;
    }

    if has_variables(&current) {
        return Err(Error::infinite_loop(format!("variables in '{}'", text)));
    }
    Ok(current)
}
