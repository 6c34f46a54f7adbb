//! Function call resolution inside property values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::builtin::{builtin, is_native};
use crate::text::{split_top_level, unquote};
use crate::{Error, Result};

/// A host-provided function. Receives the resolved, unquoted arguments.
pub type CustomFunction = Arc<dyn Fn(&[String]) -> Result<String> + Send + Sync>;

/// What to do with calls to functions nobody knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownFunctions {
    /// Fail the compile.
    pub error: bool,
    /// Report the call to the caller for a warning.
    pub warn: bool,
    /// Keep the call in the output; otherwise only its arguments remain.
    pub keep: bool,
}

impl Default for UnknownFunctions {
    fn default() -> Self {
        Self {
            error: false,
            warn: true,
            keep: true,
        }
    }
}

/// A value with every function call resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// The rewritten value.
    pub value: String,
    /// Names of unknown functions that should be warned about.
    pub unknown: Vec<String>,
}

/// Resolves `name(args)` calls: custom functions first, then builtins, then
/// native CSS functions, then the unknown-function policy.
#[derive(Clone, Default)]
pub struct FunctionEngine {
    custom: HashMap<String, CustomFunction>,
    unknown: UnknownFunctions,
}

impl fmt::Debug for FunctionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("FunctionEngine")
            .field("custom", &names)
            .field("unknown", &self.unknown)
            .finish()
    }
}

impl FunctionEngine {
    /// Create an engine with the given custom functions and policy.
    pub fn new(custom: HashMap<String, CustomFunction>, unknown: UnknownFunctions) -> Self {
        Self { custom, unknown }
    }

    /// Resolve every call in `text`.
    pub fn apply(&self, text: &str) -> Result<Applied> {
        let mut unknown = Vec::new();
        let value = self.resolve(text, &mut unknown)?;
        Ok(Applied { value, unknown })
    }

    fn resolve(&self, text: &str, unknown: &mut Vec<String>) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut quote: Option<char> = None;
        let mut escaped = false;
        let mut rest = text.char_indices();

        while let Some((i, ch)) = rest.next() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                out.push(ch);
                continue;
            }

            match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '(' => {
                    let name_start = call_name_start(&out);
                    let Some(name_start) = name_start else {
                        out.push(ch);
                        continue;
                    };
                    let close = matching_paren(text, i).ok_or_else(|| {
                        Error::scan(format!("')' is expected after '{}'", &text[i..]))
                    })?;
                    let name = out.split_off(name_start);
                    let inner = &text[i + 1..close];

                    out.push_str(&self.call(&name, inner, unknown)?);

                    // Skip past the closing paren.
                    while rest.next().is_some_and(|(j, _)| j < close) {}
                }
                _ => out.push(ch),
            }
        }

        Ok(out)
    }

    fn call(&self, name: &str, inner: &str, unknown: &mut Vec<String>) -> Result<String> {
        if name.eq_ignore_ascii_case("url") {
            return Ok(format!("{}({})", name, inner));
        }

        let inner = self.resolve(inner, unknown)?;

        if let Some(function) = self.custom.get(name) {
            return function(&split_args(&inner));
        }
        if let Some(function) = builtin(name) {
            return function(&split_args(&inner));
        }
        if is_native(name) {
            return Ok(format!("{}({})", name, inner));
        }

        if self.unknown.error {
            return Err(Error::UnknownFunction {
                name: name.to_string(),
            });
        }
        if self.unknown.warn {
            unknown.push(name.to_string());
        }
        if self.unknown.keep {
            Ok(format!("{}({})", name, inner))
        } else {
            Ok(inner)
        }
    }
}

/// Split a resolved argument list on top-level commas, trimming each
/// argument and removing quotes around fully quoted ones.
pub fn split_args(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(inner, ',')
        .into_iter()
        .map(|arg| unquote(arg.trim()).to_string())
        .collect()
}

/// Start of a function name at the end of `out`: the trailing run of name
/// characters, provided it contains a letter.
fn call_name_start(out: &str) -> Option<usize> {
    let start = out
        .char_indices()
        .rev()
        .take_while(|&(_, c)| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .last()
        .map(|(i, _)| i)?;
    out[start..]
        .chars()
        .any(|c| c.is_ascii_alphabetic())
        .then_some(start)
}

/// Byte index of the `)` matching the `(` at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
