//! The block parser: drives the scanner and builds the definition list.
//!
//! Parsing is a single pass over the character stream. Mixin bodies,
//! imported files and the chosen `@if` branch are spliced back into the
//! scanner as text and parsed as if they had been written in place.
//!
//! Each open block is represented twice: as a [`ScopeStack`] frame for the
//! variables declared inside it, and as a parser frame holding the selector
//! list (and nested-property prefix) declarations in it belong to. Both are
//! pushed on `{` and popped on `}`.

mod directives;
mod reader;

use std::path::PathBuf;

use crate::functions::FunctionEngine;
use crate::loader::Loader;
use crate::logger::Logger;
use crate::resolve::{MixinRegistry, ScopeStack, apply_variables, has_variables};
use crate::rules::{DefinitionList, Property};
use crate::scanner::Scanner;
use crate::selector::{combine, is_possibly_harmful, parse_selectors};
use crate::text::{normalize_value, unquote};
use crate::{Error, Result};

use reader::{Terminator, classify, interpolation_end, read_name, read_until, split_declaration};

/// Everything a parse reads from or writes to, borrowed from the compiler.
pub struct ParseContext<'a> {
    /// Variable bindings; the global scope outlives a single parse.
    pub scopes: &'a mut ScopeStack,
    /// Mixins defined so far.
    pub mixins: &'a mut MixinRegistry,
    /// Output rules.
    pub definitions: &'a mut DefinitionList,
    /// Resolved paths of imported files.
    pub dependencies: &'a mut Vec<PathBuf>,
    /// Function call resolution for values.
    pub functions: &'a FunctionEngine,
    /// Source of `@import`ed text.
    pub loader: &'a dyn Loader,
    /// Message sink.
    pub logger: &'a dyn Logger,
    /// Record `source:`/`import:`/`include mixin:` comments.
    pub debug_comments: bool,
}

/// Selector state of one open block.
#[derive(Debug, Clone, Default)]
struct Frame {
    /// Full selectors declarations in this block belong to.
    selectors: Vec<String>,
    /// Prefix for property names inside a nested-property block, e.g. `font-`.
    prefix: String,
}

/// Recursive-descent parser over one input stream.
pub struct BlockParser<'a> {
    scanner: Scanner,
    context: ParseContext<'a>,
    frames: Vec<Frame>,
}

impl<'a> BlockParser<'a> {
    /// Create a parser. The scanner must already be positioned on its first
    /// character.
    pub fn new(scanner: Scanner, context: ParseContext<'a>) -> Self {
        Self {
            scanner,
            context,
            frames: Vec::new(),
        }
    }

    /// Parse the whole input.
    ///
    /// Errors are returned with the cursor position attached. Scopes opened
    /// by this parse are closed again either way, so the global variables
    /// remain usable for the next input.
    pub fn run(mut self) -> Result<()> {
        let result = self.parse();

        for _ in 0..self.frames.len() {
            if self.context.scopes.pop_scope().is_err() {
                break;
            }
        }

        result.map_err(|error| error.at(self.scanner.location()))
    }

    fn parse(&mut self) -> Result<()> {
        loop {
            self.scanner.skip_whitespace();
            let Some(ch) = self.scanner.current() else {
                break;
            };
            match ch {
                '}' => self.close_block()?,
                ';' => {
                    self.scanner.advance();
                }
                '$' => self.variable()?,
                '@' => self.directive()?,
                _ => self.statement()?,
            }
        }

        if !self.frames.is_empty() {
            return Err(Error::scan("'}' is expected: block is not closed"));
        }
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        if self.frames.pop().is_none() {
            return Err(Error::UnbalancedBlock);
        }
        self.context.scopes.pop_scope()?;
        self.scanner.advance();
        Ok(())
    }

    /// `$name: value [!default];`
    fn variable(&mut self) -> Result<()> {
        self.scanner.advance();
        let name = read_name(&mut self.scanner);
        if name.is_empty() {
            return Err(Error::scan("variable name expected after '$'"));
        }
        self.scanner.skip_whitespace();
        self.scanner.expect(':')?;

        let raw = read_until(&mut self.scanner, &[';', '}'])?;
        let raw = raw.trim();
        let (raw, not_default) = match raw.strip_suffix("!default") {
            Some(rest) => (rest.trim_end(), true),
            None => (raw, false),
        };

        let value = self.resolve_value(raw)?;
        let value = unquote(&value).to_string();
        if !self.context.scopes.define(&name, value, not_default) {
            self.context
                .logger
                .log(&format!("variable ${} keeps its value (!default)", name));
        }

        if self.scanner.at(';') {
            self.scanner.advance();
        }
        Ok(())
    }

    /// Selector block, nested-property block or declaration.
    fn statement(&mut self) -> Result<()> {
        match classify(&mut self.scanner) {
            Terminator::OpenBlock => self.open_block(),
            Terminator::Semicolon | Terminator::CloseBlock | Terminator::End => {
                self.declaration()
            }
        }
    }

    fn open_block(&mut self) -> Result<()> {
        let head = read_until(&mut self.scanner, &['{'])?;
        let head = head.trim();

        let frame = if let Some(name) = head.strip_suffix(':') {
            let Some(parent) = self.frames.last().cloned() else {
                return Err(Error::scan(format!(
                    "nested property '{}' outside of a selector block",
                    name.trim()
                )));
            };
            let name = self.interpolate(name.trim())?;
            Frame {
                prefix: format!("{}{}-", parent.prefix, name.trim()),
                selectors: parent.selectors,
            }
        } else {
            let text = self.interpolate(head)?;
            let children = parse_selectors(&text)?;
            let parents = self.frames.last().map(|frame| frame.selectors.as_slice());
            Frame {
                selectors: combine(parents, &children)?,
                prefix: String::new(),
            }
        };

        self.scanner.expect('{')?;
        self.context.scopes.push_scope();
        self.frames.push(frame);
        Ok(())
    }

    /// `name: value` up to `;` or the closing `}`.
    fn declaration(&mut self) -> Result<()> {
        let raw = read_until(&mut self.scanner, &[';', '}'])?;
        let Some(frame) = self.frames.last().cloned() else {
            return Err(Error::scan(format!(
                "property outside of a selector block: '{}'",
                raw.trim()
            )));
        };
        let Some((name, value)) = split_declaration(&raw) else {
            return Err(Error::scan(format!(
                "':' is expected after property '{}'",
                raw.trim()
            )));
        };

        let name = self.interpolate(name.trim())?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::scan("property name expected"));
        }
        let value = self.resolve_value(value)?;
        if value.is_empty() {
            return Err(Error::scan(format!("value expected for property '{}'", name)));
        }

        let property = Property::new(format!("{}{}", frame.prefix, name), value);
        if self.context.definitions.add_property(&frame.selectors, property) {
            self.check_selectors(&frame.selectors);
        }

        if self.scanner.at(';') {
            self.scanner.advance();
        }
        Ok(())
    }

    fn check_selectors(&self, selectors: &[String]) {
        for selector in selectors.iter().filter(|s| is_possibly_harmful(s)) {
            self.warn(&format!("performance: possibly harmful selector {}", selector));
        }
    }

    /// Interpolation, then variables, then function calls; whitespace is
    /// normalized outside strings.
    fn resolve_value(&mut self, raw: &str) -> Result<String> {
        let text = self.interpolate(raw)?;
        let text = if has_variables(&text) {
            apply_variables(&text, self.context.scopes)?
        } else {
            text
        };

        let applied = self.context.functions.apply(&text)?;
        for name in &applied.unknown {
            self.warn(&format!("unknown function: {}", name));
        }
        Ok(normalize_value(&applied.value))
    }

    /// Replace every `#{expression}` with its unquoted, resolved value.
    fn interpolate(&mut self, text: &str) -> Result<String> {
        if !text.contains("#{") {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("#{") {
            out.push_str(&rest[..start]);
            let inner = &rest[start + 2..];
            let end = interpolation_end(inner)
                .ok_or_else(|| Error::scan("'}' is expected: unterminated interpolation"))?;
            let value = self.resolve_value(&inner[..end])?;
            out.push_str(unquote(&value));
            rest = &inner[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Report a non-fatal problem at the cursor.
    fn warn(&self, message: &str) {
        let file = self.scanner.file().unwrap_or("<input>");
        self.context.logger.warning(&format!(
            "{}: {}, line: {}",
            file,
            message,
            self.scanner.line()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::logger::CollectingLogger;
    use crate::rules::Definition;
    use crate::scanner::{CommentFilter, StrSource};

    struct Harness {
        scopes: ScopeStack,
        mixins: MixinRegistry,
        definitions: DefinitionList,
        dependencies: Vec<PathBuf>,
        functions: FunctionEngine,
        loader: MemoryLoader,
        logger: CollectingLogger,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                scopes: ScopeStack::new(),
                mixins: MixinRegistry::new(),
                definitions: DefinitionList::new(),
                dependencies: Vec::new(),
                functions: FunctionEngine::default(),
                loader: MemoryLoader::new(),
                logger: CollectingLogger::new(),
            }
        }

        fn parse(&mut self, text: &str) -> Result<()> {
            let mut scanner = Scanner::new(
                CommentFilter::new(StrSource::new(text)),
                Some("test.scss".into()),
            );
            scanner.advance();
            let context = ParseContext {
                scopes: &mut self.scopes,
                mixins: &mut self.mixins,
                definitions: &mut self.definitions,
                dependencies: &mut self.dependencies,
                functions: &self.functions,
                loader: &self.loader,
                logger: &self.logger,
                debug_comments: false,
            };
            BlockParser::new(scanner, context).run()
        }

        fn rules(&self) -> Vec<(Vec<String>, Vec<(String, String)>)> {
            self.definitions
                .iter()
                .filter_map(|definition| match definition {
                    Definition::Rule {
                        selectors,
                        properties,
                    } => Some((
                        selectors.clone(),
                        properties
                            .iter()
                            .map(|p| (p.name.clone(), p.value.clone()))
                            .collect(),
                    )),
                    Definition::Comment(_) => None,
                })
                .collect()
        }
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn nested_selectors() {
        let mut h = Harness::new();
        h.parse("A { B { prop: v; } }").unwrap();
        assert_eq!(
            h.rules(),
            vec![(vec!["A B".to_string()], vec![pair("prop", "v")])]
        );
    }

    #[test]
    fn declaration_without_semicolon_or_space() {
        let mut h = Harness::new();
        h.parse(".a{color:red;margin:0}").unwrap();
        assert_eq!(
            h.rules(),
            vec![(
                vec![".a".to_string()],
                vec![pair("color", "red"), pair("margin", "0")]
            )]
        );
    }

    #[test]
    fn nested_property_prefixes_compose() {
        let mut h = Harness::new();
        h.parse(".a { font: { family: x; size: { adjust: 1; } } }")
            .unwrap();
        assert_eq!(
            h.rules()[0].1,
            vec![pair("font-family", "x"), pair("font-size-adjust", "1")]
        );
    }

    #[test]
    fn variables_are_block_scoped() {
        let mut h = Harness::new();
        let err = h
            .parse(".a { $inner: 1px; width: $inner; } .b { width: $inner; }")
            .unwrap_err();
        assert!(matches!(err.root(), Error::UndefinedVariable { name } if name == "inner"));
        assert_eq!(err.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn interpolation_in_selectors_and_names() {
        let mut h = Harness::new();
        h.parse("$side: left; $gap: 2; .m-#{$side} { margin-#{$side}: #{$gap}px; }")
            .unwrap();
        assert_eq!(
            h.rules(),
            vec![(vec![".m-left".to_string()], vec![pair("margin-left", "2px")])]
        );
    }

    #[test]
    fn unbalanced_blocks() {
        let mut h = Harness::new();
        assert!(matches!(
            h.parse(".a { x: y; } }").unwrap_err().root(),
            Error::UnbalancedBlock
        ));
        assert_eq!(h.scopes.depth(), 1);

        let mut open = Harness::new();
        let err = open.parse(".a { x: y;").unwrap_err();
        assert!(matches!(err.root(), Error::Scan { .. }));
        assert_eq!(open.scopes.depth(), 1);
    }

    #[test]
    fn property_outside_block_is_an_error() {
        let mut h = Harness::new();
        assert!(matches!(
            h.parse("color: red;").unwrap_err().root(),
            Error::Scan { .. }
        ));
    }

    #[test]
    fn harmful_selector_warns_once_per_rule() {
        let mut h = Harness::new();
        h.parse(".a * { x: 1; y: 2; }").unwrap();
        let warnings = h.logger.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0],
            "test.scss: performance: possibly harmful selector .a *, line: 1"
        );
    }

    #[test]
    fn unknown_function_warns() {
        let mut h = Harness::new();
        h.parse(".a { x: frob(1); }").unwrap();
        assert_eq!(h.rules()[0].1, vec![pair("x", "frob(1)")]);
        assert!(h.logger.warnings()[0].contains("unknown function: frob"));
    }
}
