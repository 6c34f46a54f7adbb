//! `@` directives.

use super::reader::{at_word, read_balanced, read_name, read_until, skip_word};
use super::BlockParser;
use crate::expr::evaluate_condition;
use crate::resolve::Mixin;
use crate::scanner::{CommentFilter, StrSource, is_name_char};
use crate::text::{split_top_level, unquote};
use crate::{Error, Result};

/// The `@if`/`@else` branch whose body gets spliced in.
struct Branch {
    body: String,
    file: Option<String>,
    line: u32,
}

impl BlockParser<'_> {
    pub(super) fn directive(&mut self) -> Result<()> {
        self.scanner.advance();
        let name = read_name(&mut self.scanner);
        self.scanner.skip_whitespace();

        let nested = !self.frames.is_empty();
        match name.as_str() {
            "mixin" if nested => Err(Error::scan("@mixin is only allowed at the top level")),
            "mixin" => self.define_mixin(),
            "include" if !nested => Err(Error::scan("@include is only allowed inside a block")),
            "include" => self.include_mixin(),
            "import" => self.import(),
            "if" => self.condition(),
            _ => Err(Error::UnsupportedDirective { name }),
        }
    }

    /// `@mixin name($a, $b) { body }`
    fn define_mixin(&mut self) -> Result<()> {
        let name = read_name(&mut self.scanner);
        if name.is_empty() {
            return Err(Error::scan("mixin name expected"));
        }
        self.scanner.skip_whitespace();

        let mut parameters = Vec::new();
        if self.scanner.at('(') {
            let list = read_balanced(&mut self.scanner, '(', ')')?;
            for parameter in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let parameter = parameter
                    .strip_prefix('$')
                    .filter(|p| !p.is_empty() && p.chars().all(is_name_char))
                    .ok_or_else(|| {
                        Error::scan(format!("invalid parameter '{}' of mixin {}", parameter, name))
                    })?;
                parameters.push(parameter.to_string());
            }
            self.scanner.skip_whitespace();
        }

        let file = self.scanner.file().map(str::to_string);
        let line = self.scanner.line();
        let body = read_balanced(&mut self.scanner, '{', '}')?;

        match self
            .context
            .mixins
            .define(Mixin::new(name, parameters, body, file, line))
        {
            Err(error) if !error.is_fatal() => {
                self.warn(&error.to_string());
                Ok(())
            }
            result => result,
        }
    }

    /// `@include name(args);`
    ///
    /// Opens a block for the mixin's parameters; the expansion text carries
    /// the `}` that closes it.
    fn include_mixin(&mut self) -> Result<()> {
        let name = read_name(&mut self.scanner);
        if name.is_empty() {
            return Err(Error::scan("mixin name expected"));
        }
        self.scanner.skip_whitespace();

        let list = if self.scanner.at('(') {
            let list = read_balanced(&mut self.scanner, '(', ')')?;
            self.scanner.skip_whitespace();
            Some(list)
        } else {
            None
        };
        match self.scanner.current() {
            Some(';') => {
                self.scanner.advance();
            }
            Some('}') | None => {}
            Some(_) => {
                return Err(Error::scan(format!("';' is expected after @include {}", name)));
            }
        }

        let frame = self.frames.last().cloned().unwrap_or_default();
        self.frames.push(frame);
        self.context.scopes.push_scope();

        let mut args = Vec::new();
        if let Some(list) = list {
            for arg in split_top_level(&list, ',').into_iter().map(str::trim) {
                if !arg.is_empty() {
                    args.push(self.resolve_value(arg)?);
                }
            }
        }

        self.context.logger.log(&format!("include mixin: {}", name));
        if self.context.debug_comments {
            self.context.definitions.add_comment(format!(
                "include mixin: {} args: {}",
                name,
                args.join(",")
            ));
        }

        let file = self.scanner.file().map(str::to_string);
        let expansion =
            self.context
                .mixins
                .include(&name, &args, file.as_deref(), self.context.scopes)?;
        self.scanner
            .insert(&expansion.text, expansion.file, expansion.line)
    }

    /// `@import "a", "b";`
    fn import(&mut self) -> Result<()> {
        let raw = read_until(&mut self.scanner, &[';', '}'])?;
        if self.scanner.at(';') {
            self.scanner.advance();
        }

        let raw = self.interpolate(&raw)?;
        let mut paths = Vec::new();
        for path in split_top_level(&raw, ',') {
            let path = unquote(path.trim()).trim();
            if path.is_empty() {
                return Err(Error::scan("empty @import path"));
            }
            paths.push(path.to_string());
        }

        // Spliced last-to-first so the files are read in the order listed.
        for path in paths.into_iter().rev() {
            self.import_file(path)?;
        }
        Ok(())
    }

    fn import_file(&mut self, path: String) -> Result<()> {
        self.context.logger.log(&format!("import: {}", path));
        if self.context.debug_comments {
            self.context
                .definitions
                .add_comment(format!("import: {}", path));
        }

        let content = self
            .context
            .loader
            .fetch(&path)
            .ok_or_else(|| Error::ImportNotFound { path: path.clone() })?;
        if let Some(located) = self.context.loader.locate(&path)
            && !self.context.dependencies.contains(&located)
        {
            self.context.dependencies.push(located);
        }

        self.scanner
            .insert_source(CommentFilter::new(StrSource::new(content)), Some(path))
    }

    /// `@if cond { } @else if cond { } @else { }`
    ///
    /// Conditions after the first true one are not evaluated.
    fn condition(&mut self) -> Result<()> {
        let mut chosen = self.branch(true)?;

        loop {
            self.scanner.skip_whitespace();
            if !at_word(&mut self.scanner, "@else") {
                break;
            }
            skip_word(&mut self.scanner, "@else");
            self.scanner.skip_whitespace();

            if at_word(&mut self.scanner, "if") {
                skip_word(&mut self.scanner, "if");
                let branch = self.branch(chosen.is_none())?;
                chosen = chosen.or(branch);
            } else {
                let file = self.scanner.file().map(str::to_string);
                let line = self.scanner.line();
                let body = read_balanced(&mut self.scanner, '{', '}')?;
                chosen = chosen.or(Some(Branch { body, file, line }));
                break;
            }
        }

        match chosen {
            Some(branch) if !branch.body.trim().is_empty() => {
                self.scanner.insert(&branch.body, branch.file, branch.line)
            }
            _ => Ok(()),
        }
    }

    /// Read `condition { body }`; the body is returned when `evaluate` is set
    /// and the condition holds.
    fn branch(&mut self, evaluate: bool) -> Result<Option<Branch>> {
        let condition = read_until(&mut self.scanner, &['{'])?;
        if !self.scanner.at('{') {
            return Err(Error::scan("'{' is expected after condition"));
        }

        let holds = evaluate && {
            let text = self.resolve_value(condition.trim())?;
            evaluate_condition(&text)?
        };

        let file = self.scanner.file().map(str::to_string);
        let line = self.scanner.line();
        let body = read_balanced(&mut self.scanner, '{', '}')?;
        Ok(holds.then_some(Branch { body, file, line }))
    }
}
