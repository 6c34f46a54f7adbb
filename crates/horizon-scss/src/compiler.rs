//! The compiler facade: owns the compile state and its collaborators.

use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::config::CompilerConfig;
use crate::diagnostics::{self, Diagnostic};
use crate::functions::FunctionEngine;
use crate::loader::{Loader, NullLoader};
use crate::logger::{Logger, TracingLogger};
use crate::parser::{BlockParser, ParseContext};
use crate::resolve::{MixinRegistry, ScopeStack};
use crate::rules::{Definition, DefinitionList, Serializer};
use crate::scanner::{CharSource, CommentFilter, ReaderSource, Scanner, StrSource};
use crate::{Error, Result};

/// Compiles stylesheets into CSS.
///
/// Inputs passed to [`process`](Self::process) share global variables and
/// mixins, so a library file can be processed before the files using it.
/// [`render`](Self::render) turns everything processed so far into CSS.
///
/// # Example
///
/// ```
/// use horizon_scss::Compiler;
///
/// let mut compiler = Compiler::default();
/// compiler.process("$pad: 4px; .a { .b { padding: $pad; } }", None)?;
/// assert_eq!(compiler.render(), ".a .b {\n\tpadding: 4px;\n}\n");
/// # Ok::<(), horizon_scss::Error>(())
/// ```
pub struct Compiler {
    config: CompilerConfig,
    functions: FunctionEngine,
    loader: Box<dyn Loader>,
    logger: Box<dyn Logger>,
    scopes: ScopeStack,
    mixins: MixinRegistry,
    definitions: DefinitionList,
    dependencies: Vec<PathBuf>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.config)
            .field("mixins", &self.mixins.len())
            .field("definitions", &self.definitions.len())
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl Compiler {
    /// Create a compiler. Imports fail until a loader is set, and messages
    /// go to `tracing`.
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            functions: config.function_engine(),
            config,
            loader: Box::new(NullLoader),
            logger: Box::new(TracingLogger::new()),
            scopes: ScopeStack::new(),
            mixins: MixinRegistry::new(),
            definitions: DefinitionList::new(),
            dependencies: Vec::new(),
        }
    }

    /// Use `loader` for `@import`.
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Report messages to `logger`.
    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// The logger in use.
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Compile `source` into the pending definitions.
    ///
    /// `file_name` is used in messages and to track where mixins are used.
    /// A failure is reported to the logger as an error and returned.
    pub fn process(&mut self, source: &str, file_name: Option<&str>) -> Result<()> {
        self.process_source(StrSource::new(source), file_name)
    }

    /// Compile text read from `reader`.
    pub fn process_reader<R>(&mut self, reader: R, file_name: Option<&str>) -> Result<()>
    where
        R: BufRead + 'static,
    {
        self.process_source(ReaderSource::new(reader), file_name)
    }

    /// Read and compile the file at `path`.
    pub fn process_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            let error = Error::io(path, e);
            self.logger.error(&error.to_string());
            error
        })?;
        let name = path.display().to_string();
        self.process(&content, Some(&name))
    }

    fn process_source(
        &mut self,
        source: impl CharSource + 'static,
        file_name: Option<&str>,
    ) -> Result<()> {
        tracing::debug!(target: "horizon_scss", file = ?file_name, "processing stylesheet");

        if self.config.debug_comments
            && let Some(name) = file_name
        {
            self.definitions.add_comment(format!("source: {}", name));
        }

        let mut scanner = Scanner::new(CommentFilter::new(source), file_name.map(str::to_string));
        scanner.advance();

        let context = ParseContext {
            scopes: &mut self.scopes,
            mixins: &mut self.mixins,
            definitions: &mut self.definitions,
            dependencies: &mut self.dependencies,
            functions: &self.functions,
            loader: self.loader.as_ref(),
            logger: self.logger.as_ref(),
            debug_comments: self.config.debug_comments,
        };

        let result = BlockParser::new(scanner, context).run();
        if let Err(error) = &result {
            self.logger.error(&error.to_string());
        }
        result
    }

    /// Definitions compiled so far and not yet rendered.
    pub fn definitions(&self) -> &[Definition] {
        self.definitions.as_slice()
    }

    /// Render the pending definitions as CSS and clear them.
    ///
    /// Variables and mixins stay defined.
    pub fn render(&mut self) -> String {
        Serializer::new(&self.config).render(&self.definitions.take())
    }

    /// Check mixin and variable usage, reporting each finding as a warning.
    pub fn run_diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = diagnostics::check(&self.mixins, &self.scopes);
        for diagnostic in &diagnostics {
            self.logger.warning(&diagnostic.to_string());
        }
        diagnostics
    }

    /// Files pulled in through `@import`, as located by the loader.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.dependencies
    }

    /// Variables defined in the global scope.
    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// Mixins defined so far.
    pub fn mixins(&self) -> &MixinRegistry {
        &self.mixins
    }

    /// Forget all variables, mixins, pending definitions and dependencies.
    pub fn reset(&mut self) {
        self.scopes = ScopeStack::new();
        self.mixins = MixinRegistry::new();
        self.definitions = DefinitionList::new();
        self.dependencies.clear();
    }
}

/// Compile a single stylesheet with the default configuration.
pub fn compile(source: &str) -> Result<String> {
    let mut compiler = Compiler::default();
    compiler.process(source, None)?;
    Ok(compiler.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{CollectingLogger, LogLevel};

    #[test]
    fn render_clears_definitions() {
        let mut compiler = Compiler::default();
        compiler.process(".a { x: 1; }", None).unwrap();
        assert_eq!(compiler.definitions().len(), 1);
        assert_eq!(compiler.render(), ".a {\n\tx: 1;\n}\n");
        assert!(compiler.definitions().is_empty());
        assert_eq!(compiler.render(), "");
    }

    #[test]
    fn globals_survive_between_inputs() {
        let mut compiler = Compiler::default();
        compiler
            .process("$c: red; @mixin m { color: $c; }", Some("lib.scss"))
            .unwrap();
        compiler.process(".a { @include m; }", Some("app.scss")).unwrap();
        assert_eq!(compiler.render(), ".a {\n\tcolor: red;\n}\n");
    }

    #[test]
    fn errors_go_to_the_logger() {
        let logger = CollectingLogger::new();
        let mut compiler = Compiler::default().with_logger(logger.clone());
        let err = compiler.process(".a { x: $nope; }", Some("bad.scss")).unwrap_err();

        let location = err.location().unwrap();
        assert_eq!(location.file.as_deref(), Some("bad.scss"));
        assert_eq!(compiler.logger().errors().len(), 1);
        assert_eq!(logger.messages(LogLevel::Error).len(), 1);
        assert!(logger.messages(LogLevel::Error)[0].contains("undefined variable: '$nope'"));
    }

    #[test]
    fn failed_input_does_not_leave_scopes_open() {
        let mut compiler = Compiler::default();
        assert!(compiler.process(".a { .b { x: $nope; } }", None).is_err());
        assert_eq!(compiler.scopes().depth(), 1);
        compiler.process("$ok: 1; .c { y: $ok; }", None).unwrap();
    }

    #[test]
    fn source_comment_with_debug_comments() {
        let config = CompilerConfig::new().debug_comments(true);
        let mut compiler = Compiler::new(config);
        compiler.process(".a { x: 1; }", Some("main.scss")).unwrap();
        assert_eq!(
            compiler.render(),
            "/* source: main.scss */\n.a {\n\tx: 1;\n}\n"
        );
    }

    #[test]
    fn process_reader_reads_lines() {
        let mut compiler = Compiler::default();
        let input = std::io::Cursor::new(".a {\n  x: 1;\n}\n".as_bytes().to_vec());
        compiler.process_reader(input, None).unwrap();
        assert_eq!(compiler.render(), ".a {\n\tx: 1;\n}\n");
    }

    #[test]
    fn process_file_reports_io_errors() {
        let mut compiler = Compiler::default();
        let err = compiler.process_file("/definitely/not/here.scss").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn diagnostics_are_warned() {
        let logger = CollectingLogger::new();
        let mut compiler = Compiler::default().with_logger(logger.clone());
        compiler.process("$unused: 1;", Some("a.scss")).unwrap();
        let found = compiler.run_diagnostics();
        assert_eq!(
            found,
            vec![Diagnostic::UnusedVariable {
                name: "unused".into()
            }]
        );
        assert_eq!(logger.warnings(), vec!["Unused variable: unused".to_string()]);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut compiler = Compiler::default();
        compiler.process("$a: 1; @mixin m { x: 1; } .a { y: 1; }", None).unwrap();
        compiler.reset();
        assert!(compiler.mixins().is_empty());
        assert!(compiler.definitions().is_empty());
        assert!(compiler.scopes().get("a").is_none());
    }
}
