//! Error types for the stylesheet compiler.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling a stylesheet.
///
/// Most variants are raised by a single component without any knowledge of
/// where in the source they happened. The block parser wraps them in
/// [`Error::Located`] before they leave the compiler.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required character was missing, or a block/string was left open.
    #[error("{message}")]
    Scan { message: String },

    /// A `$name` reference with no visible binding.
    #[error("undefined variable: '${name}'")]
    UndefinedVariable { name: String },

    /// More than one `&` survived parent substitution.
    #[error("invalid usage of & in selector '{selector}'")]
    InvalidAmpersandUsage { selector: String },

    /// `@include` argument count differs from the mixin's parameter count.
    #[error("mixin '{mixin}' expects {expected} argument(s), {found} given")]
    ArityMismatch {
        mixin: String,
        expected: usize,
        found: usize,
    },

    /// A `}` with no open block.
    #[error("unexpected '}}': no block is open")]
    UnbalancedBlock,

    /// A value that is neither a hex literal nor a known color name.
    #[error("invalid color value: {value}")]
    InvalidColor { value: String },

    /// A condition or arithmetic expression could not be evaluated.
    #[error("cannot evaluate expression '{expression}': {message}")]
    Expression { expression: String, message: String },

    /// Resolution or expansion did not converge.
    #[error("infinite loop detected while resolving {context}")]
    InfiniteLoop { context: String },

    /// A mixin with this name was already defined. Non-fatal.
    #[error("duplicate mixin definition: {name}")]
    DuplicateMixin { name: String },

    /// `@include` of a mixin that was never defined.
    #[error("can not include undefined mixin: {name}")]
    UndefinedMixin { name: String },

    /// A call to a function that is neither builtin nor native CSS.
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    /// A builtin function received arguments it cannot work with.
    #[error("invalid arguments for {function}(): {message}")]
    InvalidArguments { function: String, message: String },

    /// An `@` directive the compiler does not implement.
    #[error("unsupported directive: @{name}")]
    UnsupportedDirective { name: String },

    /// The loader could not provide an `@import`ed stylesheet.
    #[error("import not found: {path}")]
    ImportNotFound { path: String },

    /// File I/O error.
    #[error("Failed to read stylesheet '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hot-reload error.
    #[cfg(feature = "hot-reload")]
    #[error("Hot-reload error: {0}")]
    HotReload(String),

    /// Any of the above, pinned to a position in the source.
    #[error("{source}\n  --> {location}")]
    Located {
        location: Box<SourceLocation>,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a scan error.
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    /// Create an undefined-variable error.
    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into() }
    }

    /// Create an expression error.
    pub fn expression(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Expression {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-color error.
    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor {
            value: value.into(),
        }
    }

    /// Create an invalid-arguments error.
    pub fn invalid_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create an infinite-loop error.
    pub fn infinite_loop(context: impl Into<String>) -> Self {
        Self::InfiniteLoop {
            context: context.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach a source location. Already located errors are returned unchanged.
    pub fn at(self, location: SourceLocation) -> Self {
        match self {
            located @ Self::Located { .. } => located,
            other => Self::Located {
                location: Box::new(location),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, with any location wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Self::Located { source, .. } => source.root(),
            other => other,
        }
    }

    /// The source location, if one was attached.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Located { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Whether this error aborts a compile.
    ///
    /// Duplicate mixins are only reported as warnings.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.root(), Self::DuplicateMixin { .. })
    }
}

/// Where in the input an error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Name of the file being scanned, if known.
    pub file: Option<String>,
    /// Line number (1-indexed).
    pub line: u32,
    /// Number of characters consumed so far.
    pub offset: usize,
    /// Text immediately before the cursor.
    pub before: String,
    /// Text immediately after the cursor.
    pub after: String,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}: ", file)?;
        }
        write!(
            f,
            "line {}, position {}\n  prev: {}\n  next: {}",
            self.line, self.offset, self.before, self.after
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> SourceLocation {
        SourceLocation {
            file: Some("main.scss".into()),
            line: 3,
            offset: 42,
            before: ".a { color: ".into(),
            after: "$nope; }".into(),
        }
    }

    #[test]
    fn located_error_reports_root() {
        let err = Error::undefined_variable("nope").at(location());

        assert!(matches!(err.root(), Error::UndefinedVariable { name } if name == "nope"));
        assert_eq!(err.location().map(|l| l.line), Some(3));
    }

    #[test]
    fn located_error_message_has_context() {
        let message = Error::undefined_variable("nope").at(location()).to_string();

        assert!(message.contains("undefined variable: '$nope'"));
        assert!(message.contains("main.scss: line 3, position 42"));
        assert!(message.contains("next: $nope; }"));
    }

    #[test]
    fn location_is_attached_once() {
        let inner = location();
        let mut outer = location();
        outer.line = 10;

        let err = Error::UnbalancedBlock.at(inner).at(outer);
        assert_eq!(err.location().map(|l| l.line), Some(3));
    }

    #[test]
    fn duplicate_mixin_is_not_fatal() {
        assert!(!Error::DuplicateMixin { name: "a".into() }.is_fatal());
        assert!(Error::UnbalancedBlock.is_fatal());
    }
}
