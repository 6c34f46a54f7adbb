//! SCSS-like stylesheet compiler for Horizon Lattice.
//!
//! This crate compiles a nested, variable- and mixin-based stylesheet dialect
//! into flat CSS, featuring:
//!
//! - **Nesting**: Nested selectors with `&` parent references and nested
//!   property blocks (`font: { family: ...; }`)
//! - **Variables**: Block-scoped `$variables` with `!default` and `#{}` interpolation
//! - **Mixins**: `@mixin`/`@include` with parameters, expanded in place
//! - **Conditionals**: `@if`/`@else if`/`@else` over a small, safe expression language
//! - **Functions**: Color and rounding builtins plus host-registered functions
//! - **Imports**: `@import` through a pluggable [`Loader`]
//! - **Hot Reload**: Recompile when a source or one of its imports changes
//!
//! # Example
//!
//! ```
//! use horizon_scss::prelude::*;
//!
//! let loader = MemoryLoader::new().with_file("_colors.scss", "$blue: #3bbfce;");
//! let mut compiler = Compiler::new(CompilerConfig::default()).with_loader(loader);
//!
//! compiler.process("@import 'colors';\n.a { color: $blue; }", Some("app.scss"))?;
//! assert_eq!(compiler.render(), ".a {\n\tcolor: #3bbfce;\n}\n");
//! # Ok::<(), horizon_scss::Error>(())
//! ```

pub mod scanner;
pub mod color;
pub mod expr;
pub mod functions;
pub mod resolve;
pub mod selector;
pub mod rules;
pub mod parser;
pub mod config;
pub mod logger;
pub mod loader;
pub mod diagnostics;
pub mod compiler;

#[cfg(feature = "hot-reload")]
pub mod hot_reload;

mod error;
mod text;

pub use compiler::{Compiler, compile};
pub use config::CompilerConfig;
pub use error::{Error, Result, SourceLocation};
pub use loader::Loader;
pub use logger::Logger;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::compiler::{Compiler, compile};
    pub use crate::config::CompilerConfig;
    pub use crate::color::Color;
    pub use crate::diagnostics::Diagnostic;
    pub use crate::error::{Error, Result, SourceLocation};
    pub use crate::functions::UnknownFunctions;
    pub use crate::loader::{FileLoader, Loader, MemoryLoader, NullLoader};
    pub use crate::logger::{CollectingLogger, LogLevel, Logger, TracingLogger};
    pub use crate::rules::{Definition, Property};

    #[cfg(feature = "hot-reload")]
    pub use crate::hot_reload::SourceWatcher;
}
