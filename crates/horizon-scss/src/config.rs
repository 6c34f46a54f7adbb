//! Compiler configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::functions::{CustomFunction, FunctionEngine, UnknownFunctions};

/// Options that change how a stylesheet is compiled and rendered.
#[derive(Clone)]
pub struct CompilerConfig {
    /// Fail the compile on a call to an unknown function.
    pub unknown_function_error: bool,

    /// Warn about calls to unknown functions.
    pub unknown_function_warning: bool,

    /// Keep calls to unknown functions in the output. When false only the
    /// call's resolved arguments are kept.
    pub keep_unknown_function: bool,

    /// Marker selector for debug-only rules.
    pub debug_selector: String,

    /// Keep debug rules, with the marker removed from their selectors,
    /// instead of dropping them.
    pub keep_debug_style: bool,

    /// Emit `/* ... */` comments naming sources, imports and included
    /// mixins.
    pub debug_comments: bool,

    /// Host-registered functions. They take precedence over builtins.
    pub functions: HashMap<String, CustomFunction>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            unknown_function_error: false,
            unknown_function_warning: true,
            keep_unknown_function: true,
            debug_selector: "#debug".to_string(),
            keep_debug_style: false,
            debug_comments: false,
            functions: HashMap::new(),
        }
    }
}

impl fmt::Debug for CompilerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("CompilerConfig")
            .field("unknown_function_error", &self.unknown_function_error)
            .field("unknown_function_warning", &self.unknown_function_warning)
            .field("keep_unknown_function", &self.keep_unknown_function)
            .field("debug_selector", &self.debug_selector)
            .field("keep_debug_style", &self.keep_debug_style)
            .field("debug_comments", &self.debug_comments)
            .field("functions", &functions)
            .finish()
    }
}

impl CompilerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether unknown functions are fatal.
    pub fn unknown_function_error(mut self, error: bool) -> Self {
        self.unknown_function_error = error;
        self
    }

    /// Set whether unknown functions are warned about.
    pub fn unknown_function_warning(mut self, warn: bool) -> Self {
        self.unknown_function_warning = warn;
        self
    }

    /// Set whether unknown function calls are kept in the output.
    pub fn keep_unknown_function(mut self, keep: bool) -> Self {
        self.keep_unknown_function = keep;
        self
    }

    /// Set the debug marker selector.
    pub fn debug_selector(mut self, selector: impl Into<String>) -> Self {
        self.debug_selector = selector.into();
        self
    }

    /// Set whether debug rules are kept with the marker stripped.
    pub fn keep_debug_style(mut self, keep: bool) -> Self {
        self.keep_debug_style = keep;
        self
    }

    /// Set whether debug comments are emitted.
    pub fn debug_comments(mut self, enabled: bool) -> Self {
        self.debug_comments = enabled;
        self
    }

    /// Register a custom function.
    pub fn function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[String]) -> Result<String> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// The unknown-function policy described by the flags.
    pub fn unknown_functions(&self) -> UnknownFunctions {
        UnknownFunctions {
            error: self.unknown_function_error,
            warn: self.unknown_function_warning,
            keep: self.keep_unknown_function,
        }
    }

    /// Build a function engine for this configuration.
    pub fn function_engine(&self) -> FunctionEngine {
        FunctionEngine::new(self.functions.clone(), self.unknown_functions())
    }
}
