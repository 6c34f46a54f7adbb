//! Mixin definitions and expansion.

use std::collections::HashMap;

use super::ScopeStack;
use crate::{Error, Result};

/// A `@mixin` definition with its usage bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mixin {
    /// Mixin name.
    pub name: String,
    /// Parameter names without the `$`, in declaration order.
    pub parameters: Vec<String>,
    /// Unexpanded body text, without the surrounding braces.
    pub body: String,
    /// File the mixin was defined in.
    pub file: Option<String>,
    /// Line of the body's opening brace.
    pub line: u32,
    /// Number of `@include`s so far.
    pub used_count: u32,
    /// File of the first `@include`.
    pub first_used_file: Option<String>,
    /// Cleared once the mixin is included from a second file that is not
    /// its own.
    pub used_in_one_file: bool,
}

impl Mixin {
    /// Create an unused mixin.
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<String>,
        body: impl Into<String>,
        file: Option<String>,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            body: body.into(),
            file,
            line,
            used_count: 0,
            first_used_file: None,
            used_in_one_file: true,
        }
    }
}

/// Text to splice into the input for one `@include`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The mixin body followed by the `}` that closes the include's block.
    pub text: String,
    /// File the body came from.
    pub file: Option<String>,
    /// Line the body starts on.
    pub line: u32,
}

/// All mixins defined during a compile, in definition order.
#[derive(Debug, Clone, Default)]
pub struct MixinRegistry {
    mixins: Vec<Mixin>,
    index: HashMap<String, usize>,
}

impl MixinRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mixin.
    ///
    /// A mixin with the same name is replaced, and `DuplicateMixin` is
    /// returned so the caller can warn about it. The new definition is
    /// registered either way.
    pub fn define(&mut self, mixin: Mixin) -> Result<()> {
        tracing::debug!(target: "horizon_scss::mixin", "mixin: {}", mixin.name);

        if let Some(&slot) = self.index.get(&mixin.name) {
            let name = mixin.name.clone();
            self.mixins[slot] = mixin;
            return Err(Error::DuplicateMixin { name });
        }

        self.index.insert(mixin.name.clone(), self.mixins.len());
        self.mixins.push(mixin);
        Ok(())
    }

    /// Look up a mixin by name.
    pub fn get(&self, name: &str) -> Option<&Mixin> {
        self.index.get(name).map(|&slot| &self.mixins[slot])
    }

    /// Number of registered mixins.
    pub fn len(&self) -> usize {
        self.mixins.len()
    }

    /// Whether no mixin was registered.
    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }

    /// Iterate over mixins in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Mixin> {
        self.mixins.iter()
    }

    /// Expand `@include name(args)` from `current_file`.
    ///
    /// Arguments are bound as variables in the innermost scope of `scopes`,
    /// which the caller opens for the include. The returned text ends with
    /// the `}` that closes that scope again.
    pub fn include(
        &mut self,
        name: &str,
        args: &[String],
        current_file: Option<&str>,
        scopes: &mut ScopeStack,
    ) -> Result<Expansion> {
        let slot = *self
            .index
            .get(name)
            .ok_or_else(|| Error::UndefinedMixin {
                name: name.to_string(),
            })?;
        let mixin = &mut self.mixins[slot];

        if args.len() != mixin.parameters.len() {
            return Err(Error::ArityMismatch {
                mixin: name.to_string(),
                expected: mixin.parameters.len(),
                found: args.len(),
            });
        }

        tracing::debug!(target: "horizon_scss::mixin", "include mixin: {}", name);

        let current_file = current_file.map(str::to_string);
        if mixin.used_count == 0 {
            mixin.first_used_file = current_file;
        } else if mixin.first_used_file != current_file && mixin.file != current_file {
            mixin.used_in_one_file = false;
        }
        mixin.used_count += 1;

        for (parameter, value) in mixin.parameters.iter().zip(args) {
            scopes.define(parameter, value.as_str(), false);
        }

        Ok(Expansion {
            text: format!("{}}}", mixin.body),
            file: mixin.file.clone(),
            line: mixin.line,
        })
    }
}
