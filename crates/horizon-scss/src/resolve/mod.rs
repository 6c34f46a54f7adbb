//! Variable scopes, `$name` substitution and mixins.

mod mixin;
mod scope;
mod variables;

pub use mixin::{Expansion, Mixin, MixinRegistry};
pub use scope::{CellId, ScopeStack, VariableCell};
pub use variables::{MAX_PASSES, apply_variables, has_variables};
