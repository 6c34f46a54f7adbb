//! Builtin, native and custom functions in property values.

mod builtin;
mod engine;

pub use builtin::{Builtin, builtin, is_native};
pub use engine::{Applied, CustomFunction, FunctionEngine, UnknownFunctions, split_args};
