//! Bounded expression evaluation for `@if` conditions and unit arithmetic.
//!
//! Expressions are tokenized with `cssparser` and evaluated by a small
//! precedence-climbing interpreter. Only literals and the comparison, boolean
//! and arithmetic operators are understood; nothing can call out of the
//! evaluator.

mod evaluator;

pub use evaluator::{Expression, Value, evaluate, evaluate_condition, evaluate_number};

/// Format a number the way it should appear in CSS output: integers without
/// a fractional part, everything else in its shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
