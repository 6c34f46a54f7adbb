//! Nested variable scopes.

use std::collections::HashMap;

use crate::{Error, Result};

/// Index of a variable cell in a [`ScopeStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(usize);

/// One variable binding and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableCell {
    /// Variable name without the `$`.
    pub name: String,
    /// Resolved value text.
    pub value: String,
    /// How many times the variable was read.
    pub use_count: u32,
    /// Whether the binding was created by a `!default` assignment.
    pub from_default: bool,
}

/// Variable scopes for nested blocks.
///
/// All cells live in one arena; a frame only maps names to cell ids. Lookups
/// walk frames from the innermost outwards, so a block sees every binding of
/// its enclosing blocks while its own definitions shadow them and disappear
/// when the block closes. Use counts live on the cells, so reading a variable
/// from a nested block counts against the binding that owns the value.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    cells: Vec<VariableCell>,
    frames: Vec<HashMap<String, CellId>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Create a stack holding only the global scope.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            frames: vec![HashMap::new()],
        }
    }

    /// Number of open scopes, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Enter a nested block.
    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Leave the innermost block.
    pub fn pop_scope(&mut self) -> Result<()> {
        if self.frames.len() <= 1 {
            return Err(Error::UnbalancedBlock);
        }
        self.frames.pop();
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<CellId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    /// Whether `name` is visible from the current scope.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Bind `name` in the current scope.
    ///
    /// A `!default` assignment (`not_default`) is skipped when the name is
    /// already bound, unless that binding itself came from a `!default`
    /// assignment. Returns whether the binding took effect.
    pub fn define(&mut self, name: &str, value: impl Into<String>, not_default: bool) -> bool {
        if not_default
            && let Some(id) = self.lookup(name)
            && !self.cells[id.0].from_default
        {
            tracing::debug!(target: "horizon_scss::scope", "keeping ${} (!default)", name);
            return false;
        }

        let id = CellId(self.cells.len());
        self.cells.push(VariableCell {
            name: name.to_string(),
            value: value.into(),
            use_count: 0,
            from_default: not_default,
        });
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), id);
        }
        true
    }

    /// Read a variable, counting the use.
    pub fn resolve(&mut self, name: &str) -> Result<String> {
        let id = self
            .lookup(name)
            .ok_or_else(|| Error::undefined_variable(name))?;
        let cell = &mut self.cells[id.0];
        cell.use_count += 1;
        Ok(cell.value.clone())
    }

    /// Read a variable without counting the use.
    pub fn get(&self, name: &str) -> Option<&VariableCell> {
        self.lookup(name).map(|id| &self.cells[id.0])
    }

    /// Global bindings that were never read, in definition order.
    pub fn unused(&self) -> Vec<&VariableCell> {
        let Some(global) = self.frames.first() else {
            return Vec::new();
        };
        let mut ids: Vec<CellId> = global.values().copied().collect();
        ids.sort_by_key(|id| id.0);
        ids.into_iter()
            .map(|id| &self.cells[id.0])
            .filter(|cell| cell.use_count == 0)
            .collect()
    }
}
