//! Compiled rules in source order.

/// One `name: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    /// Create a property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An entry of the compiled output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// A rule: selectors and their declarations, in source order.
    Rule {
        selectors: Vec<String>,
        properties: Vec<Property>,
    },
    /// A debug comment.
    Comment(String),
}

impl Definition {
    /// Selectors of a rule; empty for comments.
    pub fn selectors(&self) -> &[String] {
        match self {
            Definition::Rule { selectors, .. } => selectors,
            Definition::Comment(_) => &[],
        }
    }

    /// Declarations of a rule; empty for comments.
    pub fn properties(&self) -> &[Property] {
        match self {
            Definition::Rule { properties, .. } => properties,
            Definition::Comment(_) => &[],
        }
    }
}

/// Ordered list of definitions with adjacent-rule merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionList {
    definitions: Vec<Definition>,
}

impl DefinitionList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration for `selectors`.
    ///
    /// If the last definition is a rule with element-wise equal selectors
    /// the declaration joins it; otherwise a new rule is started. Returns
    /// whether a new rule was started.
    pub fn add_property(&mut self, selectors: &[String], property: Property) -> bool {
        if let Some(Definition::Rule {
            selectors: last,
            properties,
        }) = self.definitions.last_mut()
            && last.as_slice() == selectors
        {
            properties.push(property);
            return false;
        }

        self.definitions.push(Definition::Rule {
            selectors: selectors.to_vec(),
            properties: vec![property],
        });
        true
    }

    /// Add a debug comment. Comments never merge with rules.
    pub fn add_comment(&mut self, text: impl Into<String>) {
        self.definitions.push(Definition::Comment(text.into()));
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterate in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Definition> {
        self.definitions.iter()
    }

    /// The definitions as a slice.
    pub fn as_slice(&self) -> &[Definition] {
        &self.definitions
    }

    /// Remove and return every definition.
    pub fn take(&mut self) -> Vec<Definition> {
        std::mem::take(&mut self.definitions)
    }
}

impl<'a> IntoIterator for &'a DefinitionList {
    type Item = &'a Definition;
    type IntoIter = std::slice::Iter<'a, Definition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
