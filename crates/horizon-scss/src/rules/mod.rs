//! The compiled rule list and its CSS rendering.

mod definition;
mod serializer;

pub use definition::{Definition, DefinitionList, Property};
pub use serializer::Serializer;
