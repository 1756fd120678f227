//! # Schema Graph
//!
//! The frozen result of a build. Models are folded into `types` as plain
//! object types, together with the root `Query` type and (when it has
//! fields) the root `Mutation` type.
//!
//! This is what storage gateways persist and what `export` renders.

use crate::components::{Component, EnumType, InterfaceType, ObjectType, ScalarType, UnionType};
use crate::primitives::{MUTATION_TYPE_NAME, QUERY_TYPE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A compiled schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    /// Schema key the graph was built for.
    pub key: String,
    pub types: BTreeMap<String, ObjectType>,
    pub interfaces: BTreeMap<String, InterfaceType>,
    pub unions: BTreeMap<String, UnionType>,
    pub enums: BTreeMap<String, EnumType>,
    pub scalars: BTreeMap<String, ScalarType>,
    /// Domain class → type name, for every model.
    pub type_mapping: BTreeMap<String, String>,
}

impl SchemaGraph {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Insert an object type, replacing one of the same name.
    pub fn insert_type(&mut self, ty: ObjectType) {
        self.types.insert(ty.name().to_string(), ty);
    }

    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    #[must_use]
    pub fn query_type(&self) -> Option<&ObjectType> {
        self.types.get(QUERY_TYPE_NAME)
    }

    #[must_use]
    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.types.get(MUTATION_TYPE_NAME)
    }

    /// Type name a domain class was exposed under.
    #[must_use]
    pub fn type_for_class(&self, class: &str) -> Option<&str> {
        self.type_mapping.get(class).map(String::as_str)
    }

    /// Number of named types across every namespace.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
            + self.interfaces.len()
            + self.unions.len()
            + self.enums.len()
            + self.scalars.len()
    }

    /// Number of root query fields.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.query_type().map_or(0, ObjectType::field_count)
    }

    /// Number of root mutation fields.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutation_type().map_or(0, ObjectType::field_count)
    }
}
