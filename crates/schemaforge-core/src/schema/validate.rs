//! Global validation.

use super::Schema;
use crate::components::{Component, Field};
use crate::SchemaError;
use std::collections::BTreeMap;

impl Schema {
    /// Check the schema as it currently stands.
    ///
    /// Global checks come first: names must be unique across types,
    /// models, enums, interfaces, unions, scalars and the root types, and
    /// the schema must have at least one type and at least one query.
    /// Components are then validated in turn; the first failure is
    /// returned as is.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let duplicates = self.duplicate_names();
        if !duplicates.is_empty() {
            return Err(SchemaError::DuplicateTypeName(duplicates));
        }

        if self.types.is_empty() && self.models.is_empty() {
            return Err(SchemaError::EmptySchema("no types are defined".to_string()));
        }
        if self.query_type.field_count() == 0 {
            return Err(SchemaError::EmptySchema(format!(
                "the {} type has no fields",
                self.query_type.name()
            )));
        }

        self.types.values().try_for_each(Component::validate)?;
        self.models.values().try_for_each(Component::validate)?;
        self.query_type.fields().try_for_each(Field::validate)?;
        self.mutation_type.fields().try_for_each(Field::validate)?;
        self.enums.values().try_for_each(Component::validate)?;
        self.interfaces.values().try_for_each(Component::validate)?;
        self.unions.values().try_for_each(Component::validate)?;
        self.scalars.values().try_for_each(Component::validate)?;
        Ok(())
    }

    /// Names used more than once across the type namespaces, sorted.
    fn duplicate_names(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let names = self
            .types
            .keys()
            .chain(self.models.keys())
            .chain(self.enums.keys())
            .chain(self.interfaces.keys())
            .chain(self.unions.keys())
            .chain(self.scalars.keys())
            .map(String::as_str);
        for name in names {
            *counts.entry(name).or_default() += 1;
        }
        *counts.entry(self.query_type.name()).or_default() += 1;
        if self.mutation_type.field_count() > 0 {
            *counts.entry(self.mutation_type.name()).or_default() += 1;
        }

        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}
