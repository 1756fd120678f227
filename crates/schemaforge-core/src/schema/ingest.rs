//! Config ingestion.

use super::Schema;
use crate::components::{
    EnumType, Field, InterfaceType, ModelType, ObjectType, ScalarType, UnionType,
};
use crate::config::{expect_map, expect_string_list, join, reject_unknown_keys};
use crate::primitives::TOP_LEVEL_KEYS;
use crate::SchemaError;
use serde_json::Value;

/// Path reported for errors on the config root.
const ROOT_PATH: &str = "<root>";

impl Schema {
    /// Ingest one config fragment.
    ///
    /// Sections are processed in a fixed order regardless of their order in
    /// the fragment: `config`, `types`, `queries`, `mutations`,
    /// `interfaces`, `unions`, `models`, `enums`, `scalars`, then `execute`.
    /// Every definition is merged into what earlier fragments contributed.
    pub fn apply_config(&mut self, config: &Value) -> Result<(), SchemaError> {
        let map = expect_map(config, ROOT_PATH)?;
        reject_unknown_keys(map, &TOP_LEVEL_KEYS, ROOT_PATH)?;

        for key in TOP_LEVEL_KEYS {
            let Some(section) = map.get(key) else {
                continue;
            };
            if section.is_null() {
                continue;
            }
            tracing::trace!(key = %self.key, section = key, "ingesting config section");
            match key {
                "config" => self.context.apply(expect_map(section, key)?)?,
                "types" => {
                    for (name, def) in expect_map(section, key)? {
                        let ty = ObjectType::from_config(name, def, &join(key, name), self.context.plugins())?;
                        self.add_type(ty)?;
                    }
                }
                "queries" => {
                    for (name, def) in expect_map(section, key)? {
                        let query = Field::from_config(name, def, &join(key, name), self.context.plugins())?;
                        self.add_query(query)?;
                    }
                }
                "mutations" => {
                    for (name, def) in expect_map(section, key)? {
                        let mutation = Field::from_config(name, def, &join(key, name), self.context.plugins())?;
                        self.add_mutation(mutation)?;
                    }
                }
                "interfaces" => {
                    for (name, def) in expect_map(section, key)? {
                        let interface =
                            InterfaceType::from_config(name, def, &join(key, name), self.context.plugins())?;
                        self.add_interface(interface)?;
                    }
                }
                "unions" => {
                    for (name, def) in expect_map(section, key)? {
                        let union = UnionType::from_config(name, def, &join(key, name), self.context.plugins())?;
                        self.add_union(union)?;
                    }
                }
                "models" => {
                    for (class, def) in expect_map(section, key)? {
                        let model = ModelType::from_config(class, def, &join(key, class), &self.context)?;
                        self.add_model(model)?;
                    }
                }
                "enums" => {
                    for (name, def) in expect_map(section, key)? {
                        let en = EnumType::from_config(name, def, &join(key, name), self.context.plugins())?;
                        self.add_enum(en)?;
                    }
                }
                "scalars" => {
                    for (name, def) in expect_map(section, key)? {
                        let scalar = ScalarType::from_config(name, def, &join(key, name), self.context.plugins())?;
                        self.add_scalar(scalar)?;
                    }
                }
                "execute" => {
                    let updaters = expect_string_list(section, key)?;
                    self.execute(&updaters)?;
                }
                _ => {}
            }
        }

        tracing::debug!(key = %self.key, sections = map.len(), "applied config fragment");
        Ok(())
    }

    /// Run schema updaters by identifier, in order.
    ///
    /// Each identifier must name a plugin with the schema updater
    /// capability.
    pub fn execute(&mut self, updaters: &[String]) -> Result<(), SchemaError> {
        for id in updaters {
            let plugin = self.context.plugins().resolve_updater(id)?;
            if let Some(updater) = plugin.as_schema_updater() {
                tracing::debug!(key = %self.key, plugin = %id, "executing schema updater");
                updater.update_schema(self)?;
            }
        }
        Ok(())
    }
}
