//! # Built-in Plugins
//!
//! Plugins registered by the CLI for every schema it builds:
//!
//! - `describe`: sets the description of any component from `{ text }`
//! - `paginate`: turns a list-returning query or field into a paged
//!   `{Type}Connection` with `limit` and `offset` arguments, and registers
//!   the shared `PageInfo` type

use schemaforge_core::{
    Argument, Component, ComponentPlugin, Field, Plugin, PluginConfig, PluginError, PluginRegistry,
    PluginTarget, Schema, SchemaError, SchemaUpdater,
};
use std::sync::Arc;

/// Name of the type shared by every connection.
pub const PAGE_INFO_TYPE: &str = "PageInfo";

/// Page size used when `paginate` is configured without `limit`.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Registry holding every built-in plugin.
#[must_use]
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(Describe));
    registry.register(Arc::new(Paginate));
    registry
}

// =============================================================================
// DESCRIBE
// =============================================================================

/// Sets a component description from config.
#[derive(Debug, Clone, Copy, Default)]
pub struct Describe;

impl Plugin for Describe {
    fn identifier(&self) -> &str {
        "describe"
    }

    fn as_component_plugin(&self) -> Option<&dyn ComponentPlugin> {
        Some(self)
    }
}

impl ComponentPlugin for Describe {
    fn apply(
        &self,
        target: PluginTarget<'_>,
        _schema: &mut Schema,
        config: &PluginConfig,
    ) -> Result<(), PluginError> {
        let text = config
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PluginError::Build("'text' must be a string".to_string()))?;

        match target {
            PluginTarget::Type(ty) => ty.set_description(text),
            PluginTarget::Model(model) => model.set_description(text),
            PluginTarget::Query(field) | PluginTarget::Mutation(field) => {
                field.set_description(text);
            }
            PluginTarget::Field { field, .. } => field.set_description(text),
            PluginTarget::ModelField { field, .. } => field.field_mut().set_description(text),
        }
        Ok(())
    }
}

// =============================================================================
// PAGINATE
// =============================================================================

/// Wraps list results into connections.
///
/// Config: `{ limit: <default page size> }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginate;

impl Plugin for Paginate {
    fn identifier(&self) -> &str {
        "paginate"
    }

    fn as_component_plugin(&self) -> Option<&dyn ComponentPlugin> {
        Some(self)
    }

    fn as_schema_updater(&self) -> Option<&dyn SchemaUpdater> {
        Some(self)
    }
}

impl SchemaUpdater for Paginate {
    fn update_schema(&self, schema: &mut Schema) -> Result<(), SchemaError> {
        let page_info = schema.find_or_make_type(PAGE_INFO_TYPE)?;
        for (name, type_ref) in [
            ("total", "Int!"),
            ("limit", "Int!"),
            ("offset", "Int!"),
            ("hasMore", "Boolean!"),
        ] {
            page_info.find_or_make_field(name).set_type(type_ref);
        }
        Ok(())
    }
}

impl ComponentPlugin for Paginate {
    fn apply(
        &self,
        target: PluginTarget<'_>,
        schema: &mut Schema,
        config: &PluginConfig,
    ) -> Result<(), PluginError> {
        let field = match target {
            PluginTarget::Query(field) | PluginTarget::Field { field, .. } => field,
            _ => return Err(PluginError::UnsupportedTarget),
        };

        let limit = match config.get("limit") {
            None => DEFAULT_PAGE_SIZE,
            Some(value) => value
                .as_u64()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| PluginError::Build("'limit' must be a positive integer".to_string()))?,
        };

        paginate_field(field, schema, limit)
    }
}

/// Rewrite `field` to return a connection of its list element type.
fn paginate_field(field: &mut Field, schema: &mut Schema, limit: u64) -> Result<(), PluginError> {
    let parsed = field
        .parsed_type()
        .ok_or_else(|| PluginError::Build(format!("'{}' has no valid type", field.name())))?;
    if !parsed.is_list() {
        return Err(PluginError::Build(format!(
            "'{}' does not return a list",
            field.name()
        )));
    }

    let element = parsed.named_type().to_string();
    let connection_name = format!("{}Connection", element);
    let items_type = format!("{}!", parsed.nullable());

    let connection = schema.find_or_make_type(&connection_name)?;
    connection.find_or_make_field("items").set_type(items_type);
    connection
        .find_or_make_field("pageInfo")
        .set_type(format!("{}!", PAGE_INFO_TYPE));

    field.set_type(format!("{}!", connection_name));
    field.add_arg(Argument::new("limit", "Int").with_default(limit.to_string()));
    field.add_arg(Argument::new("offset", "Int").with_default("0"));
    tracing::debug!(field = %field.name(), connection = %connection_name, "paginated field");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
