//! # Plugin Contracts
//!
//! Plugins are behaviours attached to components through configuration and
//! applied while a schema is built. A plugin exposes one or both of two
//! capabilities:
//!
//! - `ComponentPlugin`: mutates a single component (type, model, query,
//!   mutation, field or model field)
//! - `SchemaUpdater`: mutates the whole schema, possibly adding components
//!   that carry plugins of their own
//!
//! Capabilities are declared explicitly through `Plugin::as_component_plugin`
//! and `Plugin::as_schema_updater`. Bindings are resolved against the
//! `PluginRegistry` when config is ingested, so unknown identifiers fail
//! early instead of at build time.

use crate::components::{Component, Field, ModelField, ModelType, ObjectType};
use crate::config::{ConfigMap, expect_bool, expect_map, join};
use crate::{PluginError, Schema, SchemaError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Options passed to a plugin for one binding.
pub type PluginConfig = ConfigMap;

// =============================================================================
// CAPABILITIES
// =============================================================================

/// A plugin known to the registry.
pub trait Plugin: Send + Sync {
    /// Stable identifier used in config (`plugins: { <identifier>: ... }`).
    fn identifier(&self) -> &str;

    /// The component capability, if this plugin has one.
    fn as_component_plugin(&self) -> Option<&dyn ComponentPlugin> {
        None
    }

    /// The schema updater capability, if this plugin has one.
    fn as_schema_updater(&self) -> Option<&dyn SchemaUpdater> {
        None
    }
}

/// Mutates one component.
pub trait ComponentPlugin {
    /// Apply to `target`.
    ///
    /// Return `PluginError::UnsupportedTarget` for component kinds the plugin
    /// does not handle; the engine reports it as a category mismatch.
    fn apply(
        &self,
        target: PluginTarget<'_>,
        schema: &mut Schema,
        config: &PluginConfig,
    ) -> Result<(), PluginError>;
}

/// Mutates the whole schema. Invoked at most once per plugin pass.
pub trait SchemaUpdater {
    fn update_schema(&self, schema: &mut Schema) -> Result<(), SchemaError>;
}

// =============================================================================
// TARGETS & CATEGORIES
// =============================================================================

/// The component category being processed when a plugin runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluginCategory {
    Types,
    Models,
    Queries,
    Mutations,
    Fields,
    ModelFields,
}

impl PluginCategory {
    /// The category string used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Types => "types",
            Self::Models => "models",
            Self::Queries => "queries",
            Self::Mutations => "mutations",
            Self::Fields => "fields",
            Self::ModelFields => "modelFields",
        }
    }
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The component a `ComponentPlugin` is applied to.
///
/// The component is detached from the schema while the plugin runs and is
/// merged back afterwards.
#[derive(Debug)]
pub enum PluginTarget<'a> {
    Type(&'a mut ObjectType),
    Model(&'a mut ModelType),
    Query(&'a mut Field),
    Mutation(&'a mut Field),
    Field {
        owner: &'a str,
        field: &'a mut Field,
    },
    ModelField {
        model: &'a str,
        field: &'a mut ModelField,
    },
}

impl PluginTarget<'_> {
    #[must_use]
    pub fn category(&self) -> PluginCategory {
        match self {
            Self::Type(_) => PluginCategory::Types,
            Self::Model(_) => PluginCategory::Models,
            Self::Query(_) => PluginCategory::Queries,
            Self::Mutation(_) => PluginCategory::Mutations,
            Self::Field { .. } => PluginCategory::Fields,
            Self::ModelField { .. } => PluginCategory::ModelFields,
        }
    }

    /// Name of the targeted component.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Type(t) => t.name(),
            Self::Model(m) => m.name(),
            Self::Query(f) | Self::Mutation(f) | Self::Field { field: f, .. } => f.name(),
            Self::ModelField { field, .. } => field.name(),
        }
    }
}

// =============================================================================
// BINDINGS
// =============================================================================

/// One configured plugin on a component.
///
/// `config == None` marks the plugin as disabled, which removes a default
/// binding of the same identifier when lists are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginBinding {
    pub id: String,
    pub config: Option<PluginConfig>,
}

impl PluginBinding {
    #[must_use]
    pub fn enabled(id: impl Into<String>, config: PluginConfig) -> Self {
        Self {
            id: id.into(),
            config: Some(config),
        }
    }

    #[must_use]
    pub fn disabled(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: None,
        }
    }
}

/// Ordered plugin bindings of one component, unique by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginBindings {
    bindings: Vec<PluginBinding>,
}

impl PluginBindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `plugins` config mapping.
    ///
    /// Each entry is `true` (enabled, empty config), `false` (disabled) or a
    /// config mapping. Enabled identifiers must exist in `registry`.
    pub fn from_config(
        value: &Value,
        path: &str,
        registry: &PluginRegistry,
    ) -> Result<Self, SchemaError> {
        let mut bindings = Self::new();
        for (id, entry) in expect_map(value, path)? {
            let entry_path = join(path, id);
            let binding = match entry {
                Value::Bool(_) => {
                    if expect_bool(entry, &entry_path)? {
                        PluginBinding::enabled(id, PluginConfig::new())
                    } else {
                        PluginBinding::disabled(id)
                    }
                }
                other => PluginBinding::enabled(id, expect_map(other, &entry_path)?.clone()),
            };
            if binding.config.is_some() {
                registry.resolve(id)?;
            }
            bindings.set(binding);
        }
        Ok(bindings)
    }

    /// Insert or replace a binding, keeping the original position.
    pub fn set(&mut self, binding: PluginBinding) {
        match self.bindings.iter_mut().find(|b| b.id == binding.id) {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
    }

    /// Enable a plugin with the given config.
    pub fn add(&mut self, id: impl Into<String>, config: PluginConfig) {
        self.set(PluginBinding::enabled(id, config));
    }

    /// Disable a plugin.
    pub fn disable(&mut self, id: &str) {
        self.set(PluginBinding::disabled(id));
    }

    /// Merge `other` over `self`: later bindings win per identifier.
    pub fn merge(&mut self, other: Self) {
        for binding in other.bindings {
            self.set(binding);
        }
    }

    /// Seed `defaults` underneath the current bindings.
    ///
    /// Defaults come first in order; explicit bindings (including disabled
    /// ones) override them.
    pub fn seed_defaults(&mut self, defaults: &Self) {
        let mut seeded = defaults.clone();
        seeded.merge(std::mem::take(self));
        *self = seeded;
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.active().any(|(plugin, _)| plugin == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PluginConfig> {
        self.active()
            .find(|(plugin, _)| *plugin == id)
            .map(|(_, config)| config)
    }

    /// Enabled bindings in order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &PluginConfig)> {
        self.bindings
            .iter()
            .filter_map(|b| b.config.as_ref().map(|c| (b.id.as_str(), c)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Resolve enabled bindings to plugin instances, in order.
    pub fn load(
        &self,
        registry: &PluginRegistry,
    ) -> Result<Vec<(Arc<dyn Plugin>, PluginConfig)>, SchemaError> {
        self.active()
            .map(|(id, config)| Ok((registry.resolve(id)?, config.clone())))
            .collect()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Identifier → plugin lookup.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its identifier, replacing any previous one.
    ///
    /// Plugins without either capability are accepted but can never run;
    /// this is logged so a misconfiguration is visible.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let id = plugin.identifier().to_string();
        if plugin.as_component_plugin().is_none() && plugin.as_schema_updater().is_none() {
            tracing::warn!(plugin = %id, "plugin declares no capability and will be skipped");
        }
        if self.plugins.insert(id.clone(), plugin).is_some() {
            tracing::debug!(plugin = %id, "replaced registered plugin");
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(id).cloned()
    }

    /// Look up a plugin, failing with `UnknownPlugin`.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Plugin>, SchemaError> {
        self.get(id)
            .ok_or_else(|| SchemaError::UnknownPlugin(id.to_string()))
    }

    /// Look up a plugin that must be a schema updater.
    pub fn resolve_updater(&self, id: &str) -> Result<Arc<dyn Plugin>, SchemaError> {
        let plugin = self.resolve(id)?;
        if plugin.as_schema_updater().is_none() {
            return Err(SchemaError::NotASchemaUpdater(id.to_string()));
        }
        Ok(plugin)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }
}

// =============================================================================
// TESTS
// =============================================================================
