//! The plugin pass.
//!
//! Components fall into two universes, processed in order:
//!
//! - type level: types, models, root query fields, root mutation fields
//! - field level: fields of non-input types, model fields
//!
//! For each universe, schema updaters referenced by any component run
//! first. Updaters may add components carrying further updaters, so the
//! scan repeats until no unseen updater turns up. Component plugins then
//! run against a snapshot of the universe taken once the updaters settled.
//!
//! A component is detached from its map while its plugins run and merged
//! back afterwards, so plugins get the component and the schema at once.

use super::{Schema, merge_into};
use crate::components::{Component, ObjectType};
use crate::plugin::{ComponentPlugin, Plugin, PluginBindings, PluginCategory, PluginConfig, PluginTarget};
use crate::{PluginError, SchemaError};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Universe {
    TypeLevel,
    FieldLevel,
}

/// A pluggable component, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetRef {
    Type(String),
    Model(String),
    Query(String),
    Mutation(String),
    Field { owner: String, field: String },
    ModelField { model: String, field: String },
}

impl Schema {
    /// Run the plugin pass over both universes.
    pub fn apply_plugins(&mut self) -> Result<(), SchemaError> {
        for universe in [Universe::TypeLevel, Universe::FieldLevel] {
            self.run_schema_updaters(universe)?;
            self.run_component_plugins(universe)?;
        }
        Ok(())
    }

    /// Components of a universe that have at least one active plugin.
    fn plugin_targets(&self, universe: Universe) -> Vec<TargetRef> {
        let mut targets = Vec::new();
        match universe {
            Universe::TypeLevel => {
                targets.extend(pluggable(self.types.values()).map(TargetRef::Type));
                targets.extend(pluggable(self.models.values()).map(TargetRef::Model));
                targets.extend(pluggable(self.query_type.fields()).map(TargetRef::Query));
                targets.extend(pluggable(self.mutation_type.fields()).map(TargetRef::Mutation));
            }
            Universe::FieldLevel => {
                for ty in self.types.values().filter(|ty| !ty.is_input()) {
                    targets.extend(pluggable(ty.fields()).map(|field| TargetRef::Field {
                        owner: ty.name().to_string(),
                        field,
                    }));
                }
                for model in self.models.values() {
                    targets.extend(pluggable(model.fields()).map(|field| TargetRef::ModelField {
                        model: model.name().to_string(),
                        field,
                    }));
                }
            }
        }
        targets
    }

    fn bindings_of(&self, target: &TargetRef) -> Option<&PluginBindings> {
        match target {
            TargetRef::Type(name) => self.types.get(name).map(Component::plugins),
            TargetRef::Model(name) => self.models.get(name).map(Component::plugins),
            TargetRef::Query(name) => self.query_type.field(name).map(Component::plugins),
            TargetRef::Mutation(name) => self.mutation_type.field(name).map(Component::plugins),
            TargetRef::Field { owner, field } => self
                .types
                .get(owner)
                .and_then(|ty| ty.field(field))
                .map(Component::plugins),
            TargetRef::ModelField { model, field } => self
                .models
                .get(model)
                .and_then(|m| m.field(field))
                .map(Component::plugins),
        }
    }

    // =========================================================================
    // SCHEMA UPDATERS
    // =========================================================================

    /// Run every schema updater referenced in the universe exactly once,
    /// rescanning until no new updater is found.
    fn run_schema_updaters(&mut self, universe: Universe) -> Result<(), SchemaError> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut round = 0usize;
        loop {
            let mut pending: Vec<Arc<dyn Plugin>> = Vec::new();
            for target in self.plugin_targets(universe) {
                let Some(bindings) = self.bindings_of(&target) else {
                    continue;
                };
                for (id, _) in bindings.active() {
                    if !seen.insert(id.to_string()) {
                        continue;
                    }
                    let plugin = self.context.plugins().resolve(id)?;
                    if plugin.as_schema_updater().is_some() {
                        pending.push(plugin);
                    }
                }
            }
            if pending.is_empty() {
                return Ok(());
            }

            round += 1;
            self.log_stage(&format!(
                "{:?}: running {} schema updater(s), round {}",
                universe,
                pending.len(),
                round
            ));
            for plugin in pending {
                if let Some(updater) = plugin.as_schema_updater() {
                    tracing::debug!(plugin = %plugin.identifier(), "running schema updater");
                    updater.update_schema(self)?;
                }
            }
        }
    }

    // =========================================================================
    // COMPONENT PLUGINS
    // =========================================================================

    fn run_component_plugins(&mut self, universe: Universe) -> Result<(), SchemaError> {
        let targets = self.plugin_targets(universe);
        self.log_stage(&format!(
            "{:?}: applying component plugins to {} component(s)",
            universe,
            targets.len()
        ));
        for target in targets {
            self.apply_to_target(&target)?;
        }
        Ok(())
    }

    /// Detach the target, apply its plugins, and reattach it.
    ///
    /// The component is reattached before any plugin error propagates.
    fn apply_to_target(&mut self, target: &TargetRef) -> Result<(), SchemaError> {
        match target {
            TargetRef::Type(name) => {
                let Some(mut ty) = self.types.remove(name) else {
                    return Ok(());
                };
                let bindings = ty.plugins().clone();
                let result = self.apply_bindings(&bindings, name, PluginCategory::Types, |plugin, schema, config| {
                    plugin.apply(PluginTarget::Type(&mut ty), schema, config)
                });
                merge_into(&mut self.types, ty);
                result
            }
            TargetRef::Model(name) => {
                let Some(mut model) = self.models.remove(name) else {
                    return Ok(());
                };
                let bindings = model.plugins().clone();
                let result = self.apply_bindings(&bindings, name, PluginCategory::Models, |plugin, schema, config| {
                    plugin.apply(PluginTarget::Model(&mut model), schema, config)
                });
                let reattached = self.add_model(model);
                result.and(reattached)
            }
            TargetRef::Query(name) => {
                let Some(mut field) = self.query_type.remove_field(name) else {
                    return Ok(());
                };
                let bindings = field.plugins().clone();
                let result = self.apply_bindings(&bindings, name, PluginCategory::Queries, |plugin, schema, config| {
                    plugin.apply(PluginTarget::Query(&mut field), schema, config)
                });
                self.query_type.add_field(field);
                result
            }
            TargetRef::Mutation(name) => {
                let Some(mut field) = self.mutation_type.remove_field(name) else {
                    return Ok(());
                };
                let bindings = field.plugins().clone();
                let result = self.apply_bindings(&bindings, name, PluginCategory::Mutations, |plugin, schema, config| {
                    plugin.apply(PluginTarget::Mutation(&mut field), schema, config)
                });
                self.mutation_type.add_field(field);
                result
            }
            TargetRef::Field { owner, field: name } => {
                let Some(mut field) = self.types.get_mut(owner).and_then(|ty| ty.remove_field(name)) else {
                    return Ok(());
                };
                let bindings = field.plugins().clone();
                let component = format!("{}.{}", owner, name);
                let result = self.apply_bindings(&bindings, &component, PluginCategory::Fields, |plugin, schema, config| {
                    plugin.apply(PluginTarget::Field { owner, field: &mut field }, schema, config)
                });
                self.types
                    .entry(owner.clone())
                    .or_insert_with(|| ObjectType::new(owner.as_str()))
                    .add_field(field);
                result
            }
            TargetRef::ModelField { model, field: name } => {
                let Some(mut field) = self.models.get_mut(model).and_then(|m| m.remove_field(name)) else {
                    return Ok(());
                };
                let bindings = field.plugins().clone();
                let component = format!("{}.{}", model, name);
                let result = self.apply_bindings(&bindings, &component, PluginCategory::ModelFields, |plugin, schema, config| {
                    plugin.apply(PluginTarget::ModelField { model, field: &mut field }, schema, config)
                });
                match self.models.get_mut(model) {
                    Some(owner) => owner.add_field(field),
                    None => tracing::warn!(model = %model, field = %name, "model removed while its field plugins ran; field dropped"),
                }
                result
            }
        }
    }

    /// Apply each enabled binding through `apply`, in order.
    ///
    /// Plugins without the component capability are skipped: silently for
    /// pure schema updaters (they already ran), with a debug log otherwise.
    fn apply_bindings<F>(
        &mut self,
        bindings: &PluginBindings,
        component: &str,
        category: PluginCategory,
        mut apply: F,
    ) -> Result<(), SchemaError>
    where
        F: FnMut(&dyn ComponentPlugin, &mut Schema, &PluginConfig) -> Result<(), PluginError>,
    {
        for (plugin, config) in bindings.load(self.context.plugins())? {
            let Some(component_plugin) = plugin.as_component_plugin() else {
                if plugin.as_schema_updater().is_none() {
                    tracing::debug!(
                        plugin = %plugin.identifier(),
                        component = %component,
                        category = %category,
                        "plugin has no component capability, skipped"
                    );
                }
                continue;
            };
            tracing::trace!(plugin = %plugin.identifier(), component = %component, category = %category, "applying plugin");
            apply(component_plugin, self, &config)
                .map_err(|e| plugin_failure(e, plugin.identifier(), component, category))?;
        }
        Ok(())
    }
}

/// Names of components with at least one active plugin.
fn pluggable<'a, C: Component + 'a>(components: impl Iterator<Item = &'a C>) -> impl Iterator<Item = String> {
    components
        .filter(|c| !c.plugins().is_empty())
        .map(|c| c.name().to_string())
}

fn plugin_failure(err: PluginError, plugin: &str, component: &str, category: PluginCategory) -> SchemaError {
    match err {
        PluginError::UnsupportedTarget => SchemaError::PluginCategoryMismatch {
            plugin: plugin.to_string(),
            component: component.to_string(),
            category: category.to_string(),
        },
        PluginError::Build(message) => SchemaError::PluginApplicationFailure {
            plugin: plugin.to_string(),
            component: component.to_string(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Field;
    use crate::context::SchemaContext;
    use crate::plugin::{PluginRegistry, SchemaUpdater};
    use crate::storage::MemoryStoreFactory;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts schema updater invocations.
    #[derive(Default)]
    struct Counting {
        runs: AtomicUsize,
    }

    impl Plugin for Counting {
        fn identifier(&self) -> &str {
            "counting"
        }

        fn as_schema_updater(&self) -> Option<&dyn SchemaUpdater> {
            Some(self)
        }
    }

    impl SchemaUpdater for Counting {
        fn update_schema(&self, _schema: &mut Schema) -> Result<(), SchemaError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Only handles types.
    struct TypesOnly;

    impl Plugin for TypesOnly {
        fn identifier(&self) -> &str {
            "typesOnly"
        }

        fn as_component_plugin(&self) -> Option<&dyn ComponentPlugin> {
            Some(self)
        }
    }

    impl ComponentPlugin for TypesOnly {
        fn apply(&self, target: PluginTarget<'_>, _schema: &mut Schema, _config: &PluginConfig) -> Result<(), PluginError> {
            match target {
                PluginTarget::Type(ty) => {
                    ty.set_description("touched");
                    Ok(())
                }
                _ => Err(PluginError::UnsupportedTarget),
            }
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn identifier(&self) -> &str {
            "failing"
        }

        fn as_component_plugin(&self) -> Option<&dyn ComponentPlugin> {
            Some(self)
        }
    }

    impl ComponentPlugin for Failing {
        fn apply(&self, _target: PluginTarget<'_>, _schema: &mut Schema, _config: &PluginConfig) -> Result<(), PluginError> {
            Err(PluginError::Build("boom".into()))
        }
    }

    fn schema(counting: Arc<Counting>) -> Schema {
        let mut registry = PluginRegistry::new();
        registry.register(counting);
        registry.register(Arc::new(TypesOnly));
        registry.register(Arc::new(Failing));
        let context = SchemaContext::new().with_plugins(registry);
        Schema::new("plugins", context, &MemoryStoreFactory::new()).expect("schema")
    }

    #[test]
    fn updater_runs_once_per_universe_even_when_shared() {
        let counting = Arc::new(Counting::default());
        let mut schema = schema(Arc::clone(&counting));
        schema
            .apply_config(&json!({
                "types": {
                    "A": {"fields": {"x": "Int"}, "plugins": {"counting": true}},
                    "B": {"fields": {"y": "Int"}, "plugins": {"counting": true}}
                }
            }))
            .expect("apply");

        schema.apply_plugins().expect("plugins");
        assert_eq!(counting.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn component_plugin_mutates_detached_type() {
        let mut schema = schema(Arc::new(Counting::default()));
        schema
            .apply_config(&json!({"types": {"A": {"fields": {"x": "Int"}, "plugins": {"typesOnly": true}}}}))
            .expect("apply");

        schema.apply_plugins().expect("plugins");
        let a = schema.get_type("A").expect("A reattached");
        assert_eq!(a.description(), Some("touched"));
        assert_eq!(a.field_count(), 1);
    }

    #[test]
    fn unsupported_target_is_a_category_mismatch() {
        let mut schema = schema(Arc::new(Counting::default()));
        schema
            .apply_config(&json!({"queries": {"hello": {"type": "String", "plugins": {"typesOnly": true}}}}))
            .expect("apply");

        assert_eq!(
            schema.apply_plugins().expect_err("mismatch"),
            SchemaError::PluginCategoryMismatch {
                plugin: "typesOnly".into(),
                component: "hello".into(),
                category: "queries".into(),
            }
        );
        assert!(schema.get_query_type().field("hello").is_some());
    }

    #[test]
    fn build_error_is_wrapped_with_context() {
        let mut schema = schema(Arc::new(Counting::default()));
        schema
            .apply_config(&json!({"types": {"Post": {"fields": {"title": {"type": "String", "plugins": {"failing": true}}}}}}))
            .expect("apply");

        assert_eq!(
            schema.apply_plugins().expect_err("failure"),
            SchemaError::PluginApplicationFailure {
                plugin: "failing".into(),
                component: "Post.title".into(),
                message: "boom".into(),
            }
        );
        assert!(schema.get_type("Post").and_then(|t| t.field("title")).is_some());
    }

    #[test]
    fn input_type_fields_are_not_processed() {
        let mut schema = schema(Arc::new(Counting::default()));
        schema
            .apply_config(&json!({"types": {"PostInput": {"input": true, "fields": {"title": {"type": "String", "plugins": {"failing": true}}}}}}))
            .expect("apply");
        assert!(schema.apply_plugins().is_ok());
    }

    #[test]
    fn pure_updater_bound_to_a_component_is_skipped_in_component_phase() {
        let counting = Arc::new(Counting::default());
        let mut schema = schema(Arc::clone(&counting));
        schema.add_query(Field::typed("hello", "String")).expect("query");
        schema
            .get_query_type_mut()
            .field_mut("hello")
            .expect("hello")
            .plugins_mut()
            .add("counting", PluginConfig::new());

        schema.apply_plugins().expect("plugins");
        assert_eq!(counting.runs.load(Ordering::SeqCst), 1);
    }
}
