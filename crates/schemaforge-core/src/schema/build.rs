//! Build orchestration.

use super::Schema;
use crate::components::Component;
use crate::{SchemaError, SchemaGraph};

impl Schema {
    /// Build and persist the schema.
    ///
    /// Expands models, runs the plugin pass, validates, folds models and the
    /// root types into a `SchemaGraph`, and persists it through the store.
    ///
    /// Not re-entrant: a second call on the same instance runs the plugin
    /// pass again (models are only expanded once). Start a new `Schema`
    /// for each build.
    pub fn save(&mut self) -> Result<SchemaGraph, SchemaError> {
        let graph = self.build()?;
        self.log_stage("persisting");
        self.store.persist_schema(&graph)?;
        tracing::info!(
            key = %self.key,
            types = graph.type_count(),
            queries = graph.query_count(),
            mutations = graph.mutation_count(),
            "schema saved"
        );
        Ok(graph)
    }

    /// Everything `save` does except persisting.
    pub fn build(&mut self) -> Result<SchemaGraph, SchemaError> {
        self.log_stage("expanding models");
        self.expand_models()?;
        self.log_stage("applying plugins");
        self.apply_plugins()?;
        self.log_stage("validating");
        self.validate()?;
        Ok(self.to_graph())
    }

    /// Compile every model into root query and mutation fields.
    ///
    /// Runs once per instance; later calls do nothing.
    pub fn expand_models(&mut self) -> Result<(), SchemaError> {
        if self.models_expanded {
            return Ok(());
        }
        self.models_expanded = true;

        let names: Vec<String> = self.models.keys().cloned().collect();
        for name in names {
            let Some(model) = self.models.get_mut(&name) else {
                continue;
            };
            if let Some(defaults) = model.model().default_plugins(&self.context) {
                model.seed_default_plugins(&defaults);
            }
            let compiled = model.compile(&self.context)?;

            for ty in compiled.extra_types {
                self.add_type(ty)?;
            }
            for (field_name, operation) in compiled.operations {
                tracing::debug!(model = %name, operation = %field_name, mutation = operation.kind.is_mutation(), "expanded model operation");
                if operation.kind.is_mutation() {
                    self.mutation_type.add_field(operation.field);
                } else {
                    self.query_type.add_field(operation.field);
                }
            }
        }
        Ok(())
    }

    /// Fold models and root types into a graph.
    fn to_graph(&self) -> SchemaGraph {
        let mut graph = SchemaGraph::new(self.key.clone());
        graph.types = self.types.clone();
        for model in self.models.values() {
            graph.insert_type(model.to_object_type());
            graph
                .type_mapping
                .insert(model.source_class().to_string(), model.name().to_string());
        }
        graph.insert_type(self.query_type.clone());
        if self.mutation_type.field_count() > 0 {
            graph.insert_type(self.mutation_type.clone());
        }
        graph.interfaces = self.interfaces.clone();
        graph.unions = self.unions.clone();
        graph.enums = self.enums.clone();
        graph.scalars = self.scalars.clone();
        graph
    }

    pub(crate) fn log_stage(&self, stage: &str) {
        if self.options.verbose {
            tracing::info!(key = %self.key, stage, "build stage");
        } else {
            tracing::debug!(key = %self.key, stage, "build stage");
        }
    }
}
