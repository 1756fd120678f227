//! # Schema Assembler
//!
//! `Schema` owns the named component maps of one schema key and runs the
//! build:
//!
//! 1. Ingestion (`apply_config`, `add_*`): contributions merge into the
//!    maps in any order
//! 2. Model expansion: each model compiles into root query and mutation
//!    fields, exactly once
//! 3. Plugin pass: schema updaters, then component plugins, per universe
//! 4. Validation
//! 5. Persistence through the store
//!
//! A `Schema` is single-threaded and meant for one build. After a failed
//! build the instance may be partially mutated and should be discarded.

mod build;
mod ingest;
mod plugins;
mod validate;

use crate::components::{
    Component, EnumType, ExtraType, Field, InterfaceType, ModelType, ObjectType, ScalarType,
    UnionType,
};
use crate::context::{SchemaContext, SchemaModel};
use crate::primitives::{MUTATION_TYPE_NAME, QUERY_TYPE_NAME};
use crate::storage::{SchemaStore, StoreFactory};
use crate::types::validate_name;
use crate::{SchemaError, SchemaGraph};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Build settings passed to the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Log build stages at `info` instead of `debug`.
    pub verbose: bool,
}

/// A schema being assembled.
pub struct Schema {
    key: String,
    context: SchemaContext,
    options: BuildOptions,
    store: Box<dyn SchemaStore>,
    types: BTreeMap<String, ObjectType>,
    models: BTreeMap<String, ModelType>,
    interfaces: BTreeMap<String, InterfaceType>,
    unions: BTreeMap<String, UnionType>,
    enums: BTreeMap<String, EnumType>,
    scalars: BTreeMap<String, ScalarType>,
    query_type: ObjectType,
    mutation_type: ObjectType,
    models_expanded: bool,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("key", &self.key)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("interfaces", &self.interfaces.keys().collect::<Vec<_>>())
            .field("unions", &self.unions.keys().collect::<Vec<_>>())
            .field("enums", &self.enums.keys().collect::<Vec<_>>())
            .field("scalars", &self.scalars.keys().collect::<Vec<_>>())
            .field("queries", &self.query_type.field_count())
            .field("mutations", &self.mutation_type.field_count())
            .finish_non_exhaustive()
    }
}

impl Schema {
    /// Create an empty schema backed by a store from `factory`.
    pub fn new(
        key: impl Into<String>,
        context: SchemaContext,
        factory: &dyn StoreFactory,
    ) -> Result<Self, SchemaError> {
        let key = key.into();
        let store = factory.create_store(&key)?;
        Ok(Self {
            key,
            context,
            options: BuildOptions::default(),
            store,
            types: BTreeMap::new(),
            models: BTreeMap::new(),
            interfaces: BTreeMap::new(),
            unions: BTreeMap::new(),
            enums: BTreeMap::new(),
            scalars: BTreeMap::new(),
            query_type: ObjectType::new(QUERY_TYPE_NAME),
            mutation_type: ObjectType::new(MUTATION_TYPE_NAME),
            models_expanded: false,
        })
    }

    /// Builder-style: set build options.
    #[must_use]
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SchemaContext {
        &mut self.context
    }

    #[must_use]
    pub fn options(&self) -> BuildOptions {
        self.options
    }

    // =========================================================================
    // ADD (merge on insert)
    // =========================================================================

    /// Add a type, merging with an existing type of the same name.
    pub fn add_type(&mut self, ty: ObjectType) -> Result<(), SchemaError> {
        validate_name(ty.name())?;
        merge_into(&mut self.types, ty);
        Ok(())
    }

    /// Add a model, merging with an existing model of the same name.
    ///
    /// Extra types the model carries are added too, recursively.
    pub fn add_model(&mut self, mut model: ModelType) -> Result<(), SchemaError> {
        validate_name(model.name())?;
        let extras = model.take_extra_types();
        merge_into(&mut self.models, model);
        for extra in extras {
            match extra {
                ExtraType::Type(ty) => self.add_type(ty)?,
                ExtraType::Model(model) => self.add_model(model)?,
            }
        }
        Ok(())
    }

    pub fn add_interface(&mut self, interface: InterfaceType) -> Result<(), SchemaError> {
        validate_name(interface.name())?;
        merge_into(&mut self.interfaces, interface);
        Ok(())
    }

    pub fn add_union(&mut self, union: UnionType) -> Result<(), SchemaError> {
        validate_name(union.name())?;
        merge_into(&mut self.unions, union);
        Ok(())
    }

    pub fn add_enum(&mut self, en: EnumType) -> Result<(), SchemaError> {
        validate_name(en.name())?;
        merge_into(&mut self.enums, en);
        Ok(())
    }

    pub fn add_scalar(&mut self, scalar: ScalarType) -> Result<(), SchemaError> {
        validate_name(scalar.name())?;
        merge_into(&mut self.scalars, scalar);
        Ok(())
    }

    /// Add a root query field.
    pub fn add_query(&mut self, query: Field) -> Result<(), SchemaError> {
        validate_name(query.name())?;
        self.query_type.add_field(query);
        Ok(())
    }

    /// Add a root mutation field.
    pub fn add_mutation(&mut self, mutation: Field) -> Result<(), SchemaError> {
        validate_name(mutation.name())?;
        self.mutation_type.add_field(mutation);
        Ok(())
    }

    /// Create a model for a domain class, let `configure` adjust it, and
    /// add it.
    pub fn add_model_by_class_name<F>(&mut self, class: &str, configure: F) -> Result<(), SchemaError>
    where
        F: FnOnce(&mut ModelType, &SchemaContext) -> Result<(), SchemaError>,
    {
        let model = self
            .create_model(class)
            .ok_or_else(|| SchemaError::NoModelForClass(class.to_string()))?;
        let mut model_type = ModelType::new(model, &self.context)?;
        configure(&mut model_type, &self.context)?;
        self.add_model(model_type)
    }

    // =========================================================================
    // FIND OR MAKE
    // =========================================================================

    /// Get a type, creating an empty one if absent.
    pub fn find_or_make_type(&mut self, name: &str) -> Result<&mut ObjectType, SchemaError> {
        validate_name(name)?;
        Ok(self
            .types
            .entry(name.to_string())
            .or_insert_with(|| ObjectType::new(name)))
    }

    pub fn find_or_make_interface(&mut self, name: &str) -> Result<&mut InterfaceType, SchemaError> {
        validate_name(name)?;
        Ok(self
            .interfaces
            .entry(name.to_string())
            .or_insert_with(|| InterfaceType::new(name)))
    }

    pub fn find_or_make_union(&mut self, name: &str) -> Result<&mut UnionType, SchemaError> {
        validate_name(name)?;
        Ok(self
            .unions
            .entry(name.to_string())
            .or_insert_with(|| UnionType::new(name)))
    }

    pub fn find_or_make_enum(&mut self, name: &str) -> Result<&mut EnumType, SchemaError> {
        validate_name(name)?;
        Ok(self
            .enums
            .entry(name.to_string())
            .or_insert_with(|| EnumType::new(name)))
    }

    pub fn find_or_make_scalar(&mut self, name: &str) -> Result<&mut ScalarType, SchemaError> {
        validate_name(name)?;
        Ok(self
            .scalars
            .entry(name.to_string())
            .or_insert_with(|| ScalarType::new(name)))
    }

    /// Get a root query field, creating an untyped one if absent.
    pub fn find_or_make_query(&mut self, name: &str) -> Result<&mut Field, SchemaError> {
        validate_name(name)?;
        Ok(self.query_type.find_or_make_field(name))
    }

    /// Get a root mutation field, creating an untyped one if absent.
    pub fn find_or_make_mutation(&mut self, name: &str) -> Result<&mut Field, SchemaError> {
        validate_name(name)?;
        Ok(self.mutation_type.find_or_make_field(name))
    }

    /// Get the model for a domain class, creating it if absent.
    pub fn find_or_make_model(&mut self, class: &str) -> Result<&mut ModelType, SchemaError> {
        let name = match self.model_by_class(class) {
            Some(model) => model.name().to_string(),
            None => {
                let model = self
                    .create_model(class)
                    .ok_or_else(|| SchemaError::NoModelForClass(class.to_string()))?;
                let model_type = ModelType::new(model, &self.context)?;
                let name = model_type.name().to_string();
                self.add_model(model_type)?;
                name
            }
        };
        self.models
            .get_mut(&name)
            .ok_or_else(|| SchemaError::NoModelForClass(class.to_string()))
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    pub fn get_type_mut(&mut self, name: &str) -> Option<&mut ObjectType> {
        self.types.get_mut(name)
    }

    #[must_use]
    pub fn get_model(&self, name: &str) -> Option<&ModelType> {
        self.models.get(name)
    }

    pub fn get_model_mut(&mut self, name: &str) -> Option<&mut ModelType> {
        self.models.get_mut(name)
    }

    #[must_use]
    pub fn get_interface(&self, name: &str) -> Option<&InterfaceType> {
        self.interfaces.get(name)
    }

    #[must_use]
    pub fn get_union(&self, name: &str) -> Option<&UnionType> {
        self.unions.get(name)
    }

    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&EnumType> {
        self.enums.get(name)
    }

    #[must_use]
    pub fn get_scalar(&self, name: &str) -> Option<&ScalarType> {
        self.scalars.get(name)
    }

    #[must_use]
    pub fn get_query_type(&self) -> &ObjectType {
        &self.query_type
    }

    pub fn get_query_type_mut(&mut self) -> &mut ObjectType {
        &mut self.query_type
    }

    #[must_use]
    pub fn get_mutation_type(&self) -> &ObjectType {
        &self.mutation_type
    }

    pub fn get_mutation_type_mut(&mut self) -> &mut ObjectType {
        &mut self.mutation_type
    }

    pub fn types(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.values()
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelType> {
        self.models.values()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceType> {
        self.interfaces.values()
    }

    pub fn unions(&self) -> impl Iterator<Item = &UnionType> {
        self.unions.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumType> {
        self.enums.values()
    }

    pub fn scalars(&self) -> impl Iterator<Item = &ScalarType> {
        self.scalars.values()
    }

    pub fn remove_type(&mut self, name: &str) -> Option<ObjectType> {
        self.types.remove(name)
    }

    pub fn remove_model(&mut self, name: &str) -> Option<ModelType> {
        self.models.remove(name)
    }

    /// Whether any namespace holds a component with this name.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.types.contains_key(name)
            || self.models.contains_key(name)
            || self.interfaces.contains_key(name)
            || self.unions.contains_key(name)
            || self.enums.contains_key(name)
            || self.scalars.contains_key(name)
    }

    /// Types implementing an interface.
    pub fn implementors_of<'a>(&'a self, interface: &'a str) -> impl Iterator<Item = &'a ObjectType> {
        self.types.values().filter(move |ty| ty.implements(interface))
    }

    /// The model registered for a domain class.
    #[must_use]
    pub fn model_by_class(&self, class: &str) -> Option<&ModelType> {
        self.models.values().find(|m| m.source_class() == class)
    }

    /// Create a model capability for a domain class through the context.
    #[must_use]
    pub fn create_model(&self, class: &str) -> Option<Arc<dyn SchemaModel>> {
        self.context.create_model(class)
    }

    /// Type name a domain class is (or would be) exposed under.
    ///
    /// Models in this schema win, then the mapping of the last persisted
    /// build, then a freshly created model. `None` if the class is not
    /// eligible.
    pub fn get_type_name_for_class(&self, class: &str) -> Result<Option<String>, SchemaError> {
        if let Some(model) = self.model_by_class(class) {
            return Ok(Some(model.name().to_string()));
        }
        if let Some(name) = self.store.get_type_mapping()?.remove(class) {
            return Ok(Some(name));
        }
        Ok(self.create_model(class).map(|m| m.type_name()))
    }

    // =========================================================================
    // STORE
    // =========================================================================

    /// Whether a build has been persisted for this key.
    pub fn is_stored(&self) -> Result<bool, SchemaError> {
        match self.store.get_schema() {
            Ok(_) => Ok(true),
            Err(SchemaError::SchemaNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The last persisted build.
    pub fn fetch(&self) -> Result<SchemaGraph, SchemaError> {
        self.store.get_schema()
    }
}

/// Insert `component`, or merge it into the existing one of the same name.
fn merge_into<C: Component>(map: &mut BTreeMap<String, C>, component: C) {
    match map.get_mut(component.name()) {
        Some(existing) => existing.merge(component),
        None => {
            map.insert(component.name().to_string(), component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassCatalog;
    use crate::storage::MemoryStoreFactory;
    use serde_json::json;

    fn schema() -> Schema {
        let catalog = ClassCatalog::from_value(&json!({
            "App\\Post": {"fields": {"title": "String", "author": {"relation": "App\\Author"}}},
            "App\\Author": {"type": "Writer", "fields": {"name": "String"}}
        }))
        .expect("catalog");
        let context = SchemaContext::new().with_model_creator(Arc::new(catalog));
        Schema::new("test", context, &MemoryStoreFactory::new()).expect("schema")
    }

    #[test]
    fn add_type_merges() {
        let mut schema = schema();
        schema
            .add_type(ObjectType::new("Post").with_field(Field::typed("id", "ID!")))
            .expect("first");
        schema
            .add_type(ObjectType::new("Post").with_field(Field::typed("title", "String")))
            .expect("second");
        assert_eq!(schema.get_type("Post").map(ObjectType::field_count), Some(2));
    }

    #[test]
    fn add_rejects_invalid_names() {
        let mut schema = schema();
        assert_eq!(
            schema.add_type(ObjectType::new("Bad Name")).expect_err("invalid"),
            SchemaError::InvalidName("Bad Name".into())
        );
        assert!(schema.find_or_make_enum("1st").is_err());
    }

    #[test]
    fn find_or_make_type_is_a_lookup_the_second_time() {
        let mut schema = schema();
        schema
            .find_or_make_type("Widget")
            .expect("make")
            .add_field(Field::typed("size", "Int"));
        let again = schema.find_or_make_type("Widget").expect("find");
        assert_eq!(again.field_count(), 1);
        assert_eq!(schema.types().count(), 1);
    }

    #[test]
    fn model_relations_cascade_extra_models() {
        let mut schema = schema();
        schema
            .add_model_by_class_name("App\\Post", |model, context| {
                model.add_field_by_name("author", context)
            })
            .expect("add");

        assert!(schema.get_model("Post").is_some());
        assert!(schema.get_model("Writer").is_some());
        assert_eq!(
            schema
                .get_model("Post")
                .and_then(|m| m.field("author"))
                .and_then(|f| f.field().type_ref()),
            Some("Writer")
        );
    }

    #[test]
    fn find_or_make_model_by_class() {
        let mut schema = schema();
        schema.find_or_make_model("App\\Post").expect("make");
        schema.find_or_make_model("App\\Post").expect("find");
        assert_eq!(schema.models().count(), 1);
        assert_eq!(
            schema.find_or_make_model("App\\Missing").expect_err("missing"),
            SchemaError::NoModelForClass("App\\Missing".into())
        );
    }

    #[test]
    fn type_name_for_class_prefers_registered_models() {
        let mut schema = schema();
        assert_eq!(
            schema.get_type_name_for_class("App\\Author").expect("lookup"),
            Some("Writer".to_string())
        );
        assert_eq!(schema.get_type_name_for_class("App\\Missing").expect("lookup"), None);

        schema
            .add_model_by_class_name("App\\Post", |_, _| Ok(()))
            .expect("add");
        schema.get_model_mut("Post").expect("post").set_description("Blog post");
        assert_eq!(
            schema.get_type_name_for_class("App\\Post").expect("lookup"),
            Some("Post".to_string())
        );
    }

    #[test]
    fn exists_spans_namespaces() {
        let mut schema = schema();
        schema.find_or_make_scalar("Date").expect("scalar");
        assert!(schema.exists("Date"));
        assert!(!schema.exists("Time"));
    }

    #[test]
    fn implementors_of_interface() {
        let mut schema = schema();
        let mut post = ObjectType::new("Post").with_field(Field::typed("id", "ID!"));
        post.add_interface("Node");
        schema.add_type(post).expect("post");
        schema
            .add_type(ObjectType::new("Tag").with_field(Field::typed("id", "ID!")))
            .expect("tag");

        let names: Vec<&str> = schema.implementors_of("Node").map(|t| t.name()).collect();
        assert_eq!(names, vec!["Post"]);
    }

    #[test]
    fn not_stored_before_first_build() {
        assert!(!schema().is_stored().expect("is_stored"));
    }
}
