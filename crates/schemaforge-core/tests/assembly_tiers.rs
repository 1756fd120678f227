//! # Assembly Tier Tests (T0-T4)
//!
//! End-to-end behaviour of schema assembly through the public API.
//!
//! ## Tiers
//! - T0: Ingestion and merging
//! - T1: Validation
//! - T2: Plugin pass
//! - T3: Model expansion
//! - T4: Persistence

use schemaforge_core::{
    ClassCatalog, Component, ComponentPlugin, Field, MemoryStoreFactory, ObjectType, OperationConfig,
    Plugin, PluginConfig, PluginError, PluginRegistry, PluginTarget, Schema, SchemaContext, SchemaError,
    SchemaUpdater,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn catalog() -> ClassCatalog {
    ClassCatalog::from_value(&json!({
        "App\\Post": {"fields": {
            "title": "String!",
            "body": "String",
            "author": {"relation": "App\\Author"}
        }},
        "App\\Author": {"type": "Writer", "fields": {"name": "String"}}
    }))
    .expect("catalog")
}

fn schema_with(registry: PluginRegistry, factory: &MemoryStoreFactory) -> Schema {
    let context = SchemaContext::new()
        .with_plugins(registry)
        .with_model_creator(Arc::new(catalog()));
    Schema::new("tiers", context, factory).expect("schema")
}

fn schema() -> Schema {
    schema_with(PluginRegistry::new(), &MemoryStoreFactory::new())
}

// =============================================================================
// TIER T0: INGESTION AND MERGING
// =============================================================================

mod t0_ingestion {
    use super::*;

    /// T0.1: Fields contributed by separate fragments accumulate.
    #[test]
    fn fragments_merge_additively() {
        let mut schema = schema();
        schema
            .apply_config(&json!({"types": {"Post": {"fields": {"id": "ID!"}}}}))
            .expect("first");
        schema
            .apply_config(&json!({"types": {"Post": {"fields": {"title": "String", "id": "ID"}}}}))
            .expect("second");

        let post = schema.get_type("Post").expect("post");
        assert_eq!(post.field_count(), 2);
        assert_eq!(post.field("id").and_then(|f| f.type_ref()), Some("ID"));
    }

    /// T0.2: An enum redefined without values fails at ingestion.
    #[test]
    fn empty_enum_redefinition_fails() {
        let mut schema = schema();
        schema
            .apply_config(&json!({"enums": {"Status": {"values": ["DRAFT", "LIVE"]}}}))
            .expect("first");

        let err = schema
            .apply_config(&json!({"enums": {"Status": {"values": []}}}))
            .expect_err("empty values");
        assert_eq!(err, SchemaError::EnumMissingValues("Status".into()));
        assert_eq!(schema.get_enum("Status").map(|e| e.values().count()), Some(2));
    }

    /// T0.3: find_or_make returns the same component on repeated calls.
    #[test]
    fn find_or_make_type_is_idempotent() {
        let mut schema = schema();
        schema
            .find_or_make_type("Post")
            .expect("first")
            .add_field(Field::typed("id", "ID!"));
        let again = schema.find_or_make_type("Post").expect("second");

        assert_eq!(again.field_count(), 1);
        assert_eq!(schema.types().count(), 1);
    }

    /// T0.4: Unknown sections are rejected before anything is merged.
    #[test]
    fn unknown_section_rejected() {
        let mut schema = schema();
        let err = schema
            .apply_config(&json!({"types": {"Post": {"fields": {"id": "ID"}}}, "subscriptions": {}}))
            .expect_err("unknown");
        assert!(matches!(err, SchemaError::InvalidConfigShape { .. }));
        assert!(schema.get_type("Post").is_none());
    }

    /// T0.5: Section order inside a fragment does not matter.
    #[test]
    fn execute_sees_types_from_the_same_fragment() {
        struct RequirePost;
        impl Plugin for RequirePost {
            fn identifier(&self) -> &str {
                "requirePost"
            }
            fn as_schema_updater(&self) -> Option<&dyn SchemaUpdater> {
                Some(self)
            }
        }
        impl SchemaUpdater for RequirePost {
            fn update_schema(&self, schema: &mut Schema) -> Result<(), SchemaError> {
                schema
                    .get_type_mut("Post")
                    .ok_or_else(|| SchemaError::InvalidComponent {
                        component: "Post".into(),
                        message: "missing".into(),
                    })?
                    .set_description("seen");
                Ok(())
            }
        }

        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(RequirePost));
        let mut schema = schema_with(registry, &MemoryStoreFactory::new());
        schema
            .apply_config(&json!({
                "execute": ["requirePost"],
                "types": {"Post": {"fields": {"id": "ID"}}}
            }))
            .expect("apply");
        assert_eq!(schema.get_type("Post").and_then(|t| t.description()), Some("seen"));
    }
}

// =============================================================================
// TIER T1: VALIDATION
// =============================================================================

mod t1_validation {
    use super::*;

    /// T1.1: A type and an enum sharing a name collide.
    #[test]
    fn type_enum_collision() {
        let mut schema = schema();
        schema
            .apply_config(&json!({
                "types": {"Foo": {"fields": {"id": "ID"}}},
                "enums": {"Foo": {"values": ["A"]}},
                "queries": {"foo": "Foo"}
            }))
            .expect("apply");

        assert_eq!(
            schema.save().expect_err("collision"),
            SchemaError::DuplicateTypeName(vec!["Foo".into()])
        );
    }

    /// T1.2: A schema without types is empty.
    #[test]
    fn no_types_is_empty() {
        let mut schema = schema();
        schema
            .apply_config(&json!({"queries": {"ping": "String"}}))
            .expect("apply");
        assert!(matches!(schema.save(), Err(SchemaError::EmptySchema(_))));
    }

    /// T1.3: A schema without queries is empty.
    #[test]
    fn no_queries_is_empty() {
        let mut schema = schema();
        schema
            .apply_config(&json!({"types": {"Post": {"fields": {"id": "ID"}}}}))
            .expect("apply");
        assert!(matches!(schema.save(), Err(SchemaError::EmptySchema(_))));
    }

    /// T1.4: Field types are checked.
    #[test]
    fn malformed_field_type_rejected() {
        let mut schema = schema();
        schema
            .apply_config(&json!({
                "types": {"Post": {"fields": {"tags": "[String"}}},
                "queries": {"posts": "[Post]"}
            }))
            .expect("apply");
        assert!(matches!(
            schema.save(),
            Err(SchemaError::InvalidComponent { ref component, .. }) if component.starts_with("Post")
        ));
    }
}

// =============================================================================
// TIER T2: PLUGIN PASS
// =============================================================================

mod t2_plugins {
    use super::*;

    /// Adds an `AuditLog` type whose field carries the `stamp` plugin.
    struct Audit;

    impl Plugin for Audit {
        fn identifier(&self) -> &str {
            "audit"
        }

        fn as_schema_updater(&self) -> Option<&dyn SchemaUpdater> {
            Some(self)
        }
    }

    impl SchemaUpdater for Audit {
        fn update_schema(&self, schema: &mut Schema) -> Result<(), SchemaError> {
            let mut at = Field::typed("at", "String!");
            at.plugins_mut().add("stamp", PluginConfig::new());
            schema.add_type(ObjectType::new("AuditLog").with_field(at))
        }
    }

    /// Describes fields; refuses anything else.
    struct Stamp;

    impl Plugin for Stamp {
        fn identifier(&self) -> &str {
            "stamp"
        }

        fn as_component_plugin(&self) -> Option<&dyn ComponentPlugin> {
            Some(self)
        }
    }

    impl ComponentPlugin for Stamp {
        fn apply(
            &self,
            target: PluginTarget<'_>,
            _schema: &mut Schema,
            config: &PluginConfig,
        ) -> Result<(), PluginError> {
            match target {
                PluginTarget::Field { field, .. } => {
                    let text = config
                        .get("text")
                        .and_then(|v| v.as_str())
                        .unwrap_or("stamped");
                    field.set_description(text);
                    Ok(())
                }
                _ => Err(PluginError::UnsupportedTarget),
            }
        }
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(Audit));
        registry.register(Arc::new(Stamp));
        registry
    }

    /// T2.1: Components added by an updater are processed in the same build.
    #[test]
    fn updater_additions_are_processed() {
        let mut schema = schema_with(registry(), &MemoryStoreFactory::new());
        schema
            .apply_config(&json!({
                "types": {"Post": {"fields": {"id": "ID"}, "plugins": {"audit": true}}},
                "queries": {"posts": "[Post]"}
            }))
            .expect("apply");

        let graph = schema.save().expect("save");
        let at = graph
            .get_type("AuditLog")
            .and_then(|t| t.field("at"))
            .expect("AuditLog.at");
        assert_eq!(at.description(), Some("stamped"));
    }

    /// T2.2: Plugin config is passed through to the plugin.
    #[test]
    fn binding_config_reaches_plugin() {
        let mut schema = schema_with(registry(), &MemoryStoreFactory::new());
        schema
            .apply_config(&json!({
                "types": {"Post": {"fields": {"title": {"type": "String", "plugins": {"stamp": {"text": "Headline"}}}}}},
                "queries": {"posts": "[Post]"}
            }))
            .expect("apply");

        let graph = schema.save().expect("save");
        let title = graph.get_type("Post").and_then(|t| t.field("title")).expect("title");
        assert_eq!(title.description(), Some("Headline"));
    }

    /// T2.3: A field plugin bound to a type is a category mismatch.
    #[test]
    fn category_mismatch_names_plugin_component_and_category() {
        let mut schema = schema_with(registry(), &MemoryStoreFactory::new());
        schema
            .apply_config(&json!({
                "types": {"Post": {"fields": {"id": "ID"}, "plugins": {"stamp": true}}},
                "queries": {"posts": "[Post]"}
            }))
            .expect("apply");

        assert_eq!(
            schema.save().expect_err("mismatch"),
            SchemaError::PluginCategoryMismatch {
                plugin: "stamp".into(),
                component: "Post".into(),
                category: "types".into(),
            }
        );
    }

    /// T2.4: Binding an unregistered plugin fails at ingestion.
    #[test]
    fn unknown_plugin_rejected_at_ingestion() {
        let mut schema = schema_with(registry(), &MemoryStoreFactory::new());
        let err = schema
            .apply_config(&json!({"types": {"Post": {"fields": {"id": "ID"}, "plugins": {"ghost": true}}}}))
            .expect_err("unknown plugin");
        assert_eq!(err, SchemaError::UnknownPlugin("ghost".into()));
    }

    /// Adds a type named `adds`, bound to the `next` updater if there is one.
    struct Chain {
        id: &'static str,
        adds: &'static str,
        next: Option<&'static str>,
        runs: Arc<AtomicUsize>,
    }

    impl Plugin for Chain {
        fn identifier(&self) -> &str {
            self.id
        }

        fn as_schema_updater(&self) -> Option<&dyn SchemaUpdater> {
            Some(self)
        }
    }

    impl SchemaUpdater for Chain {
        fn update_schema(&self, schema: &mut Schema) -> Result<(), SchemaError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let mut ty = ObjectType::new(self.adds).with_field(Field::typed("id", "ID!"));
            if let Some(next) = self.next {
                ty.plugins_mut().add(next, PluginConfig::new());
            }
            schema.add_type(ty)
        }
    }

    /// T2.5: Updaters chained three deep each run exactly once.
    #[test]
    fn chained_updaters_reach_a_fixed_point() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new();
        for (id, adds, next) in [
            ("first", "FirstLog", Some("second")),
            ("second", "SecondLog", Some("third")),
            ("third", "ThirdLog", None),
        ] {
            registry.register(Arc::new(Chain {
                id,
                adds,
                next,
                runs: Arc::clone(&runs),
            }));
        }

        let mut schema = schema_with(registry, &MemoryStoreFactory::new());
        schema
            .apply_config(&json!({
                "types": {"Post": {"fields": {"id": "ID"}, "plugins": {"first": true}}},
                "queries": {"posts": "[Post]"}
            }))
            .expect("apply");

        let graph = schema.save().expect("save");
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        for name in ["FirstLog", "SecondLog", "ThirdLog"] {
            assert!(graph.get_type(name).is_some(), "{} missing", name);
        }
    }

    /// T2.6: A disabled binding is never loaded.
    #[test]
    fn disabled_binding_is_ignored() {
        let mut schema = schema_with(registry(), &MemoryStoreFactory::new());
        schema
            .apply_config(&json!({
                "types": {"Post": {"fields": {"id": "ID"}, "plugins": {"stamp": false, "ghost": false}}},
                "queries": {"posts": "[Post]"}
            }))
            .expect("apply");
        assert!(schema.save().is_ok());
    }
}

// =============================================================================
// TIER T3: MODEL EXPANSION
// =============================================================================

mod t3_models {
    use super::*;

    /// T3.1: Operations become root fields named after the model.
    #[test]
    fn operations_expand_into_root_fields() {
        let mut schema = schema();
        schema
            .apply_config(&json!({
                "models": {"App\\Post": {"fields": {"title": true}, "operations": {"*": true}}}
            }))
            .expect("apply");

        let graph = schema.save().expect("save");
        let query = graph.query_type().expect("Query");
        let mutation = graph.mutation_type().expect("Mutation");
        assert!(query.field("readPosts").is_some());
        assert!(query.field("readOnePost").is_some());
        assert!(mutation.field("createPost").is_some());
        assert!(mutation.field("updatePost").is_some());
        assert!(mutation.field("deletePosts").is_some());
        assert_eq!(
            query.field("readPosts").and_then(|f| f.resolver()),
            Some("catalog.read")
        );
    }

    /// T3.2: Relations pull in the related model under its own type name.
    #[test]
    fn relation_adds_related_model() {
        let mut schema = schema();
        schema
            .apply_config(&json!({
                "models": {"App\\Post": {"fields": {"author": true}, "operations": {"read": true}}}
            }))
            .expect("apply");

        let graph = schema.save().expect("save");
        assert!(graph.get_type("Writer").is_some());
        assert_eq!(
            graph.get_type("Post").and_then(|t| t.field("author")).and_then(|f| f.type_ref()),
            Some("Writer")
        );
        assert_eq!(graph.type_for_class("App\\Author"), Some("Writer"));
    }

    /// T3.3: Unknown operations are rejected.
    #[test]
    fn unknown_operation_rejected() {
        let mut schema = schema();
        let result = schema
            .apply_config(&json!({"models": {"App\\Post": {"operations": {"archive": true}}}}))
            .and_then(|()| schema.save().map(|_| ()));
        assert_eq!(
            result.expect_err("unknown operation"),
            SchemaError::InvalidModelOperation {
                model: "Post".into(),
                operation: "archive".into(),
            }
        );
    }

    /// Describes root query fields as `marked`.
    struct Mark;

    impl Plugin for Mark {
        fn identifier(&self) -> &str {
            "mark"
        }

        fn as_component_plugin(&self) -> Option<&dyn ComponentPlugin> {
            Some(self)
        }
    }

    impl ComponentPlugin for Mark {
        fn apply(
            &self,
            target: PluginTarget<'_>,
            _schema: &mut Schema,
            _config: &PluginConfig,
        ) -> Result<(), PluginError> {
            match target {
                PluginTarget::Query(field) => {
                    field.set_description("marked");
                    Ok(())
                }
                _ => Err(PluginError::UnsupportedTarget),
            }
        }
    }

    fn read_posts_description(fragments: &[serde_json::Value]) -> Option<String> {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(Mark));
        let mut schema = schema_with(registry, &MemoryStoreFactory::new());
        for fragment in fragments {
            schema.apply_config(fragment).expect("apply");
        }
        let graph = schema.save().expect("save");
        graph
            .query_type()
            .and_then(|q| q.field("readPosts"))
            .and_then(|f| f.description())
            .map(str::to_string)
    }

    /// T3.4: modelConfig defaults apply no matter which fragment brings them.
    #[test]
    fn model_config_in_a_later_fragment_applies() {
        let models = json!({"models": {"App\\Post": {"operations": {"read": true}}}});
        let model_config = json!({"config": {"modelConfig": {"catalog": {
            "operations": {"read": {"plugins": {"mark": true}}}
        }}}});
        let mut combined = models.clone();
        combined["config"] = model_config["config"].clone();

        let together = read_posts_description(&[combined]);
        let later = read_posts_description(&[models, model_config]);
        assert_eq!(together.as_deref(), Some("marked"));
        assert_eq!(later, together);
    }

    /// T3.5: Models can be added through a builder callback.
    #[test]
    fn add_model_by_class_name() {
        let mut schema = schema();
        schema
            .add_model_by_class_name("App\\Post", |model, context| {
                model.add_field_by_name("body", context)?;
                model.configure_operation("read", OperationConfig::enabled());
                Ok(())
            })
            .expect("add");

        let post = schema.get_model("Post").expect("model");
        assert!(post.field("body").is_some());
        assert_eq!(schema.get_type_name_for_class("App\\Post").expect("lookup"), Some("Post".into()));
    }
}

// =============================================================================
// TIER T4: PERSISTENCE
// =============================================================================

mod t4_persistence {
    use super::*;
    use schemaforge_core::RedbStoreFactory;

    fn config() -> serde_json::Value {
        json!({
            "types": {"Post": {"fields": {"id": "ID!", "title": "String"}}},
            "queries": {"posts": "[Post]"}
        })
    }

    /// T4.1: A fresh schema on the same key sees the stored build.
    #[test]
    fn stored_after_save_across_instances() {
        let factory = MemoryStoreFactory::new();
        let mut first = schema_with(PluginRegistry::new(), &factory);
        assert!(!first.is_stored().expect("is_stored"));

        first.apply_config(&config()).expect("apply");
        let saved = first.save().expect("save");

        let second = schema_with(PluginRegistry::new(), &factory);
        assert!(second.is_stored().expect("is_stored"));
        assert_eq!(second.fetch().expect("fetch"), saved);
    }

    /// T4.2: Builds survive reopening a redb database.
    #[test]
    fn redb_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schemas.redb");

        let saved = {
            let factory = RedbStoreFactory::open(&path).expect("open");
            let context = SchemaContext::new().with_model_creator(Arc::new(catalog()));
            let mut schema = Schema::new("tiers", context, &factory).expect("schema");
            schema
                .apply_config(&json!({"models": {"App\\Post": {"operations": {"read": true}}}}))
                .expect("apply");
            schema.save().expect("save")
        };

        let factory = RedbStoreFactory::open(&path).expect("reopen");
        let schema = Schema::new("tiers", SchemaContext::new(), &factory).expect("schema");
        assert_eq!(schema.fetch().expect("fetch"), saved);
        assert_eq!(
            schema.get_type_name_for_class("App\\Post").expect("mapping"),
            Some("Post".into())
        );
    }

    /// T4.3: Keys are isolated.
    #[test]
    fn keys_are_isolated() {
        let factory = MemoryStoreFactory::new();
        let mut schema = schema_with(PluginRegistry::new(), &factory);
        schema.apply_config(&config()).expect("apply");
        schema.save().expect("save");

        let other = Schema::new("other", SchemaContext::new(), &factory).expect("schema");
        assert!(!other.is_stored().expect("is_stored"));
        assert_eq!(factory.keys().expect("keys"), vec!["tiers".to_string()]);
    }
}
