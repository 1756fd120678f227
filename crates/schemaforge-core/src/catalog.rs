//! # Class Catalog
//!
//! A declarative `ModelCreator`: domain classes and their fields are listed
//! up front instead of being introspected.
//!
//! ```toml
//! ["App\\Post"]
//! fields = { title = "String!", author = { relation = "App\\Author" } }
//!
//! ["App\\Author"]
//! type = "Writer"
//! fields = { name = "String" }
//! ```
//!
//! Every class gets an implicit `id: ID!` field, which is also its only
//! default field.

use crate::context::{ModelCreator, ModelFieldInfo, Relation, SchemaContext, SchemaModel};
use crate::primitives::CATALOG_MODEL_IDENTIFIER;
use crate::SchemaError;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const ID_FIELD: &str = "id";

/// One field of a catalog class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CatalogField {
    /// A scalar field with its type reference.
    Scalar(String),
    /// A relation to another class.
    Relation {
        relation: String,
        #[serde(default)]
        many: bool,
    },
}

/// Description of one domain class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDescriptor {
    /// Overrides the type name derived from the class name.
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, CatalogField>,
}

/// Class name → descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ClassCatalog {
    classes: BTreeMap<String, ClassDescriptor>,
}

impl ClassCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from a config value.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value.clone())
            .map_err(|e| SchemaError::Serialization(format!("invalid class catalog: {}", e)))
    }

    /// Builder-style: add or replace a class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>, descriptor: ClassDescriptor) -> Self {
        self.classes.insert(class.into(), descriptor);
        self
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ModelCreator for ClassCatalog {
    fn create_model(&self, class: &str, _context: &SchemaContext) -> Option<Arc<dyn SchemaModel>> {
        let descriptor = self.classes.get(class)?;
        Some(Arc::new(CatalogModel {
            class: class.to_string(),
            descriptor: descriptor.clone(),
        }))
    }
}

/// The model of one catalog class.
#[derive(Debug, Clone)]
struct CatalogModel {
    class: String,
    descriptor: ClassDescriptor,
}

impl SchemaModel for CatalogModel {
    fn identifier(&self) -> &str {
        CATALOG_MODEL_IDENTIFIER
    }

    fn source_class(&self) -> &str {
        &self.class
    }

    fn type_name(&self) -> String {
        self.descriptor
            .type_name
            .clone()
            .unwrap_or_else(|| short_class_name(&self.class).to_string())
    }

    fn field(&self, name: &str) -> Option<ModelFieldInfo> {
        match self.descriptor.fields.get(name) {
            Some(CatalogField::Scalar(type_ref)) => Some(ModelFieldInfo {
                type_ref: type_ref.clone(),
                relation: None,
            }),
            Some(CatalogField::Relation { relation, many }) => Some(ModelFieldInfo {
                type_ref: String::new(),
                relation: Some(Relation {
                    class: relation.clone(),
                    many: *many,
                }),
            }),
            None if name == ID_FIELD => Some(ModelFieldInfo {
                type_ref: "ID!".to_string(),
                relation: None,
            }),
            None => None,
        }
    }

    fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.descriptor.fields.keys().cloned().collect();
        if !self.descriptor.fields.contains_key(ID_FIELD) {
            names.insert(0, ID_FIELD.to_string());
        }
        names
    }

    fn default_field_names(&self) -> Vec<String> {
        vec![ID_FIELD.to_string()]
    }
}

/// Last segment of a namespaced class name (`App\Models\Post` → `Post`).
#[must_use]
pub fn short_class_name(class: &str) -> &str {
    class
        .rsplit(['\\', '/', '.', ':'])
        .next()
        .unwrap_or(class)
}
