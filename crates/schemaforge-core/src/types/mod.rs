//! # Core Type Definitions
//!
//! Shared definitions for the schemaforge engine:
//! - Error types (`SchemaError`, `PluginError`)
//! - Name validation (`validate_name`)
//!
//! ## Error Policy
//!
//! - No silent failures
//! - Every ingestion or build failure is fatal to the current call
//! - `SchemaNotFound` is the only soft error (see `Schema::is_stored`)

use crate::primitives::NAME_PATTERN;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while assembling, validating or persisting a schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A config value does not have the expected shape.
    #[error("Invalid config shape at '{path}': {message}")]
    InvalidConfigShape { path: String, message: String },

    /// A component name does not match `NAME_PATTERN`.
    #[error("Invalid name '{0}': names must match {NAME_PATTERN}")]
    InvalidName(String),

    /// An enum definition has no values.
    #[error("Enum '{0}' must define a non-empty 'values' list")]
    EnumMissingValues(String),

    /// A procedural update identifier resolved to a plugin without the
    /// schema updater capability.
    #[error("Plugin '{0}' is not a schema updater")]
    NotASchemaUpdater(String),

    /// A model produced (or was configured with) an unknown operation.
    #[error("Invalid operation '{operation}' on model '{model}'")]
    InvalidModelOperation { model: String, operation: String },

    /// A component plugin failed while applying to a component.
    #[error("Plugin '{plugin}' failed on '{component}': {message}")]
    PluginApplicationFailure {
        plugin: String,
        component: String,
        message: String,
    },

    /// A component plugin does not handle the kind of component it was given.
    #[error("Plugin '{plugin}' does not apply to '{component}' while processing {category}")]
    PluginCategoryMismatch {
        plugin: String,
        component: String,
        category: String,
    },

    /// A plugin identifier is not in the registry.
    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    /// No model creator accepts the given domain class.
    #[error("No model available for class '{0}'")]
    NoModelForClass(String),

    /// Two or more components share a name across the type namespaces.
    #[error("Duplicate type names: {}", .0.join(", "))]
    DuplicateTypeName(Vec<String>),

    /// The graph has no types or the root query has no fields.
    #[error("Schema is empty: {0}")]
    EmptySchema(String),

    /// Nothing has been persisted yet for the schema key.
    #[error("No stored schema for key '{0}'")]
    SchemaNotFound(String),

    /// A component failed its own validation.
    #[error("Invalid component '{component}': {message}")]
    InvalidComponent { component: String, message: String },

    /// The storage gateway failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl SchemaError {
    /// Shorthand for `InvalidConfigShape`.
    pub fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigShape {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Shorthand for `InvalidComponent`.
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by component plugins.
///
/// The engine adds plugin and component context when it turns these into
/// a `SchemaError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The plugin does not handle this kind of component.
    #[error("plugin does not apply to this component")]
    UnsupportedTarget,

    /// The plugin could not build what it was configured to build.
    #[error("{0}")]
    Build(String),
}

impl From<SchemaError> for PluginError {
    fn from(e: SchemaError) -> Self {
        Self::Build(e.to_string())
    }
}

// =============================================================================
// NAMES
// =============================================================================

static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(NAME_PATTERN).unwrap()
});

/// Check whether a name is a valid schema identifier.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

/// Validate a schema identifier.
///
/// Returns `SchemaError::InvalidName` if it does not match `NAME_PATTERN`.
pub fn validate_name(name: &str) -> Result<(), SchemaError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
