//! # Components
//!
//! The named, mergeable, pluggable and self-validating units a schema is
//! assembled from.
//!
//! Merging is additive: sub-elements (fields, arguments, interfaces, union
//! members, enum values, plugin bindings) from both sides survive, and for a
//! conflicting definition of the same sub-element the later contribution
//! wins.

mod enums;
mod field;
mod interface;
mod model;
mod object;
mod scalar;
mod union;

pub use enums::{EnumType, EnumValue};
pub use field::{Argument, Field};
pub use interface::InterfaceType;
pub use model::{
    CompiledModel, ExtraType, ModelField, ModelOperation, ModelOperationKind, ModelType,
    OperationConfig,
};
pub use object::ObjectType;
pub use scalar::ScalarType;
pub use union::UnionType;

use crate::SchemaError;
use crate::plugin::PluginBindings;

/// Capabilities shared by every component.
pub trait Component {
    /// Identity key within the component's map.
    fn name(&self) -> &str;

    /// Configured plugin bindings, in application order.
    fn plugins(&self) -> &PluginBindings;

    fn plugins_mut(&mut self) -> &mut PluginBindings;

    /// Fold `other` into `self`.
    fn merge(&mut self, other: Self)
    where
        Self: Sized;

    /// Check the component's own invariants.
    fn validate(&self) -> Result<(), SchemaError>;
}

/// Last-write for optional scalar attributes during a merge.
fn merge_option<T>(target: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *target = other;
    }
}
