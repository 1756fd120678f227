//! # schemaforge-core
//!
//! The schema assembly engine for schemaforge - THE LOGIC.
//!
//! This crate assembles a graph-query schema (types, fields, interfaces,
//! unions, enums, scalars, queries, mutations) from config fragments
//! contributed by independent sources, runs plugins over it, validates it,
//! and hands the result to a storage gateway.
//!
//! ## Layout
//!
//! - `components`: the named, mergeable, pluggable units
//! - `context`: per-schema settings and the model capability
//! - `plugin`: plugin contracts, bindings and the registry
//! - `schema`: the assembler (ingestion, model expansion, plugin pass,
//!   validation, save)
//! - `storage` / `formats`: persistence of compiled graphs
//! - `export`: SDL rendering and checksums
//!
//! ## Constraints
//!
//! - Deterministic: every component map is ordered
//! - Synchronous and single-threaded per build
//! - No network dependencies

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod components;
pub mod config;
pub mod context;
pub mod export;
pub mod formats;
pub mod graph;
pub mod plugin;
pub mod primitives;
pub mod schema;
pub mod storage;
pub mod type_ref;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{PluginError, SchemaError, is_valid_name, validate_name};

// =============================================================================
// RE-EXPORTS: Assembly
// =============================================================================

pub use catalog::{CatalogField, ClassCatalog, ClassDescriptor};
pub use components::{
    Argument, CompiledModel, Component, EnumType, EnumValue, ExtraType, Field, InterfaceType,
    ModelField, ModelOperation, ModelOperationKind, ModelType, ObjectType, OperationConfig,
    ScalarType, UnionType,
};
pub use config::ConfigMap;
pub use context::{
    DefaultPlugins, ModelCreator, ModelFieldInfo, Pluraliser, Relation, SchemaContext, SchemaModel,
    english_plural,
};
pub use graph::SchemaGraph;
pub use plugin::{
    ComponentPlugin, Plugin, PluginBinding, PluginBindings, PluginCategory, PluginConfig,
    PluginRegistry, PluginTarget, SchemaUpdater,
};
pub use schema::{BuildOptions, Schema};
pub use type_ref::TypeRef;

// =============================================================================
// RE-EXPORTS: Persistence & Export
// =============================================================================

pub use export::{checksum, print_sdl};
#[cfg(feature = "crypto-hash")]
pub use export::crypto_hash;
pub use formats::{PersistenceHeader, graph_from_bytes, graph_to_bytes};
pub use storage::{
    MemoryStore, MemoryStoreFactory, RedbSchemaStore, RedbStoreFactory, SchemaStore, StoreFactory,
};
