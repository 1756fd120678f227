//! # Storage Gateways
//!
//! A `StoreFactory` hands out one `SchemaStore` per schema key. The store
//! persists compiled graphs and answers whether a build exists and which
//! type name each domain class was exposed under.
//!
//! Two implementations:
//! - `MemoryStoreFactory`: shared in-process map, for tests and dry runs
//! - `RedbStoreFactory`: redb file, one atomic write transaction per persist

mod memory;
mod redb_store;

pub use memory::{MemoryStore, MemoryStoreFactory};
pub use redb_store::{RedbSchemaStore, RedbStoreFactory};

use crate::{SchemaError, SchemaGraph};
use std::collections::BTreeMap;

/// Persistent storage for one schema key.
pub trait SchemaStore: Send + Sync {
    /// The schema key this store serves.
    fn key(&self) -> &str;

    /// Persist a compiled graph, replacing any previous build.
    fn persist_schema(&self, graph: &SchemaGraph) -> Result<(), SchemaError>;

    /// Fetch the last persisted graph.
    ///
    /// Fails with `SchemaNotFound` if nothing was persisted yet.
    fn get_schema(&self) -> Result<SchemaGraph, SchemaError>;

    /// Domain class → type name of the last persisted build.
    ///
    /// Empty if nothing was persisted yet.
    fn get_type_mapping(&self) -> Result<BTreeMap<String, String>, SchemaError>;
}

/// Creates stores by schema key.
pub trait StoreFactory {
    fn create_store(&self, key: &str) -> Result<Box<dyn SchemaStore>, SchemaError>;
}
