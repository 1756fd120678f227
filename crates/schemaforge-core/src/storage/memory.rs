//! In-memory storage gateway.
//!
//! Graphs are kept in their encoded form so a fetch behaves like a read
//! from disk: every `get_schema` decodes a fresh copy.

use super::{SchemaStore, StoreFactory};
use crate::formats::{graph_from_bytes, graph_to_bytes};
use crate::{SchemaError, SchemaGraph};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

type SharedSchemas = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

fn lock(schemas: &SharedSchemas) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>, SchemaError> {
    schemas
        .lock()
        .map_err(|_| SchemaError::Storage("memory store lock poisoned".to_string()))
}

/// Factory whose stores share one map, keyed by schema key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreFactory {
    schemas: SharedSchemas,
}

impl MemoryStoreFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys with a persisted build.
    pub fn keys(&self) -> Result<Vec<String>, SchemaError> {
        Ok(lock(&self.schemas)?.keys().cloned().collect())
    }
}

impl StoreFactory for MemoryStoreFactory {
    fn create_store(&self, key: &str) -> Result<Box<dyn SchemaStore>, SchemaError> {
        Ok(Box::new(MemoryStore {
            key: key.to_string(),
            schemas: Arc::clone(&self.schemas),
        }))
    }
}

/// Store for one key of a `MemoryStoreFactory`.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    key: String,
    schemas: SharedSchemas,
}

impl SchemaStore for MemoryStore {
    fn key(&self) -> &str {
        &self.key
    }

    fn persist_schema(&self, graph: &SchemaGraph) -> Result<(), SchemaError> {
        let bytes = graph_to_bytes(graph)?;
        lock(&self.schemas)?.insert(self.key.clone(), bytes);
        Ok(())
    }

    fn get_schema(&self) -> Result<SchemaGraph, SchemaError> {
        let schemas = lock(&self.schemas)?;
        let bytes = schemas
            .get(&self.key)
            .ok_or_else(|| SchemaError::SchemaNotFound(self.key.clone()))?;
        graph_from_bytes(bytes)
    }

    fn get_type_mapping(&self) -> Result<BTreeMap<String, String>, SchemaError> {
        match self.get_schema() {
            Ok(graph) => Ok(graph.type_mapping),
            Err(SchemaError::SchemaNotFound(_)) => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_share_the_factory_map() {
        let factory = MemoryStoreFactory::new();
        let writer = factory.create_store("blog").expect("writer");
        let reader = factory.create_store("blog").expect("reader");

        let mut graph = SchemaGraph::new("blog");
        graph.type_mapping.insert("App\\Post".into(), "Post".into());
        writer.persist_schema(&graph).expect("persist");

        assert_eq!(reader.get_schema().expect("get"), graph);
        assert_eq!(reader.get_type_mapping().expect("mapping").get("App\\Post").map(String::as_str), Some("Post"));
        assert_eq!(factory.keys().expect("keys"), vec!["blog".to_string()]);
    }

    #[test]
    fn missing_schema_is_not_found() {
        let store = MemoryStoreFactory::new().create_store("empty").expect("store");
        assert_eq!(
            store.get_schema().expect_err("missing"),
            SchemaError::SchemaNotFound("empty".into())
        );
        assert!(store.get_type_mapping().expect("mapping").is_empty());
    }
}
