//! # redb-backed Schema Storage
//!
//! Persists compiled schemas in a redb database file.
//!
//! - ACID: a graph and its type mapping are written in one transaction
//! - Crash safety from redb's copy-on-write B-trees
//! - Concurrent readers, single writer
//!
//! ## Tables
//!
//! - `schemas`: schema key → encoded `SchemaGraph` (see `formats`)
//! - `type_mappings`: schema key → postcard-encoded class → type map

use super::{SchemaStore, StoreFactory};
use crate::formats::{graph_from_bytes, graph_to_bytes};
use crate::{SchemaError, SchemaGraph};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Table for schemas: key -> header + postcard payload
const SCHEMAS: TableDefinition<&str, &[u8]> = TableDefinition::new("schemas");

/// Table for type mappings: key -> postcard BTreeMap<String, String>
const TYPE_MAPPINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("type_mappings");

fn storage_err(e: impl std::fmt::Display) -> SchemaError {
    SchemaError::Storage(e.to_string())
}

/// Factory over one redb database file.
#[derive(Clone)]
pub struct RedbStoreFactory {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStoreFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStoreFactory").finish_non_exhaustive()
    }
}

impl RedbStoreFactory {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let db = Database::create(path.as_ref()).map_err(|e| SchemaError::Io(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(SCHEMAS).map_err(storage_err)?;
            let _ = write_txn.open_table(TYPE_MAPPINGS).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db: Arc::new(db) })
    }

    /// Keys with a persisted build, in order.
    pub fn keys(&self) -> Result<Vec<String>, SchemaError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(SCHEMAS).map_err(storage_err)?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (key, _) = entry.map_err(storage_err)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

impl StoreFactory for RedbStoreFactory {
    fn create_store(&self, key: &str) -> Result<Box<dyn SchemaStore>, SchemaError> {
        Ok(Box::new(RedbSchemaStore {
            db: Arc::clone(&self.db),
            key: key.to_string(),
        }))
    }
}

/// Store for one key of a `RedbStoreFactory`.
pub struct RedbSchemaStore {
    db: Arc<Database>,
    key: String,
}

impl std::fmt::Debug for RedbSchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSchemaStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SchemaStore for RedbSchemaStore {
    fn key(&self) -> &str {
        &self.key
    }

    fn persist_schema(&self, graph: &SchemaGraph) -> Result<(), SchemaError> {
        let graph_bytes = graph_to_bytes(graph)?;
        let mapping_bytes = postcard::to_stdvec(&graph.type_mapping)
            .map_err(|e| SchemaError::Serialization(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut schemas = write_txn.open_table(SCHEMAS).map_err(storage_err)?;
            schemas
                .insert(self.key.as_str(), graph_bytes.as_slice())
                .map_err(storage_err)?;
            let mut mappings = write_txn.open_table(TYPE_MAPPINGS).map_err(storage_err)?;
            mappings
                .insert(self.key.as_str(), mapping_bytes.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        tracing::debug!(key = %self.key, bytes = graph_bytes.len(), "persisted schema");
        Ok(())
    }

    fn get_schema(&self) -> Result<SchemaGraph, SchemaError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(SCHEMAS).map_err(storage_err)?;
        let data = table
            .get(self.key.as_str())
            .map_err(storage_err)?
            .ok_or_else(|| SchemaError::SchemaNotFound(self.key.clone()))?;
        graph_from_bytes(data.value())
    }

    fn get_type_mapping(&self) -> Result<BTreeMap<String, String>, SchemaError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TYPE_MAPPINGS).map_err(storage_err)?;
        match table.get(self.key.as_str()).map_err(storage_err)? {
            Some(data) => postcard::from_bytes(data.value())
                .map_err(|e| SchemaError::Serialization(e.to_string())),
            None => Ok(BTreeMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Field, ObjectType};
    use tempfile::TempDir;

    fn graph(key: &str) -> SchemaGraph {
        let mut graph = SchemaGraph::new(key);
        graph.insert_type(ObjectType::new("Query").with_field(Field::typed("hello", "String")));
        graph.type_mapping.insert("App\\Post".into(), "Post".into());
        graph
    }

    #[test]
    fn persist_and_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("schemas.redb");

        {
            let factory = RedbStoreFactory::open(&path).expect("open");
            let store = factory.create_store("blog").expect("store");
            store.persist_schema(&graph("blog")).expect("persist");
        }

        let factory = RedbStoreFactory::open(&path).expect("reopen");
        let store = factory.create_store("blog").expect("store");
        assert_eq!(store.get_schema().expect("get"), graph("blog"));
        assert_eq!(
            store.get_type_mapping().expect("mapping").get("App\\Post").map(String::as_str),
            Some("Post")
        );
        assert_eq!(factory.keys().expect("keys"), vec!["blog".to_string()]);
    }

    #[test]
    fn keys_are_isolated() {
        let dir = TempDir::new().expect("tempdir");
        let factory = RedbStoreFactory::open(dir.path().join("s.redb")).expect("open");
        factory
            .create_store("a")
            .expect("a")
            .persist_schema(&graph("a"))
            .expect("persist");

        let other = factory.create_store("b").expect("b");
        assert_eq!(
            other.get_schema().expect_err("missing"),
            SchemaError::SchemaNotFound("b".into())
        );
        assert!(other.get_type_mapping().expect("mapping").is_empty());
    }
}
