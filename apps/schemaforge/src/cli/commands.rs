//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{Backend, Cli};
use crate::loader::{load_catalog, load_fragments, validate_output_path};
use crate::plugins::builtin_registry;
use schemaforge_core::{
    BuildOptions, MemoryStoreFactory, RedbStoreFactory, Schema, SchemaContext, SchemaError,
    SchemaGraph, StoreFactory, checksum, crypto_hash, print_sdl,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// WORKSPACE
// =============================================================================

/// Everything a command needs to open a schema: the store, the key, the
/// model catalog and the output settings.
pub struct Workspace {
    factory: Box<dyn StoreFactory>,
    key: String,
    backend: Backend,
    database: PathBuf,
    catalog: Option<PathBuf>,
    verbose: bool,
    json_mode: bool,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("key", &self.key)
            .field("backend", &self.backend)
            .field("database", &self.database)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Open the store selected on the command line.
    pub fn open(cli: &Cli) -> Result<Self, SchemaError> {
        let factory: Box<dyn StoreFactory> = match cli.backend {
            Backend::Redb => Box::new(RedbStoreFactory::open(&cli.database)?),
            Backend::Memory => Box::new(MemoryStoreFactory::new()),
        };
        Ok(Self {
            factory,
            key: cli.key.clone(),
            backend: cli.backend,
            database: cli.database.clone(),
            catalog: cli.catalog.clone(),
            verbose: cli.verbose,
            json_mode: cli.json_mode,
        })
    }

    /// A fresh schema for the configured key, with the built-in plugins
    /// and the class catalog (if any).
    pub fn schema(&self) -> Result<Schema, SchemaError> {
        let mut context = SchemaContext::new().with_plugins(builtin_registry());
        if let Some(path) = &self.catalog {
            context = context.with_model_creator(Arc::new(load_catalog(path)?));
        }
        Ok(Schema::new(self.key.as_str(), context, self.factory.as_ref())?
            .with_options(BuildOptions {
                verbose: self.verbose,
            }))
    }

    /// A schema with every fragment applied, in order.
    fn assemble(&self, files: &[PathBuf]) -> Result<Schema, SchemaError> {
        let mut schema = self.schema()?;
        for (path, fragment) in files.iter().zip(load_fragments(files)?) {
            tracing::debug!(path = %path.display(), "applying fragment");
            schema.apply_config(&fragment)?;
        }
        Ok(schema)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

// =============================================================================
// BUILD COMMAND
// =============================================================================

/// Build and persist the schema.
pub fn cmd_build(workspace: &Workspace, files: &[PathBuf]) -> Result<(), SchemaError> {
    let mut schema = workspace.assemble(files)?;
    let graph = schema.save()?;
    print_summary(workspace, "Built", &graph, files.len())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Build without persisting.
pub fn cmd_validate(workspace: &Workspace, files: &[PathBuf]) -> Result<(), SchemaError> {
    let mut schema = workspace.assemble(files)?;
    let graph = schema.build()?;
    print_summary(workspace, "Valid", &graph, files.len())
}

fn print_summary(
    workspace: &Workspace,
    verb: &str,
    graph: &SchemaGraph,
    fragments: usize,
) -> Result<(), SchemaError> {
    let checksum = checksum(graph)?;

    if workspace.json_mode {
        let output = serde_json::json!({
            "key": graph.key,
            "fragments": fragments,
            "types": graph.type_count(),
            "queries": graph.query_count(),
            "mutations": graph.mutation_count(),
            "checksum": checksum,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("{} schema '{}' from {} fragment(s)", verb, graph.key, fragments);
    println!("  Types:     {}", graph.type_count());
    println!("  Queries:   {}", graph.query_count());
    println!("  Mutations: {}", graph.mutation_count());
    println!("  Checksum:  {:016x}", checksum);
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show stored schema status.
pub fn cmd_status(workspace: &Workspace) -> Result<(), SchemaError> {
    let schema = workspace.schema()?;
    let graph = if schema.is_stored()? {
        Some(schema.fetch()?)
    } else {
        None
    };

    if workspace.json_mode {
        let output = match &graph {
            Some(graph) => serde_json::json!({
                "key": workspace.key,
                "backend": format!("{:?}", workspace.backend).to_lowercase(),
                "database": workspace.database.to_string_lossy(),
                "stored": true,
                "types": graph.type_count(),
                "queries": graph.query_count(),
                "mutations": graph.mutation_count(),
                "checksum": checksum(graph)?,
                "blake3": crypto_hash(graph)?,
            }),
            None => serde_json::json!({
                "key": workspace.key,
                "backend": format!("{:?}", workspace.backend).to_lowercase(),
                "database": workspace.database.to_string_lossy(),
                "stored": false,
            }),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("schemaforge Schema Status");
    println!("=========================");
    println!("Key:      {}", workspace.key);
    println!("Backend:  {:?}", workspace.backend);
    println!("Database: {:?}", workspace.database);
    println!();

    match graph {
        Some(graph) => {
            println!("Types:     {}", graph.type_count());
            println!("Queries:   {}", graph.query_count());
            println!("Mutations: {}", graph.mutation_count());
            println!("Checksum:  {:016x}", checksum(&graph)?);
            println!("BLAKE3:    {}", crypto_hash(&graph)?);
        }
        None => println!("No schema stored for this key"),
    }
    Ok(())
}

// =============================================================================
// SDL COMMAND
// =============================================================================

/// Print or write the SDL of the stored schema.
pub fn cmd_sdl(workspace: &Workspace, output: Option<&Path>) -> Result<(), SchemaError> {
    let graph = workspace.schema()?.fetch()?;
    let sdl = print_sdl(&graph);

    match output {
        Some(path) => {
            let validated = validate_output_path(path)?;
            std::fs::write(&validated, &sdl)
                .map_err(|e| SchemaError::Io(format!("Write '{}': {}", path.display(), e)))?;
            if !workspace.json_mode {
                println!("Wrote SDL for '{}' to {:?}", graph.key, validated);
            }
        }
        None => print!("{}", sdl),
    }
    Ok(())
}

// =============================================================================
// TYPES COMMAND
// =============================================================================

/// Show the class → type mapping of the stored schema.
pub fn cmd_types(workspace: &Workspace) -> Result<(), SchemaError> {
    let graph = workspace.schema()?.fetch()?;

    if workspace.json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&graph.type_mapping).unwrap_or_default()
        );
        return Ok(());
    }

    if graph.type_mapping.is_empty() {
        println!("No model classes in schema '{}'", graph.key);
        return Ok(());
    }
    let width = graph.type_mapping.keys().map(String::len).max().unwrap_or(0);
    for (class, type_name) in &graph.type_mapping {
        println!("{:width$}  {}", class, type_name, width = width);
    }
    Ok(())
}
