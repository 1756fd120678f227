//! # Config Loading
//!
//! Reads schema config fragments and class catalogs from disk.
//!
//! Both JSON (`.json`) and TOML (`.toml`) files are accepted; either is
//! parsed into a `serde_json::Value` so the engine sees one config shape.

use schemaforge_core::{ClassCatalog, SchemaError};
use serde_json::Value;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of a config fragment or catalog file (16 MB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => Err(SchemaError::Serialization(format!(
                "Unsupported config file '{}': expected a .json or .toml extension",
                path.display()
            ))),
        }
    }
}

/// Validate file size before reading.
pub fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SchemaError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SchemaError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SchemaError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize `path` and ensure it is a regular file.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, SchemaError> {
    let canonical = path.canonicalize().map_err(|e| {
        SchemaError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SchemaError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: its parent directory must exist.
pub fn validate_output_path(path: &Path) -> Result<PathBuf, SchemaError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SchemaError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SchemaError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SchemaError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// LOADING
// =============================================================================

/// Parse config text in the given format.
pub fn parse_config(text: &str, format: ConfigFormat) -> Result<Value, SchemaError> {
    match format {
        ConfigFormat::Json => serde_json::from_str(text)
            .map_err(|e| SchemaError::Serialization(format!("Invalid JSON: {}", e))),
        ConfigFormat::Toml => toml::from_str(text)
            .map_err(|e| SchemaError::Serialization(format!("Invalid TOML: {}", e))),
    }
}

/// Load one config fragment.
pub fn load_fragment(path: &Path) -> Result<Value, SchemaError> {
    let format = ConfigFormat::from_path(path)?;
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_CONFIG_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated)
        .map_err(|e| SchemaError::Io(format!("Read '{}': {}", path.display(), e)))?;
    let value = parse_config(&text, format)?;
    tracing::debug!(path = %validated.display(), ?format, "loaded config fragment");
    Ok(value)
}

/// Load fragments in argument order.
pub fn load_fragments(paths: &[PathBuf]) -> Result<Vec<Value>, SchemaError> {
    paths.iter().map(|path| load_fragment(path)).collect()
}

/// Load a class catalog.
pub fn load_catalog(path: &Path) -> Result<ClassCatalog, SchemaError> {
    let catalog = ClassCatalog::from_value(&load_fragment(path)?)?;
    tracing::debug!(path = %path.display(), classes = catalog.len(), "loaded class catalog");
    Ok(catalog)
}
