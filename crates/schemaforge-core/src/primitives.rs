//! # Primitives
//!
//! Fixed constants for the schemaforge engine.
//!
//! These are compiled into the binary and never change at runtime.

/// Name of the root query type.
pub const QUERY_TYPE_NAME: &str = "Query";

/// Name of the root mutation type.
///
/// The mutation type is only attached to a compiled graph when it has at
/// least one field.
pub const MUTATION_TYPE_NAME: &str = "Mutation";

/// Pattern every type, field, argument and enum value name must match.
pub const NAME_PATTERN: &str = r"^[_A-Za-z][_0-9A-Za-z]*$";

/// Wildcard key used in model `fields` and `operations` config.
pub const WILDCARD: &str = "*";

/// Top-level keys accepted by `Schema::apply_config`, in processing order.
///
/// `execute` (procedural schema updates) always runs last.
pub const TOP_LEVEL_KEYS: [&str; 10] = [
    "config",
    "types",
    "queries",
    "mutations",
    "interfaces",
    "unions",
    "models",
    "enums",
    "scalars",
    "execute",
];

/// Magic bytes for the persisted schema artifact header.
///
/// - Header = Magic Bytes ("SFGR") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"SFGR";

/// Current artifact format version.
///
/// Increment this when making breaking changes to `SchemaGraph`.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum size of a persisted artifact (64 MB).
///
/// Checked before any payload decoding.
pub const MAX_ARTIFACT_SIZE: usize = 64 * 1024 * 1024;

/// Model identifier reported by the built-in class catalog.
pub const CATALOG_MODEL_IDENTIFIER: &str = "catalog";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_is_processed_last() {
        assert_eq!(TOP_LEVEL_KEYS.last(), Some(&"execute"));
        assert_eq!(TOP_LEVEL_KEYS.first(), Some(&"config"));
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"SFGR");
    }
}
