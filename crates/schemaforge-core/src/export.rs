//! # Schema Export
//!
//! SDL rendering and integrity hashes for compiled schemas.
//!
//! Output is deterministic: every map in `SchemaGraph` is ordered, so the
//! same graph always renders to the same text and the same bytes.

use crate::components::{Argument, Component, EnumType, Field, InterfaceType, ObjectType, ScalarType, UnionType};
use crate::formats::graph_to_bytes;
use crate::{SchemaError, SchemaGraph};
use std::fmt::Write;

// =============================================================================
// SDL
// =============================================================================

/// Render a compiled schema as SDL.
///
/// Order: scalars, enums, interfaces, unions, then object and input types.
#[must_use]
pub fn print_sdl(graph: &SchemaGraph) -> String {
    let mut blocks: Vec<String> = Vec::with_capacity(graph.type_count());
    blocks.extend(graph.scalars.values().map(print_scalar));
    blocks.extend(graph.enums.values().map(print_enum));
    blocks.extend(graph.interfaces.values().map(print_interface));
    blocks.extend(graph.unions.values().map(print_union));
    blocks.extend(graph.types.values().map(print_object));
    let mut sdl = blocks.join("\n\n");
    sdl.push('\n');
    sdl
}

fn print_description(out: &mut String, description: Option<&str>, indent: &str) {
    if let Some(description) = description {
        let _ = writeln!(out, "{}\"\"\"{}\"\"\"", indent, description.replace("\"\"\"", "\\\"\"\""));
    }
}

fn print_scalar(scalar: &ScalarType) -> String {
    let mut out = String::new();
    print_description(&mut out, scalar.description(), "");
    let _ = write!(out, "scalar {}", scalar.name());
    out
}

fn print_enum(en: &EnumType) -> String {
    let mut out = String::new();
    print_description(&mut out, en.description(), "");
    let _ = writeln!(out, "enum {} {{", en.name());
    for value in en.values() {
        print_description(&mut out, value.description(), "  ");
        let _ = writeln!(out, "  {}", value.name());
    }
    out.push('}');
    out
}

fn print_interface(interface: &InterfaceType) -> String {
    let mut out = String::new();
    print_description(&mut out, interface.description(), "");
    let _ = writeln!(out, "interface {} {{", interface.name());
    print_fields(&mut out, interface.fields());
    out.push('}');
    out
}

fn print_union(union: &UnionType) -> String {
    let mut out = String::new();
    print_description(&mut out, union.description(), "");
    let members: Vec<&str> = union.types().collect();
    let _ = write!(out, "union {} = {}", union.name(), members.join(" | "));
    out
}

fn print_object(ty: &ObjectType) -> String {
    let mut out = String::new();
    print_description(&mut out, ty.description(), "");
    let keyword = if ty.is_input() { "input" } else { "type" };
    let _ = write!(out, "{} {}", keyword, ty.name());
    let interfaces: Vec<&str> = ty.interfaces().collect();
    if !interfaces.is_empty() {
        let _ = write!(out, " implements {}", interfaces.join(" & "));
    }
    out.push_str(" {\n");
    print_fields(&mut out, ty.fields());
    out.push('}');
    out
}

fn print_fields<'a>(out: &mut String, fields: impl Iterator<Item = &'a Field>) {
    for field in fields {
        print_description(out, field.description(), "  ");
        let _ = write!(out, "  {}", field.name());
        let args: Vec<String> = field.args().map(print_argument).collect();
        if !args.is_empty() {
            let _ = write!(out, "({})", args.join(", "));
        }
        let _ = writeln!(out, ": {}", field.type_ref().unwrap_or("String"));
    }
}

fn print_argument(arg: &Argument) -> String {
    match arg.default_value() {
        Some(default) => format!("{}: {} = {}", arg.name(), arg.type_ref(), default),
        None => format!("{}: {}", arg.name(), arg.type_ref()),
    }
}

// =============================================================================
// INTEGRITY
// =============================================================================

/// Deterministic checksum of the persisted form of a graph.
///
/// Rotate-and-XOR over the encoded bytes. Detects accidental corruption
/// only; use `crypto_hash` where tampering matters.
pub fn checksum(graph: &SchemaGraph) -> Result<u64, SchemaError> {
    let bytes = graph_to_bytes(graph)?;
    Ok(bytes
        .iter()
        .fold(0u64, |hash, byte| hash.rotate_left(5) ^ u64::from(*byte)))
}

/// BLAKE3 hex digest of the persisted form of a graph.
#[cfg(feature = "crypto-hash")]
pub fn crypto_hash(graph: &SchemaGraph) -> Result<String, SchemaError> {
    let bytes = graph_to_bytes(graph)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EnumValue;

    fn sample() -> SchemaGraph {
        let mut graph = SchemaGraph::new("blog");
        let mut post = ObjectType::new("Post").with_field(Field::typed("id", "ID!"));
        post.add_interface("Node");
        post.set_description("A post");
        graph.insert_type(post);
        graph.insert_type(
            ObjectType::new("Query").with_field(
                Field::typed("readPosts", "[Post!]!").with_arg(Argument::new("limit", "Int").with_default("10")),
            ),
        );
        graph.interfaces.insert(
            "Node".into(),
            InterfaceType::new("Node").with_field(Field::typed("id", "ID!")),
        );
        graph.enums.insert(
            "Status".into(),
            EnumType::new("Status")
                .with_value(EnumValue::new("DRAFT"))
                .with_value(EnumValue::new("PUBLISHED")),
        );
        let mut content = UnionType::new("Content");
        content.add_type("Post");
        graph.unions.insert("Content".into(), content);
        graph.scalars.insert("Date".into(), ScalarType::new("Date"));
        graph
    }

    #[test]
    fn sdl_renders_every_kind() {
        let sdl = print_sdl(&sample());
        assert!(sdl.starts_with("scalar Date\n\nenum Status {\n  DRAFT\n  PUBLISHED\n}"));
        assert!(sdl.contains("interface Node {\n  id: ID!\n}"));
        assert!(sdl.contains("union Content = Post"));
        assert!(sdl.contains("\"\"\"A post\"\"\"\ntype Post implements Node {\n  id: ID!\n}"));
        assert!(sdl.contains("  readPosts(limit: Int = 10): [Post!]!"));
    }

    #[test]
    fn input_types_use_input_keyword() {
        let mut graph = SchemaGraph::new("k");
        graph.insert_type(ObjectType::input("CreatePostInput").with_field(Field::typed("title", "String!")));
        assert!(print_sdl(&graph).starts_with("input CreatePostInput {"));
    }

    #[test]
    fn checksum_is_stable_and_sensitive() {
        let a = checksum(&sample()).expect("a");
        assert_eq!(a, checksum(&sample()).expect("again"));

        let mut changed = sample();
        changed.scalars.insert("Time".into(), ScalarType::new("Time"));
        assert_ne!(a, checksum(&changed).expect("changed"));
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn crypto_hash_is_hex() {
        let hash = crypto_hash(&sample()).expect("hash");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
