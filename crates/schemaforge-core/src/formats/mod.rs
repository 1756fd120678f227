//! Serialization formats for compiled schemas.

mod persistence;

pub use persistence::{PersistenceHeader, graph_from_bytes, graph_to_bytes};
