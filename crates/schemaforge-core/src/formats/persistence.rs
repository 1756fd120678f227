//! # Persistence Format
//!
//! Binary serialization for compiled schemas.
//!
//! Format: Header (5 bytes) + postcard-serialized `SchemaGraph`.
//! - 4 bytes: Magic ("SFGR")
//! - 1 byte: Version
//!
//! Size and header are checked before the payload is decoded.

use crate::{SchemaError, SchemaGraph, primitives};

/// Header length in bytes.
const HEADER_SIZE: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header that precedes every persisted schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(SchemaError::Serialization("Invalid magic bytes".to_string()));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(SchemaError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchemaError> {
        if bytes.len() < HEADER_SIZE {
            return Err(SchemaError::Serialization("Header too short".to_string()));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Serialize a schema graph to bytes (header + payload).
pub fn graph_to_bytes(graph: &SchemaGraph) -> Result<Vec<u8>, SchemaError> {
    let payload =
        postcard::to_stdvec(graph).map_err(|e| SchemaError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a schema graph from bytes.
///
/// Rejects data shorter than the header or larger than
/// `MAX_ARTIFACT_SIZE` before touching the payload.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<SchemaGraph, SchemaError> {
    if bytes.len() < HEADER_SIZE {
        return Err(SchemaError::Serialization(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }
    if bytes.len() > primitives::MAX_ARTIFACT_SIZE {
        return Err(SchemaError::Serialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            primitives::MAX_ARTIFACT_SIZE
        )));
    }

    PersistenceHeader::from_bytes(bytes)?.validate()?;

    postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        SchemaError::Serialization(format!("Failed to deserialize schema data: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
