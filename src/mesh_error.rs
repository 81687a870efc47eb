//! MeshError: Unified error type for mesh-partition public APIs
//!
//! Every fallible operation in the crate (document lookup, tile generation,
//! chunk mapping and migration, transport) reports through this type so that
//! callers can propagate with `?` instead of panicking.

use thiserror::Error;

/// Unified error type for mesh-partition operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A required path was not present in a document.
    #[error("Missing required field `{0}`")]
    MissingField(String),
    /// A document node held a different kind of value than requested.
    #[error("Type mismatch at `{path}`: expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
    },
    /// A user-supplied tile pattern is internally inconsistent.
    #[error("Invalid tile pattern: {0}")]
    InvalidPattern(String),
    /// Generator arguments describe an impossible mesh.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A topology type the element counter does not understand.
    #[error("Unsupported topology type `{0}`")]
    UnsupportedTopology(String),
    /// Some chunks carried a destination domain and some did not.
    #[error(
        "Invalid mixture of destination rank/domain specifications: {pinned} pinned, {free} free"
    )]
    MixedDestinations { pinned: usize, free: usize },
    /// A free-chunk assignment was requested with a zero target.
    #[error("Target domain count must be at least 1")]
    InvalidTarget,
    /// A chunk names a destination rank outside the communicator.
    #[error("Chunk {chunk} targets rank {rank}, but only {size} participants exist")]
    InvalidDestination { chunk: usize, rank: i32, size: usize },
    /// Global assignment arrays do not agree with the local chunk list.
    #[error("Chunk map mismatch: {0}")]
    ChunkMapMismatch(String),
    /// A mesh blob carried an unknown header.
    #[error("Wire header mismatch: expected version {expected}, found {found}")]
    WireVersion { expected: u16, found: u16 },
    /// A transfer index cannot be expressed as a message tag.
    #[error("Message tag overflow: base {base} + index {index}")]
    TagOverflow { base: i32, index: usize },
    /// Encoding or decoding a mesh blob failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Communication failed with a neighbor.
    #[error("Communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<bincode::Error> for MeshError {
    fn from(e: bincode::Error) -> Self {
        MeshError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(e: serde_json::Error) -> Self {
        MeshError::Serialization(e.to_string())
    }
}
