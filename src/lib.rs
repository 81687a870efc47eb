#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-partition
//!
//! mesh-partition redistributes unstructured mesh chunks across the
//! participants of a parallel run and generates tiled test meshes. Meshes are
//! hierarchical documents following the blueprint layout (`coordsets`,
//! `topologies`, `fields`, `state`).
//!
//! ## Features
//! - Path-addressable mesh documents with shared, reference-counted arrays
//! - Global selection-size coordination for iterative splitting drivers
//! - Chunk-to-domain/rank mapping (pass-through, greedy balance, or error on mixtures)
//! - Point-to-point chunk migration with dense domain renumbering
//! - Pluggable communication backends (serial, threads, MPI)
//! - A tiled quad/hex mesh generator with side-tagged boundary topology
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-partition = "0.3"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```
//!
//! ```
//! use mesh_partition::prelude::*;
//!
//! let mesh = tiled(2, 1, 0, &Node::new()).unwrap();
//! let chunks = vec![Chunk::borrowed(&mesh)];
//! let out = SerialPartitioner::new().redistribute(&chunks, 1).unwrap();
//! assert_eq!(out.domains, vec![0]);
//! ```

pub mod algs;
pub mod document;
pub mod mesh_error;
pub mod mesh_generation;
pub mod partitioning;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, ThreadComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::wire::ChunkInfo;
    pub use crate::document::{DataArray, DataType, Node};
    pub use crate::mesh_error::MeshError;
    pub use crate::mesh_generation::{BoundarySide, Tiler, TilerOptions, tiled};
    pub use crate::partitioning::{
        Chunk, ChunkMap, LargestSelection, MeshHandle, MigratedChunks, ParallelPartitioner,
        Partitioner, PartitionerConfig, Selection, SerialPartitioner,
    };
}
