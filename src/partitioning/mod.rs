//! Chunk partitioning: selection-size coordination, chunk mapping and
//! chunk migration.
//!
//! A driver repeatedly asks [`Partitioner::largest_selection`] which
//! selection to split until [`Partitioner::total_selections`] reaches the
//! target, then calls [`Partitioner::map_chunks`] and
//! [`Partitioner::communicate_chunks`] to end up with the chunks each
//! participant must assemble.

pub mod binpack;
pub mod chunk;
pub mod mapping;
pub mod migrate;
pub mod parallel;
pub mod selection;
pub mod serial;

pub use chunk::{Chunk, MeshHandle, UNSPECIFIED};
pub use mapping::ChunkMap;
pub use migrate::MigratedChunks;
pub use parallel::ParallelPartitioner;
pub use selection::{LargestSelection, Selection};
pub use serial::SerialPartitioner;

use crate::document::Node;
use crate::mesh_error::MeshError;
use serde::Deserialize;

/// Partitioner options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PartitionerConfig {
    /// Desired number of output domains; `None` when unset.
    #[serde(default)]
    pub target: Option<u32>,
}

impl PartitionerConfig {
    /// Read `target` from an options document. Non-positive values count as
    /// unset.
    pub fn from_node(options: &Node) -> Self {
        let target = options
            .fetch("target")
            .and_then(Node::to_i64)
            .filter(|&t| t > 0)
            .map(|t| t as u32);
        Self { target }
    }
}

/// Strategy interface shared by the single- and multi-participant
/// partitioners.
pub trait Partitioner {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Target agreed by every participant: the maximum of the local values,
    /// with unset counting as 0. `None` if nobody set one.
    fn agree_target(&self, local: Option<u32>) -> Result<Option<u32>, MeshError>;

    /// Number of selections across all participants.
    fn total_selections<S: Selection>(&self, local: &[S]) -> Result<usize, MeshError>;

    /// Participant and local index of the globally largest selection.
    fn largest_selection<S: Selection>(
        &self,
        local: &[S],
    ) -> Result<LargestSelection, MeshError>;

    /// Assign every chunk, on every participant, a destination rank and domain.
    fn map_chunks(&self, chunks: &[Chunk<'_>], target: usize) -> Result<ChunkMap, MeshError>;

    /// Move chunks so each participant holds exactly those mapped to it.
    fn communicate_chunks(
        &self,
        chunks: &[Chunk<'_>],
        map: &ChunkMap,
    ) -> Result<MigratedChunks, MeshError>;

    /// `map_chunks` followed by `communicate_chunks`.
    fn redistribute(
        &self,
        chunks: &[Chunk<'_>],
        target: usize,
    ) -> Result<MigratedChunks, MeshError> {
        let map = self.map_chunks(chunks, target)?;
        self.communicate_chunks(chunks, &map)
    }
}
