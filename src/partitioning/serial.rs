//! Single-participant partitioner: every collective is local.

use super::mapping::{ChunkMap, assign_chunks};
use super::migrate::{MigratedChunks, rewrap};
use super::selection::{LargestSelection, Selection, find_local, local_max};
use super::{Chunk, Partitioner};
use crate::algs::wire::ChunkInfo;
use crate::mesh_error::MeshError;

#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPartitioner;

impl SerialPartitioner {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn chunk_infos(chunks: &[Chunk<'_>]) -> Result<Vec<ChunkInfo>, MeshError> {
    chunks
        .iter()
        .map(|c| {
            Ok(ChunkInfo::new(
                c.num_elements()?,
                c.destination_rank,
                c.destination_domain,
            ))
        })
        .collect()
}

impl Partitioner for SerialPartitioner {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn agree_target(&self, local: Option<u32>) -> Result<Option<u32>, MeshError> {
        Ok(local.filter(|&t| t > 0))
    }

    fn total_selections<S: Selection>(&self, local: &[S]) -> Result<usize, MeshError> {
        Ok(local.len())
    }

    fn largest_selection<S: Selection>(
        &self,
        local: &[S],
    ) -> Result<LargestSelection, MeshError> {
        Ok(LargestSelection {
            rank: 0,
            index: find_local(local, local_max(local)),
        })
    }

    fn map_chunks(&self, chunks: &[Chunk<'_>], target: usize) -> Result<ChunkMap, MeshError> {
        let infos = chunk_infos(chunks)?;
        let (dest_rank, dest_domain) = assign_chunks(&infos, target, 1)?;
        Ok(ChunkMap {
            dest_rank,
            dest_domain,
            offsets: vec![0],
            counts: vec![chunks.len()],
        })
    }

    fn communicate_chunks(
        &self,
        chunks: &[Chunk<'_>],
        map: &ChunkMap,
    ) -> Result<MigratedChunks, MeshError> {
        if chunks.len() != map.len() {
            return Err(MeshError::ChunkMapMismatch(format!(
                "{} local chunks, {} mapped",
                chunks.len(),
                map.len()
            )));
        }
        let mut out = MigratedChunks::default();
        for (gidx, chunk) in chunks.iter().enumerate() {
            let domain = map.dest_domain[gidx];
            out.chunks
                .push(Chunk::owned(rewrap(chunk.mesh(), gidx)).with_destination(0, domain));
            out.domains.push(domain);
        }
        Ok(out)
    }
}
