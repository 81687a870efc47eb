//! Multi-participant partitioner driven by a [`Communicator`].
//!
//! Every method is collective: all participants must call it, in the same
//! order, with their own local data.

use super::mapping::{ChunkMap, assign_chunks, offsets_from_counts};
use super::migrate::{self, MigratedChunks};
use super::selection::{LargestSelection, Selection, find_local, local_max};
use super::serial::chunk_infos;
use super::{Chunk, Partitioner};
use crate::algs::communicator::Communicator;
use crate::mesh_error::MeshError;

#[derive(Debug, Clone)]
pub struct ParallelPartitioner<C: Communicator> {
    comm: C,
}

impl<C: Communicator> ParallelPartitioner<C> {
    pub fn new(comm: C) -> Self {
        Self { comm }
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }
}

impl<C: Communicator> Partitioner for ParallelPartitioner<C> {
    fn rank(&self) -> usize {
        self.comm.rank()
    }

    fn size(&self) -> usize {
        self.comm.size()
    }

    fn agree_target(&self, local: Option<u32>) -> Result<Option<u32>, MeshError> {
        let max = self
            .comm
            .all_reduce_max_u64(u64::from(local.unwrap_or(0)))?;
        Ok((max > 0).then_some(max as u32))
    }

    fn total_selections<S: Selection>(&self, local: &[S]) -> Result<usize, MeshError> {
        Ok(self.comm.all_reduce_sum_i64(local.len() as i64)? as usize)
    }

    fn largest_selection<S: Selection>(
        &self,
        local: &[S],
    ) -> Result<LargestSelection, MeshError> {
        let loc = self.comm.all_reduce_max_loc(local_max(local))?;
        let index = if loc.rank == self.rank() {
            find_local(local, loc.value)
        } else {
            None
        };
        Ok(LargestSelection {
            rank: loc.rank,
            index,
        })
    }

    fn map_chunks(&self, chunks: &[Chunk<'_>], target: usize) -> Result<ChunkMap, MeshError> {
        // A participant that cannot describe its chunks reports -1 so that
        // everyone leaves the collective together.
        let local = chunk_infos(chunks);
        let reported = match &local {
            Ok(_) => chunks.len() as i64,
            Err(_) => -1,
        };
        let gathered = self.comm.all_gather_i64(reported)?;
        let local = local?;
        if let Some(bad) = gathered.iter().position(|&c| c < 0) {
            return Err(MeshError::CommError {
                neighbor: bad,
                source: "peer failed to describe its chunks".into(),
            });
        }
        let counts: Vec<usize> = gathered.into_iter().map(|c| c as usize).collect();
        let offsets = offsets_from_counts(&counts);
        log::debug!("chunk counts = {counts:?}, offsets = {offsets:?}");

        let global = self.comm.all_gather_chunk_info(&local, &counts)?;
        log::debug!("global chunk table = {global:?}");

        let (dest_rank, dest_domain) = assign_chunks(&global, target, self.size())?;
        Ok(ChunkMap {
            dest_rank,
            dest_domain,
            offsets,
            counts,
        })
    }

    fn communicate_chunks(
        &self,
        chunks: &[Chunk<'_>],
        map: &ChunkMap,
    ) -> Result<MigratedChunks, MeshError> {
        migrate::communicate_chunks(&self.comm, chunks, map)
    }
}
