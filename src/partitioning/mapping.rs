//! Global chunk table and chunk -> (rank, domain) assignment.

use super::binpack::{Item, domain_owners, greedy_balance};
use crate::algs::wire::ChunkInfo;
use crate::mesh_error::MeshError;
use itertools::Itertools;
use std::ops::Range;

/// Global assignment for every chunk, indexed in canonical order
/// (all of participant 0's chunks, then participant 1's, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkMap {
    pub dest_rank: Vec<i32>,
    pub dest_domain: Vec<i32>,
    /// Starting global index of each participant's chunks.
    pub offsets: Vec<usize>,
    /// Number of chunks each participant contributed.
    pub counts: Vec<usize>,
}

impl ChunkMap {
    pub fn len(&self) -> usize {
        self.dest_rank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dest_rank.is_empty()
    }

    /// Global indices of the chunks held by `rank`.
    pub fn local_range(&self, rank: usize) -> Range<usize> {
        let start = self.offsets.get(rank).copied().unwrap_or(0);
        start..start + self.counts.get(rank).copied().unwrap_or(0)
    }

    /// Participant currently holding global chunk `gidx`.
    pub fn owner_of(&self, gidx: usize) -> usize {
        // Empty participants share their successor's offset; take the last.
        self.offsets
            .partition_point(|&o| o <= gidx)
            .saturating_sub(1)
    }

    /// Number of distinct destination domains.
    pub fn domain_count(&self) -> usize {
        self.dest_domain.iter().unique().count()
    }
}

/// Exclusive prefix sum of per-participant chunk counts.
pub fn offsets_from_counts(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0usize, |acc, &c| {
            let off = *acc;
            *acc += c;
            Some(off)
        })
        .collect()
}

/// Compute `(dest_rank, dest_domain)` for every chunk of the global table.
///
/// * all chunks pinned: passed through, after checking ranks are valid;
/// * all chunks free: greedy balance into `target` domains, domains dealt
///   round-robin over participants;
/// * a mixture: `MeshError::MixedDestinations`.
pub fn assign_chunks(
    infos: &[ChunkInfo],
    target: usize,
    participants: usize,
) -> Result<(Vec<i32>, Vec<i32>), MeshError> {
    let pinned = infos.iter().filter(|c| c.is_pinned()).count();
    let free = infos.len() - pinned;

    if free == 0 {
        if let Some((chunk, info)) = infos
            .iter()
            .find_position(|c| c.destination_rank < 0 || c.destination_rank as usize >= participants)
        {
            return Err(MeshError::InvalidDestination {
                chunk,
                rank: info.destination_rank,
                size: participants,
            });
        }
        let unique = infos.iter().map(|c| c.destination_domain).unique().count();
        if unique > 0 && unique != target {
            log::warn!(
                "The unique number of domain ids {unique} was not equal to the desired target number of domains: {target}."
            );
        }
        return Ok(infos
            .iter()
            .map(|c| (c.destination_rank, c.destination_domain))
            .unzip());
    }

    if pinned > 0 {
        return Err(MeshError::MixedDestinations { pinned, free });
    }

    let items: Vec<Item> = infos
        .iter()
        .enumerate()
        .map(|(cid, c)| Item {
            cid,
            load: c.num_elements,
        })
        .collect();
    let domains = greedy_balance(&items, target)?;
    let owners = domain_owners(target, participants);
    log::debug!("domain owners = {owners:?}");
    Ok(domains
        .into_iter()
        .map(|d| (owners[d] as i32, d as i32))
        .unzip())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(n: &[u64]) -> Vec<ChunkInfo> {
        n.iter().map(|&e| ChunkInfo::new(e, -1, -1)).collect()
    }

    #[test]
    fn offsets_and_owner() {
        let counts = [2, 0, 3];
        let map = ChunkMap {
            dest_rank: vec![0; 5],
            dest_domain: vec![0; 5],
            offsets: offsets_from_counts(&counts),
            counts: counts.to_vec(),
        };
        assert_eq!(map.offsets, vec![0, 2, 2]);
        let owners: Vec<_> = (0..5).map(|g| map.owner_of(g)).collect();
        assert_eq!(owners, vec![0, 0, 2, 2, 2]);
        assert_eq!(map.local_range(1), 2..2);
        assert_eq!(map.local_range(2), 2..5);
    }

    #[test]
    fn free_chunks_balanced_then_dealt() {
        let (ranks, domains) = assign_chunks(&free(&[10, 20, 5, 15]), 2, 4).unwrap();
        assert_eq!(domains, vec![0, 1, 0, 0]);
        assert_eq!(ranks, vec![0, 1, 0, 0]);
    }

    #[test]
    fn more_domains_than_participants() {
        let (ranks, domains) = assign_chunks(&free(&[1, 1, 1]), 3, 2).unwrap();
        assert_eq!(domains, vec![0, 1, 2]);
        assert_eq!(ranks, vec![0, 1, 0]);
    }

    #[test]
    fn pinned_pass_through() {
        let infos = vec![ChunkInfo::new(4, 1, 7), ChunkInfo::new(4, 0, 3)];
        let (ranks, domains) = assign_chunks(&infos, 5, 2).unwrap();
        assert_eq!(ranks, vec![1, 0]);
        assert_eq!(domains, vec![7, 3]);
    }

    #[test]
    fn pinned_rank_must_exist() {
        let infos = vec![ChunkInfo::new(4, 0, 0), ChunkInfo::new(4, 2, 1)];
        assert!(matches!(
            assign_chunks(&infos, 2, 2),
            Err(MeshError::InvalidDestination { chunk: 1, rank: 2, size: 2 })
        ));
    }

    #[test]
    fn mixture_is_an_error() {
        let infos = vec![ChunkInfo::new(4, 0, 0), ChunkInfo::new(4, -1, -1)];
        assert!(matches!(
            assign_chunks(&infos, 2, 2),
            Err(MeshError::MixedDestinations { pinned: 1, free: 1 })
        ));
    }

    #[test]
    fn empty_table() {
        let (r, d) = assign_chunks(&[], 3, 2).unwrap();
        assert!(r.is_empty() && d.is_empty());
    }
}
