//! Point-to-point migration realising a [`ChunkMap`].
//!
//! Chunks that stay on their current participant are rewrapped (bulk arrays
//! shared, fresh `state`); chunks that move are serialized, sent with tag
//! `PARTITION_TAG_BASE + global index`, and re-stamped on arrival. Every
//! result carries `state/domain_id` equal to its global chunk index.

use super::chunk::Chunk;
use super::mapping::ChunkMap;
use crate::algs::communicator::{CommTag, Communicator, OutgoingMessage, PARTITION_TAG_BASE};
use crate::algs::wire::{decode_mesh, encode_mesh};
use crate::document::Node;
use crate::mesh_error::MeshError;

/// Chunks this participant ends up owning, with their destination domains.
#[derive(Debug, Default)]
pub struct MigratedChunks {
    pub chunks: Vec<Chunk<'static>>,
    pub domains: Vec<i32>,
}

impl MigratedChunks {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// `state/domain_id` of every result, in order.
    pub fn domain_ids(&self) -> Vec<i64> {
        self.chunks
            .iter()
            .filter_map(|c| c.mesh().fetch("state/domain_id").and_then(Node::to_i64))
            .collect()
    }
}

/// New document sharing every top-level child of `mesh` except `state`;
/// `state/cycle` and `state/time` are carried over.
pub fn rewrap(mesh: &Node, domain_id: usize) -> Node {
    let mut out = Node::new();
    for (name, child) in mesh.children().filter(|(name, _)| *name != "state") {
        out.set(name, child.clone());
    }
    for key in ["state/cycle", "state/time"] {
        if let Some(v) = mesh.fetch(key) {
            out.set(key, v.clone());
        }
    }
    out.set("state/domain_id", domain_id as i64);
    out
}

/// Overwrite `state/domain_id` in place.
pub fn restamp(mesh: &mut Node, domain_id: usize) {
    mesh.set("state/domain_id", domain_id as i64);
}

/// Tag used for the transfer of global chunk `gidx`.
pub fn chunk_tag(gidx: usize) -> Result<CommTag, MeshError> {
    PARTITION_TAG_BASE
        .offset(gidx)
        .ok_or(MeshError::TagOverflow {
            base: PARTITION_TAG_BASE.base(),
            index: gidx,
        })
}

fn check_local(chunks: &[Chunk<'_>], map: &ChunkMap, rank: usize) -> Result<(), MeshError> {
    let expected = map.local_range(rank).len();
    if chunks.len() != expected {
        return Err(MeshError::ChunkMapMismatch(format!(
            "rank {rank} holds {} chunks but the map lists {expected}",
            chunks.len()
        )));
    }
    if map.dest_domain.len() != map.len() {
        return Err(MeshError::ChunkMapMismatch(format!(
            "{} ranks vs {} domains",
            map.len(),
            map.dest_domain.len()
        )));
    }
    Ok(())
}

/// Messages this participant must send: every local chunk whose destination
/// is another participant.
pub fn outgoing_messages(
    chunks: &[Chunk<'_>],
    map: &ChunkMap,
    rank: usize,
) -> Result<Vec<OutgoingMessage>, MeshError> {
    let range = map.local_range(rank);
    chunks
        .iter()
        .zip(range)
        .filter(|&(_, gidx)| map.dest_rank[gidx] != rank as i32)
        .map(|(chunk, gidx)| {
            let peer = map.dest_rank[gidx] as usize;
            let tag = chunk_tag(gidx)?;
            log::debug!("{rank}: send(dest={peer}, tag={})", tag.base());
            Ok(OutgoingMessage {
                peer,
                tag,
                payload: encode_mesh(chunk.mesh())?,
            })
        })
        .collect()
}

/// Receives this participant must post, in ascending global order.
pub fn incoming_messages(
    map: &ChunkMap,
    rank: usize,
) -> Result<Vec<(usize, CommTag)>, MeshError> {
    let local = map.local_range(rank);
    (0..map.len())
        .filter(|&g| map.dest_rank[g] == rank as i32 && !local.contains(&g))
        .map(|g| {
            let src = map.owner_of(g);
            let tag = chunk_tag(g)?;
            log::debug!("{rank}: recv(src={src}, tag={})", tag.base());
            Ok((src, tag))
        })
        .collect()
}

/// Realise `map`: ship chunks to their destination participants and return
/// the chunks this participant owns afterwards, ordered by global index.
pub fn communicate_chunks<C: Communicator + ?Sized>(
    comm: &C,
    chunks: &[Chunk<'_>],
    map: &ChunkMap,
) -> Result<MigratedChunks, MeshError> {
    let rank = comm.rank();
    check_local(chunks, map, rank)?;

    let outgoing = outgoing_messages(chunks, map, rank)?;
    let incoming = incoming_messages(map, rank)?;
    let mut received = comm.exchange(&outgoing, &incoming)?.into_iter();

    let local = map.local_range(rank);
    let mut out = MigratedChunks::default();
    for gidx in (0..map.len()).filter(|&g| map.dest_rank[g] == rank as i32) {
        let mesh = if local.contains(&gidx) {
            rewrap(chunks[gidx - local.start].mesh(), gidx)
        } else {
            let bytes = received.next().ok_or_else(|| {
                MeshError::ChunkMapMismatch(format!("no payload received for chunk {gidx}"))
            })?;
            let mut mesh = decode_mesh(&bytes)?;
            restamp(&mut mesh, gidx);
            mesh
        };
        let domain = map.dest_domain[gidx];
        out.chunks
            .push(Chunk::owned(mesh).with_destination(rank as i32, domain));
        out.domains.push(domain);
    }
    Ok(out)
}
