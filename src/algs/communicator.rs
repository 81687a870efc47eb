//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Point-to-point messages are *contiguous byte slices*. Collectives are the
//! handful the partitioner needs: fixed-size all-gather, variable-size
//! all-gather of [`ChunkInfo`] records, and sum/max/max-location reductions
//! derived from them. Every collective is a barrier: all participants must
//! enter it, in the same order, or the program deadlocks.

use crate::algs::wire::{ChunkInfo, cast_slice, records_from_bytes};
use crate::mesh_error::MeshError;
use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Typed message tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub i32);

impl CommTag {
    pub const fn new(tag: i32) -> Self {
        Self(tag)
    }
    pub const fn base(self) -> i32 {
        self.0
    }
    /// Tag `base + index`, used to give each in-flight transfer its own tag.
    /// `None` if the result does not fit an `i32`.
    pub fn offset(self, index: usize) -> Option<Self> {
        i32::try_from(index)
            .ok()
            .and_then(|i| self.0.checked_add(i))
            .map(Self)
    }
}

/// Base tag for chunk migration; chunk `g` travels with tag `base + g`.
pub const PARTITION_TAG_BASE: CommTag = CommTag(12000);

/// Tags reserved for collectives built on point-to-point messages.
const TAG_GATHER_I64: CommTag = CommTag(1);
const TAG_GATHER_CHUNK_INFO: CommTag = CommTag(2);

/// A point-to-point message queued for [`Communicator::exchange`].
#[derive(Clone, Debug)]
pub struct OutgoingMessage {
    pub peer: usize,
    pub tag: CommTag,
    pub payload: Vec<u8>,
}

/// Result of a max-with-location reduction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MaxLoc {
    pub value: u64,
    pub rank: usize,
}

fn comm_error(neighbor: usize, msg: impl Into<String>) -> MeshError {
    MeshError::CommError {
        neighbor,
        source: msg.into().into(),
    }
}

/// Collective + point-to-point communication interface.
pub trait Communicator: Send + Sync {
    /// This participant's id in `0..size()`.
    fn rank(&self) -> usize;
    /// Number of participants.
    fn size(&self) -> usize;

    /// Every participant contributes one value; all receive the full table
    /// ordered by rank.
    fn all_gather_i64(&self, value: i64) -> Result<Vec<i64>, MeshError>;

    /// Variable-size all-gather: participant `r` contributes `counts[r]`
    /// records; all receive the concatenation in rank order.
    fn all_gather_chunk_info(
        &self,
        local: &[ChunkInfo],
        counts: &[usize],
    ) -> Result<Vec<ChunkInfo>, MeshError>;

    /// Post every outgoing message without blocking, then receive one
    /// message for each `(peer, tag)` in `incoming`, blocking, in order.
    /// Returns once all sends have completed too.
    fn exchange(
        &self,
        outgoing: &[OutgoingMessage],
        incoming: &[(usize, CommTag)],
    ) -> Result<Vec<Vec<u8>>, MeshError>;

    fn all_reduce_sum_i64(&self, value: i64) -> Result<i64, MeshError> {
        Ok(self.all_gather_i64(value)?.into_iter().sum())
    }

    fn all_reduce_max_u64(&self, value: u64) -> Result<u64, MeshError> {
        let all = self.all_gather_i64(value as i64)?;
        Ok(all.into_iter().map(|v| v as u64).max().unwrap_or(value))
    }

    /// Global maximum and the lowest rank holding it (MPI_MAXLOC convention).
    fn all_reduce_max_loc(&self, value: u64) -> Result<MaxLoc, MeshError> {
        let all = self.all_gather_i64(value as i64)?;
        let mut best = MaxLoc {
            value,
            rank: self.rank(),
        };
        for (rank, v) in all.into_iter().enumerate() {
            let v = v as u64;
            if rank == 0 || v > best.value {
                best = MaxLoc { value: v, rank };
            }
        }
        Ok(best)
    }
}

/// Single-participant communicator for pure serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn all_gather_i64(&self, value: i64) -> Result<Vec<i64>, MeshError> {
        Ok(vec![value])
    }
    fn all_gather_chunk_info(
        &self,
        local: &[ChunkInfo],
        _counts: &[usize],
    ) -> Result<Vec<ChunkInfo>, MeshError> {
        Ok(local.to_vec())
    }
    fn exchange(
        &self,
        outgoing: &[OutgoingMessage],
        incoming: &[(usize, CommTag)],
    ) -> Result<Vec<Vec<u8>>, MeshError> {
        if let Some(m) = outgoing.first() {
            return Err(comm_error(m.peer, "NoComm has no peers to send to"));
        }
        if let Some(&(peer, _)) = incoming.first() {
            return Err(comm_error(peer, "NoComm has no peers to receive from"));
        }
        Ok(Vec::new())
    }
}

// --- ThreadComm: intra-process / multi-thread ---
type Key = (usize, usize, i32); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    queues: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    arrived: Condvar,
}

impl Mailbox {
    fn post(&self, key: Key, data: Bytes) {
        self.queues.lock().entry(key).or_default().push_back(data);
        self.arrived.notify_all();
    }

    fn take(&self, key: Key) -> Bytes {
        let mut queues = self.queues.lock();
        loop {
            if let Some(queue) = queues.get_mut(&key) {
                if let Some(data) = queue.pop_front() {
                    if queue.is_empty() {
                        queues.remove(&key);
                    }
                    return data;
                }
            }
            self.arrived.wait(&mut queues);
        }
    }
}

/// One participant of an in-process world; each participant is driven by
/// its own thread. Messages between a `(src, dst, tag)` triple are FIFO, so
/// successive collectives never mix.
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl std::fmt::Debug for ThreadComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl ThreadComm {
    /// Create the `size` participants of a fresh world.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }

    fn check_peer(&self, peer: usize) -> Result<(), MeshError> {
        if peer < self.size {
            Ok(())
        } else {
            Err(comm_error(
                peer,
                format!("peer outside world of {} participants", self.size),
            ))
        }
    }

    fn send(&self, peer: usize, tag: CommTag, buf: &[u8]) -> Result<(), MeshError> {
        self.check_peer(peer)?;
        self.mailbox
            .post((self.rank, peer, tag.base()), Bytes::copy_from_slice(buf));
        Ok(())
    }

    fn recv(&self, peer: usize, tag: CommTag) -> Result<Bytes, MeshError> {
        self.check_peer(peer)?;
        Ok(self.mailbox.take((peer, self.rank, tag.base())))
    }

    fn gather_bytes(&self, tag: CommTag, mine: &[u8]) -> Result<Vec<Bytes>, MeshError> {
        for peer in (0..self.size).filter(|&p| p != self.rank) {
            self.send(peer, tag, mine)?;
        }
        (0..self.size)
            .map(|peer| {
                if peer == self.rank {
                    Ok(Bytes::copy_from_slice(mine))
                } else {
                    self.recv(peer, tag)
                }
            })
            .collect()
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }

    fn all_gather_i64(&self, value: i64) -> Result<Vec<i64>, MeshError> {
        self.gather_bytes(TAG_GATHER_I64, &value.to_le_bytes())?
            .into_iter()
            .enumerate()
            .map(|(peer, b)| {
                let arr: [u8; 8] = b[..]
                    .try_into()
                    .map_err(|_| comm_error(peer, format!("expected 8 bytes, got {}", b.len())))?;
                Ok(i64::from_le_bytes(arr))
            })
            .collect()
    }

    fn all_gather_chunk_info(
        &self,
        local: &[ChunkInfo],
        counts: &[usize],
    ) -> Result<Vec<ChunkInfo>, MeshError> {
        let parts = self.gather_bytes(TAG_GATHER_CHUNK_INFO, cast_slice(local))?;
        let mut out = Vec::with_capacity(counts.iter().sum());
        for (peer, bytes) in parts.into_iter().enumerate() {
            let records: Vec<ChunkInfo> = records_from_bytes(&bytes)?;
            if records.len() != counts.get(peer).copied().unwrap_or(0) {
                return Err(comm_error(
                    peer,
                    format!(
                        "expected {} chunk records, got {}",
                        counts.get(peer).copied().unwrap_or(0),
                        records.len()
                    ),
                ));
            }
            out.extend(records);
        }
        Ok(out)
    }

    fn exchange(
        &self,
        outgoing: &[OutgoingMessage],
        incoming: &[(usize, CommTag)],
    ) -> Result<Vec<Vec<u8>>, MeshError> {
        for m in outgoing {
            self.send(m.peer, m.tag, &m.payload)?;
        }
        incoming
            .iter()
            .map(|&(peer, tag)| self.recv(peer, tag).map(|b| b.to_vec()))
            .collect()
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::collective::SystemOperation;
    use mpi::datatype::PartitionMut;
    use mpi::request::WaitGuard;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// Communicator over an MPI process group. The caller keeps the
    /// `Universe` returned by `mpi::initialize()` alive.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        pub rank: usize,
        pub size: usize,
    }

    impl MpiComm {
        pub fn new(world: SimpleCommunicator) -> Self {
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Self { world, rank, size }
        }

        /// Wrap `MPI_COMM_WORLD` (MPI must already be initialized).
        pub fn world() -> Self {
            Self::new(SimpleCommunicator::world())
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }

        fn all_gather_i64(&self, value: i64) -> Result<Vec<i64>, MeshError> {
            let mut out = vec![0i64; self.size];
            self.world.all_gather_into(&value, &mut out[..]);
            Ok(out)
        }

        fn all_gather_chunk_info(
            &self,
            local: &[ChunkInfo],
            counts: &[usize],
        ) -> Result<Vec<ChunkInfo>, MeshError> {
            let counts: Vec<mpi::Count> = counts.iter().map(|&c| c as mpi::Count).collect();
            let displs: Vec<mpi::Count> = counts
                .iter()
                .scan(0, |acc, &c| {
                    let d = *acc;
                    *acc += c;
                    Some(d)
                })
                .collect();
            let total: mpi::Count = counts.iter().sum();
            let mut out = vec![ChunkInfo::default(); total as usize];
            {
                let mut partition = PartitionMut::new(&mut out[..], &counts[..], &displs[..]);
                self.world.all_gather_varcount_into(local, &mut partition);
            }
            Ok(out)
        }

        fn all_reduce_sum_i64(&self, value: i64) -> Result<i64, MeshError> {
            let mut out = 0i64;
            self.world
                .all_reduce_into(&value, &mut out, SystemOperation::sum());
            Ok(out)
        }

        fn all_reduce_max_u64(&self, value: u64) -> Result<u64, MeshError> {
            let mut out = 0u64;
            self.world
                .all_reduce_into(&value, &mut out, SystemOperation::max());
            Ok(out)
        }

        fn exchange(
            &self,
            outgoing: &[OutgoingMessage],
            incoming: &[(usize, CommTag)],
        ) -> Result<Vec<Vec<u8>>, MeshError> {
            for m in outgoing {
                if m.peer >= self.size {
                    return Err(comm_error(m.peer, "peer outside communicator"));
                }
            }
            let received = mpi::request::scope(|scope| {
                let _pending: Vec<_> = outgoing
                    .iter()
                    .map(|m| {
                        WaitGuard::from(
                            self.world
                                .process_at_rank(m.peer as i32)
                                .immediate_send_with_tag(scope, &m.payload[..], m.tag.base()),
                        )
                    })
                    .collect();
                incoming
                    .iter()
                    .map(|&(peer, tag)| {
                        let (data, _status) = self
                            .world
                            .process_at_rank(peer as i32)
                            .receive_vec_with_tag::<u8>(tag.base());
                        data
                    })
                    .collect::<Vec<_>>()
            });
            Ok(received)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
