//! Mesh chunks: a document handle plus an optional destination hint.

use crate::document::{Node, mesh_element_count};
use crate::mesh_error::MeshError;

/// Owned or borrowed mesh document.
///
/// An owned handle releases its document when dropped; a borrowed handle is a
/// view into a document owned elsewhere and cannot outlive it.
#[derive(Debug, Clone)]
pub enum MeshHandle<'a> {
    Owned(Box<Node>),
    Borrowed(&'a Node),
}

impl MeshHandle<'_> {
    pub fn get(&self) -> &Node {
        match self {
            MeshHandle::Owned(n) => n,
            MeshHandle::Borrowed(n) => n,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, MeshHandle::Owned(_))
    }

    /// Detach into an owned handle. Borrowed documents are cloned, which
    /// shares their bulk arrays.
    pub fn into_owned(self) -> MeshHandle<'static> {
        match self {
            MeshHandle::Owned(n) => MeshHandle::Owned(n),
            MeshHandle::Borrowed(n) => MeshHandle::Owned(Box::new(n.clone())),
        }
    }
}

/// Destination value meaning "not specified".
pub const UNSPECIFIED: i32 = -1;

/// A mesh fragment plus an optional destination rank/domain.
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub mesh: MeshHandle<'a>,
    pub destination_rank: i32,
    pub destination_domain: i32,
}

impl<'a> Chunk<'a> {
    pub fn owned(mesh: Node) -> Chunk<'static> {
        Chunk {
            mesh: MeshHandle::Owned(Box::new(mesh)),
            destination_rank: UNSPECIFIED,
            destination_domain: UNSPECIFIED,
        }
    }

    pub fn borrowed(mesh: &'a Node) -> Self {
        Chunk {
            mesh: MeshHandle::Borrowed(mesh),
            destination_rank: UNSPECIFIED,
            destination_domain: UNSPECIFIED,
        }
    }

    /// Pin the chunk to a rank and domain.
    pub fn with_destination(mut self, rank: i32, domain: i32) -> Self {
        self.destination_rank = rank;
        self.destination_domain = domain;
        self
    }

    pub fn owns_mesh(&self) -> bool {
        self.mesh.is_owned()
    }

    pub fn mesh(&self) -> &Node {
        self.mesh.get()
    }

    /// Element count summed over every topology of the chunk.
    pub fn num_elements(&self) -> Result<u64, MeshError> {
        mesh_element_count(self.mesh())
    }
}
