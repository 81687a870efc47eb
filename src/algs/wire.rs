//! Fixed, versioned wire types for chunk mapping and migration.

use crate::document::Node;
use crate::mesh_error::MeshError;
use bytemuck::{Pod, Zeroable};
use std::mem::{align_of, offset_of, size_of};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Copy raw bytes into freshly allocated records.
pub fn records_from_bytes<T: Pod>(bytes: &[u8]) -> Result<Vec<T>, MeshError> {
    let size = size_of::<T>();
    if size == 0 || bytes.len() % size != 0 {
        return Err(MeshError::Serialization(format!(
            "{} bytes is not a whole number of {size}-byte records",
            bytes.len()
        )));
    }
    let mut out = vec![T::zeroed(); bytes.len() / size];
    bytemuck::cast_slice_mut(&mut out).copy_from_slice(bytes);
    Ok(out)
}

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Header kind of a serialized mesh document.
pub const KIND_MESH: u16 = 1;

/// Per-chunk metadata gathered from every participant in one collective.
///
/// Layout is pinned: a 64-bit unsigned element count followed by two 32-bit
/// signed integers, 16 bytes, no padding. See [`CHUNK_INFO_SCHEMA`].
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ChunkInfo {
    pub num_elements: u64,
    pub destination_rank: i32,
    pub destination_domain: i32,
}

impl ChunkInfo {
    pub const SIZE: usize = 16;

    pub fn new(num_elements: u64, destination_rank: i32, destination_domain: i32) -> Self {
        Self {
            num_elements,
            destination_rank,
            destination_domain,
        }
    }

    /// Chunk carries an a-priori destination domain.
    pub fn is_pinned(&self) -> bool {
        self.destination_domain >= 0
    }
}

/// Primitive kinds that may appear in a wire schema.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    U64,
    I32,
}

/// One field of a fixed-layout record: name, kind, byte displacement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WireField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub offset: usize,
}

/// Field order and widths of [`ChunkInfo`] as committed to the transport.
pub const CHUNK_INFO_SCHEMA: [WireField; 3] = [
    WireField {
        name: "num_elements",
        kind: FieldKind::U64,
        offset: 0,
    },
    WireField {
        name: "destination_rank",
        kind: FieldKind::I32,
        offset: 8,
    },
    WireField {
        name: "destination_domain",
        kind: FieldKind::I32,
        offset: 12,
    },
];

/// Header in front of every serialized mesh document.
/// All multi-byte integers are **little-endian** on the wire.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16,
    pub kind_le: u16,
    pub reserved_le: u32,
}

impl WireHdr {
    pub fn new(kind: u16) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            reserved_le: 0,
        }
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
}

/// Serialize a mesh document into a self-describing blob.
pub fn encode_mesh(mesh: &Node) -> Result<Vec<u8>, MeshError> {
    let hdr = WireHdr::new(KIND_MESH);
    let body = bincode::serialize(mesh)?;
    let mut out = Vec::with_capacity(size_of::<WireHdr>() + body.len());
    out.extend_from_slice(cast_slice(std::slice::from_ref(&hdr)));
    out.extend_from_slice(&body);
    Ok(out)
}

/// Inverse of [`encode_mesh`].
pub fn decode_mesh(bytes: &[u8]) -> Result<Node, MeshError> {
    let n = size_of::<WireHdr>();
    if bytes.len() < n {
        return Err(MeshError::Serialization(format!(
            "mesh blob of {} bytes is shorter than its header",
            bytes.len()
        )));
    }
    let hdr: WireHdr = bytemuck::pod_read_unaligned(&bytes[..n]);
    if hdr.version() != WIRE_VERSION {
        return Err(MeshError::WireVersion {
            expected: WIRE_VERSION,
            found: hdr.version(),
        });
    }
    if hdr.kind() != KIND_MESH {
        return Err(MeshError::Serialization(format!(
            "unexpected blob kind {}",
            hdr.kind()
        )));
    }
    Ok(bincode::deserialize(&bytes[n..])?)
}

// ===== Compile-time sanity checks =========================================

const _: () = {
    assert!(size_of::<ChunkInfo>() == ChunkInfo::SIZE);
    assert!(align_of::<ChunkInfo>() == 8);
    assert!(offset_of!(ChunkInfo, num_elements) == CHUNK_INFO_SCHEMA[0].offset);
    assert!(offset_of!(ChunkInfo, destination_rank) == CHUNK_INFO_SCHEMA[1].offset);
    assert!(offset_of!(ChunkInfo, destination_domain) == CHUNK_INFO_SCHEMA[2].offset);
    assert!(size_of::<WireHdr>() == 8);
};
static_assertions::assert_eq_size!(ChunkInfo, [u8; 16]);
static_assertions::assert_eq_align!(WireHdr, u32);

#[cfg(feature = "mpi-support")]
mod mpi_datatype {
    use super::{CHUNK_INFO_SCHEMA, ChunkInfo, FieldKind};
    use mpi::Address;
    use mpi::datatype::{Equivalence, UncommittedUserDatatype, UserDatatype};

    fn field_type(kind: FieldKind) -> UncommittedUserDatatype {
        match kind {
            FieldKind::U64 => UncommittedUserDatatype::contiguous(1, &u64::equivalent_datatype()),
            FieldKind::I32 => UncommittedUserDatatype::contiguous(1, &i32::equivalent_datatype()),
        }
    }

    /// Structured datatype built from [`CHUNK_INFO_SCHEMA`], not from the
    /// compiler's view of the struct.
    unsafe impl Equivalence for ChunkInfo {
        type Out = UserDatatype;

        fn equivalent_datatype() -> Self::Out {
            let blocklengths = [1; CHUNK_INFO_SCHEMA.len()];
            let displacements = CHUNK_INFO_SCHEMA.map(|f| f.offset as Address);
            let fields: Vec<UncommittedUserDatatype> =
                CHUNK_INFO_SCHEMA.iter().map(|f| field_type(f.kind)).collect();
            let types: Vec<_> = fields.iter().map(|t| t.as_ref()).collect();
            UserDatatype::structured(&blocklengths, &displacements, &types)
        }
    }
}
