//! Tiled mesh generation with side-tagged boundary topology.

pub mod boundary;
pub mod options;
pub mod pattern;
pub mod reorder;
pub mod tile;
pub mod tiler;

pub use boundary::{BoundaryElement, BoundaryFlags, BoundarySide};
pub use options::{Decomposition, Extents, IndexType, TilerOptions};
pub use pattern::TilePattern;
pub use tile::{Tile, TileGrid};
pub use tiler::{Placement, Tiler};

use crate::document::Node;
use crate::mesh_error::MeshError;

/// Generate an `nx` x `ny` (x `nz`) tiled mesh from an options document.
///
/// Recognised options: `tile`, `reorder`, `datatype`, `extents`,
/// `domain`/`domains` and `fields`; see [`TilerOptions`].
pub fn tiled(nx: usize, ny: usize, nz: usize, options: &Node) -> Result<Node, MeshError> {
    let options = TilerOptions::from_node(options)?;
    Tiler::new().generate(nx, ny, nz, &options)
}
