//! Hierarchical mesh documents.
//!
//! A mesh travels through this crate as a [`Node`] tree following the
//! blueprint layout (`coordsets`, `topologies`, `fields`, `state`). Leaves are
//! shared, reference-counted arrays so that wrapping or re-stamping a mesh
//! never copies its bulk data.

pub mod array;
pub mod node;
pub mod topology;

pub use array::{DataArray, DataType};
pub use node::Node;
pub use topology::{generate_offsets, mesh_element_count, topology_length};
