//! Blueprint conventions on top of [`Node`]: element counting and offsets.
//!
//! A mesh document keeps coordinate sets under `coordsets/<name>`, topologies
//! under `topologies/<name>` and fields under `fields/<name>`. Only the paths
//! read here are interpreted; everything else is carried along untouched.

use super::Node;
use crate::mesh_error::MeshError;

/// Number of points of a fixed-size element shape.
pub fn shape_arity(shape: &str) -> Option<usize> {
    match shape {
        "point" => Some(1),
        "line" => Some(2),
        "tri" => Some(3),
        "quad" | "tet" => Some(4),
        "pyramid" => Some(5),
        "wedge" => Some(6),
        "hex" => Some(8),
        _ => None,
    }
}

/// Number of points in a coordinate set, or `None` when no axis is
/// recognised.
pub fn coordset_length(coordset: &Node) -> Option<usize> {
    match coordset.fetch("type").and_then(Node::as_str) {
        Some("uniform") => {
            let dims = coordset.fetch("dims")?;
            let mut n = 1usize;
            let mut any = false;
            for axis in ["i", "j", "k"] {
                if let Some(d) = dims.fetch(axis).and_then(Node::to_i64) {
                    n *= d.max(0) as usize;
                    any = true;
                }
            }
            any.then_some(n)
        }
        Some("rectilinear") => {
            let values = coordset.fetch("values")?;
            let mut n = 1usize;
            let mut any = false;
            for axis in ["x", "y", "z", "r", "theta", "phi"] {
                if let Some(a) = values.fetch(axis).and_then(Node::as_array) {
                    n *= a.len();
                    any = true;
                }
            }
            any.then_some(n)
        }
        _ => {
            let values = coordset.fetch("values")?;
            ["x", "y", "z", "r", "theta", "phi"]
                .iter()
                .find_map(|axis| values.fetch(axis).and_then(Node::as_array))
                .map(|a| a.len())
        }
    }
}

fn element_dims(coordset: &Node) -> Option<Vec<usize>> {
    match coordset.fetch("type").and_then(Node::as_str) {
        Some("uniform") => {
            let dims = coordset.fetch("dims")?;
            let v: Vec<usize> = ["i", "j", "k"]
                .iter()
                .filter_map(|a| dims.fetch(a).and_then(Node::to_i64))
                .map(|d| d.max(1) as usize - 1)
                .collect();
            (!v.is_empty()).then_some(v)
        }
        Some("rectilinear") => {
            let values = coordset.fetch("values")?;
            let v: Vec<usize> = ["x", "y", "z"]
                .iter()
                .filter_map(|a| values.fetch(a).and_then(Node::as_array))
                .map(|a| a.len().max(1) - 1)
                .collect();
            (!v.is_empty()).then_some(v)
        }
        _ => None,
    }
}

/// Number of elements in topology `topo` of `mesh`.
///
/// A topology whose coordinate set has no recognised axis contributes zero
/// elements; this is logged and is not an error.
pub fn topology_length(mesh: &Node, topo: &Node) -> Result<u64, MeshError> {
    let kind = topo.str_at("type")?;
    let coordset = || {
        topo.fetch("coordset")
            .and_then(Node::as_str)
            .and_then(|name| mesh.fetch(&format!("coordsets/{name}")))
    };
    match kind {
        "unstructured" => {
            if let Some(sizes) = topo.fetch("elements/sizes").and_then(Node::as_array) {
                return Ok(sizes.len() as u64);
            }
            let shape = topo.str_at("elements/shape")?;
            let conn = topo.array_at("elements/connectivity")?;
            match shape_arity(shape) {
                Some(arity) => Ok((conn.len() / arity) as u64),
                None => Err(MeshError::MissingField("elements/sizes".into())),
            }
        }
        "points" => match coordset().and_then(coordset_length) {
            Some(n) => Ok(n as u64),
            None => {
                log::debug!("points topology without coordinates; counting 0 elements");
                Ok(0)
            }
        },
        "uniform" | "rectilinear" => match coordset().and_then(element_dims) {
            Some(dims) => Ok(dims.iter().product::<usize>() as u64),
            None => {
                log::debug!("{kind} topology without coordinate axes; counting 0 elements");
                Ok(0)
            }
        },
        "structured" => {
            let dims = topo.fetch_existing("elements/dims")?;
            Ok(["i", "j", "k"]
                .iter()
                .filter_map(|a| dims.fetch(a).and_then(Node::to_i64))
                .map(|d| d.max(0) as u64)
                .product())
        }
        other => Err(MeshError::UnsupportedTopology(other.to_string())),
    }
}

/// Sum of element counts over every topology of `mesh`.
pub fn mesh_element_count(mesh: &Node) -> Result<u64, MeshError> {
    let Some(topos) = mesh.fetch("topologies") else {
        return Ok(0);
    };
    topos
        .children()
        .map(|(_, topo)| topology_length(mesh, topo))
        .sum()
}

/// Exclusive prefix sum of `elements/sizes` (or of the fixed shape arity).
pub fn generate_offsets(topo: &Node) -> Result<Vec<i64>, MeshError> {
    let sizes = match topo.fetch("elements/sizes").and_then(Node::as_array) {
        Some(s) => s.to_i64_vec(),
        None => {
            let shape = topo.str_at("elements/shape")?;
            let arity = shape_arity(shape)
                .ok_or_else(|| MeshError::MissingField("elements/sizes".into()))?;
            let n = topo.array_at("elements/connectivity")?.len() / arity;
            vec![arity as i64; n]
        }
    };
    Ok(sizes
        .iter()
        .scan(0i64, |acc, &s| {
            let off = *acc;
            *acc += s;
            Some(off)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_topology_mesh() -> Node {
        let mut m = Node::new();
        m.set("coordsets/coords/type", "explicit");
        m.set("coordsets/coords/values/x", vec![0.0, 1.0, 1.0, 0.0]);
        m.set("coordsets/coords/values/y", vec![0.0, 0.0, 1.0, 1.0]);
        m.set("topologies/mesh/type", "unstructured");
        m.set("topologies/mesh/coordset", "coords");
        m.set("topologies/mesh/elements/shape", "tri");
        m.set("topologies/mesh/elements/connectivity", vec![0i64, 1, 2, 0, 2, 3]);
        m.set("topologies/pts/type", "points");
        m.set("topologies/pts/coordset", "coords");
        m
    }

    #[test]
    fn counts_sum_over_topologies() {
        let m = two_topology_mesh();
        assert_eq!(mesh_element_count(&m).unwrap(), 2 + 4);
    }

    #[test]
    fn missing_axes_count_zero() {
        let mut m = Node::new();
        m.set("coordsets/c/type", "uniform");
        m.set("coordsets/c/origin/x", 0.0);
        m.set("topologies/t/type", "uniform");
        m.set("topologies/t/coordset", "c");
        assert_eq!(mesh_element_count(&m).unwrap(), 0);
    }

    #[test]
    fn uniform_counts_cells() {
        let mut m = Node::new();
        m.set("coordsets/c/type", "uniform");
        m.set("coordsets/c/dims/i", 4i64);
        m.set("coordsets/c/dims/j", 3i64);
        m.set("topologies/t/type", "uniform");
        m.set("topologies/t/coordset", "c");
        assert_eq!(mesh_element_count(&m).unwrap(), 6);
    }

    #[test]
    fn offsets_from_sizes() {
        let mut t = Node::new();
        t.set("elements/shape", "quad");
        t.set("elements/connectivity", vec![0i64; 8]);
        t.set("elements/sizes", vec![4i64, 4]);
        assert_eq!(generate_offsets(&t).unwrap(), vec![0, 4]);
        t.remove("elements/sizes");
        assert_eq!(generate_offsets(&t).unwrap(), vec![0, 4]);
    }
}
