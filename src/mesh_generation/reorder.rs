//! Locality-friendly renumbering of an unstructured topology.
//!
//! Elements are sorted along a Hilbert curve through their centroids; points
//! are then renumbered in order of first use by the sorted elements.
//! Coordinates, connectivity, sizes, offsets and every field defined on the
//! topology are permuted together.

use crate::document::{DataArray, Node, generate_offsets};
use crate::mesh_error::MeshError;
use lindel::Lineariseable;
use log::debug;
use rayon::prelude::ParallelSliceMut;

const AXES: [&str; 3] = ["x", "y", "z"];

fn axis_values(coordset: &Node) -> Vec<Vec<f64>> {
    AXES.iter()
        .filter_map(|a| coordset.fetch(&format!("values/{a}")))
        .filter_map(Node::as_array)
        .map(DataArray::to_f64_vec)
        .collect()
}

/// Element order (new position -> old element) along a Hilbert curve through
/// element centroids. Ties keep the original order.
pub fn spatial_ordering(coordset: &Node, topo: &Node) -> Result<Vec<usize>, MeshError> {
    let axes = axis_values(coordset);
    let conn = topo.array_at("elements/connectivity")?.to_i64_vec();
    let offsets = generate_offsets(topo)?;
    let sizes = element_sizes(topo, &offsets, conn.len());

    let mut lo = [0.0f64; 3];
    let mut hi = [0.0f64; 3];
    for (d, values) in axes.iter().enumerate() {
        lo[d] = values.iter().copied().fold(f64::INFINITY, f64::min);
        hi[d] = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    }

    let scale = u16::MAX as f64;
    let hilbert = |center: &[f64; 3]| {
        let mut q = [0u16; 3];
        for d in 0..axes.len() {
            let extent = hi[d] - lo[d];
            if extent > 0.0 {
                q[d] = (scale * (center[d] - lo[d]) / extent).round() as u16;
            }
        }
        q.hilbert_index() as u64
    };

    let mut keyed: Vec<(u64, usize)> = offsets
        .iter()
        .zip(&sizes)
        .enumerate()
        .map(|(e, (&off, &n))| {
            let mut center = [0.0f64; 3];
            let ids = &conn[off as usize..off as usize + n];
            for &id in ids {
                for (d, values) in axes.iter().enumerate() {
                    center[d] += values.get(id as usize).copied().unwrap_or_default();
                }
            }
            if n > 0 {
                center.iter_mut().for_each(|c| *c /= n as f64);
            }
            (hilbert(&center), e)
        })
        .collect();
    keyed.par_sort_unstable();
    debug!("spatial ordering of {} elements", keyed.len());
    Ok(keyed.into_iter().map(|(_, e)| e).collect())
}

fn element_sizes(topo: &Node, offsets: &[i64], conn_len: usize) -> Vec<usize> {
    match topo.fetch("elements/sizes").and_then(Node::as_array) {
        Some(s) => s.to_i64_vec().into_iter().map(|v| v as usize).collect(),
        None => offsets
            .iter()
            .enumerate()
            .map(|(e, &o)| {
                let end = offsets.get(e + 1).map_or(conn_len as i64, |&n| n);
                (end - o) as usize
            })
            .collect(),
    }
}

fn permute_values(values: &Node, order: &[usize]) -> Node {
    match values {
        Node::Array(a) => Node::Array(a.permuted(order)),
        Node::Object(children) => Node::Object(
            children
                .iter()
                .map(|(k, v)| (k.clone(), permute_values(v, order)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Apply element `order` to topology `topo_name` of `mesh` and renumber its
/// points by first use. Returns the old -> new point map.
pub fn reorder_unstructured(
    mesh: &mut Node,
    topo_name: &str,
    order: &[usize],
) -> Result<Vec<usize>, MeshError> {
    let topo_path = format!("topologies/{topo_name}");
    let topo = mesh.fetch_existing(&topo_path)?;
    let coordset_name = topo.str_at("coordset")?.to_string();
    let coordset_path = format!("coordsets/{coordset_name}");
    let coordset = mesh.fetch_existing(&coordset_path)?;

    let conn_array = topo.array_at("elements/connectivity")?;
    let conn_dtype = conn_array.dtype();
    let conn = conn_array.to_i64_vec();
    let offsets = generate_offsets(topo)?;
    let sizes = element_sizes(topo, &offsets, conn.len());
    if order.len() != sizes.len() {
        return Err(MeshError::InvalidGeometry(format!(
            "element order has {} entries for {} elements",
            order.len(),
            sizes.len()
        )));
    }
    let num_points = axis_values(coordset).first().map_or(0, Vec::len);
    if let Some(&bad) = conn.iter().find(|&&id| id < 0 || id as usize >= num_points) {
        return Err(MeshError::InvalidGeometry(format!(
            "connectivity references point {bad} of {num_points}"
        )));
    }

    let mut old2new = vec![usize::MAX; num_points];
    let mut new2old = Vec::with_capacity(num_points);
    let mut new_conn = Vec::with_capacity(conn.len());
    for &e in order {
        let start = offsets[e] as usize;
        for &id in &conn[start..start + sizes[e]] {
            let id = id as usize;
            if old2new[id] == usize::MAX {
                old2new[id] = new2old.len();
                new2old.push(id);
            }
            new_conn.push(old2new[id] as i64);
        }
    }
    for (id, slot) in old2new.iter_mut().enumerate() {
        if *slot == usize::MAX {
            *slot = new2old.len();
            new2old.push(id);
        }
    }

    let new_sizes: Vec<i64> = order.iter().map(|&e| sizes[e] as i64).collect();
    let new_offsets: Vec<i64> = new_sizes
        .iter()
        .scan(0i64, |acc, &s| {
            let o = *acc;
            *acc += s;
            Some(o)
        })
        .collect();
    let sizes_dtype = topo
        .fetch("elements/sizes")
        .and_then(Node::as_array)
        .map_or(conn_dtype, DataArray::dtype);

    let coords: Vec<(String, DataArray)> = AXES
        .iter()
        .filter_map(|a| {
            coordset
                .fetch(&format!("values/{a}"))
                .and_then(Node::as_array)
                .map(|v| (format!("{coordset_path}/values/{a}"), v.permuted(&new2old)))
        })
        .collect();
    for (path, values) in coords {
        mesh.set(&path, values);
    }

    mesh.set(
        &format!("{topo_path}/elements/connectivity"),
        DataArray::from(new_conn).convert(conn_dtype),
    );
    mesh.set(
        &format!("{topo_path}/elements/sizes"),
        DataArray::from(new_sizes).convert(sizes_dtype),
    );
    mesh.set(
        &format!("{topo_path}/elements/offsets"),
        DataArray::from(new_offsets).convert(sizes_dtype),
    );

    let mut updates = Vec::new();
    if let Some(fields) = mesh.fetch("fields") {
        for (name, field) in fields.children() {
            if field.fetch("topology").and_then(Node::as_str) != Some(topo_name) {
                continue;
            }
            let Some(values) = field.fetch("values") else {
                continue;
            };
            let permutation = match field.fetch("association").and_then(Node::as_str) {
                Some("vertex") => &new2old[..],
                Some("element") => order,
                _ => continue,
            };
            updates.push((
                format!("fields/{name}/values"),
                permute_values(values, permutation),
            ));
        }
    }
    for (path, values) in updates {
        mesh.set(&path, values);
    }
    debug!(
        "reordered {} elements and {} points of `{topo_name}`",
        order.len(),
        num_points
    );
    Ok(old2new)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three unit quads in a row, listed out of spatial order.
    fn strip() -> Node {
        let mut m = Node::new();
        m.set("coordsets/coords/type", "explicit");
        m.set(
            "coordsets/coords/values/x",
            vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0],
        );
        m.set(
            "coordsets/coords/values/y",
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        );
        m.set("topologies/mesh/type", "unstructured");
        m.set("topologies/mesh/coordset", "coords");
        m.set("topologies/mesh/elements/shape", "quad");
        m.set(
            "topologies/mesh/elements/connectivity",
            vec![2i32, 3, 7, 6, 0, 1, 5, 4, 1, 2, 6, 5],
        );
        m.set("topologies/mesh/elements/sizes", vec![4i32, 4, 4]);
        m.set("fields/elemids/topology", "mesh");
        m.set("fields/elemids/association", "element");
        m.set("fields/elemids/values", vec![0i64, 1, 2]);
        m.set("fields/nodeids/topology", "mesh");
        m.set("fields/nodeids/association", "vertex");
        m.set("fields/nodeids/values", vec![0i64, 1, 2, 3, 4, 5, 6, 7]);
        m
    }

    #[test]
    fn ordering_is_a_permutation() {
        let m = strip();
        let order = spatial_ordering(
            m.fetch("coordsets/coords").unwrap(),
            m.fetch("topologies/mesh").unwrap(),
        )
        .unwrap();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn reorder_keeps_geometry_and_fields_consistent() {
        let mut m = strip();
        let before = m.clone();
        let order = vec![1, 2, 0];
        let old2new = reorder_unstructured(&mut m, "mesh", &order).unwrap();

        // first element now is old element 1: points 0,1,5,4 -> 0,1,2,3
        let conn = m.array_at("topologies/mesh/elements/connectivity").unwrap();
        assert_eq!(conn.dtype(), crate::document::DataType::Int32);
        assert_eq!(&conn.to_i64_vec()[..4], &[0, 1, 2, 3]);
        assert_eq!(
            m.array_at("topologies/mesh/elements/offsets").unwrap().to_i64_vec(),
            vec![0, 4, 8]
        );

        let x0 = before.array_at("coordsets/coords/values/x").unwrap().to_f64_vec();
        let x1 = m.array_at("coordsets/coords/values/x").unwrap().to_f64_vec();
        let ids0 = before.array_at("fields/nodeids/values").unwrap().to_i64_vec();
        let ids1 = m.array_at("fields/nodeids/values").unwrap().to_i64_vec();
        for (old, &new) in old2new.iter().enumerate() {
            assert_eq!(x0[old], x1[new]);
            assert_eq!(ids0[old], ids1[new]);
        }
        assert_eq!(
            m.array_at("fields/elemids/values").unwrap().to_i64_vec(),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn wrong_order_length_rejected() {
        let mut m = strip();
        assert!(reorder_unstructured(&mut m, "mesh", &[0, 1]).is_err());
    }
}
