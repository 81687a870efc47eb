//! Tiled unstructured mesh generator.
//!
//! A [`TilePattern`] is stamped onto an `nx` x `ny` grid, row by row. Before
//! a tile creates its points it inherits the `right` points of its left
//! neighbour as its `left` points and the `top` points of the tile below as
//! its `bottom` points, so every shared point exists exactly once. With
//! `nz >= 1` the 2D points are copied onto `nz + 1` planes and every quad
//! becomes a column of hexahedra.

use super::boundary::{BoundaryElement, BoundaryFlags, boundary_2d, boundary_3d};
use super::options::TilerOptions;
use super::pattern::TilePattern;
use super::reorder::{reorder_unstructured, spatial_ordering};
use super::tile::{Tile, TileGrid};
use crate::document::{DataArray, DataType, Node, generate_offsets};
use crate::mesh_error::MeshError;
use log::debug;

/// Scale and translation mapping template coordinates onto the grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Placement {
    /// Tile size along x and y.
    pub tile_size: [f64; 2],
    pub origin: [f64; 3],
    /// z of the top plane.
    pub z_top: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Tiler {
    pattern: TilePattern,
}

impl Tiler {
    /// Tiler using the built-in pattern.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(pattern: TilePattern) -> Result<Self, MeshError> {
        pattern.validate()?;
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &TilePattern {
        &self.pattern
    }

    /// Where tiles go for an `nx` x `ny` x `nz` grid.
    pub fn placement(
        pattern: &TilePattern,
        nx: usize,
        ny: usize,
        nz: usize,
        options: &TilerOptions,
    ) -> Placement {
        let (w, h) = (pattern.width(), pattern.height());
        let mut placement = Placement {
            tile_size: [w, h],
            origin: [0.0; 3],
            z_top: w.max(h) * nz as f64,
        };
        if let Some(e) = options.extents {
            placement.tile_size = [(e[1] - e[0]) / nx as f64, (e[3] - e[2]) / ny as f64];
            placement.origin = [e[0], e[2], e[4]];
            placement.z_top = e[5];
        } else if let Some(d) = options.decomposition {
            let depth = placement.z_top;
            placement.origin = [
                d.domain[0] as f64 * nx as f64 * w,
                d.domain[1] as f64 * ny as f64 * h,
                d.domain[2] as f64 * depth,
            ];
            placement.z_top = placement.origin[2] + depth;
        }
        placement
    }

    /// Create every tile and its 2D points, sharing edge points between
    /// neighbours.
    pub fn place_tiles(
        pattern: &TilePattern,
        nx: usize,
        ny: usize,
        placement: &Placement,
    ) -> TileGrid {
        let [tx, ty] = placement.tile_size;
        let sx = tx / pattern.width();
        let sy = ty / pattern.height();
        let mut grid = TileGrid {
            nx,
            ny,
            tiles: Vec::with_capacity(nx * ny),
            x: Vec::new(),
            y: Vec::new(),
        };
        let mut next = 0usize;
        for j in 0..ny {
            let oy = placement.origin[1] + j as f64 * ty;
            for i in 0..nx {
                let ox = placement.origin[0] + i as f64 * tx;
                let mut current = Tile::new(pattern.num_points());
                if i > 0 {
                    let prev = &grid.tiles[j * nx + i - 1];
                    current.set_ids_at(&pattern.left, &prev.ids_at(&pattern.right));
                }
                if j > 0 {
                    let below = &grid.tiles[(j - 1) * nx + i];
                    current.set_ids_at(&pattern.bottom, &below.ids_at(&pattern.top));
                }
                for slot in current.bind_unassigned(&mut next) {
                    grid.x.push(pattern.x[slot] * sx + ox);
                    grid.y.push(pattern.y[slot] * sy + oy);
                }
                grid.tiles.push(current);
            }
        }
        grid
    }

    /// Generate an `nx` x `ny` tiling, extruded into `nz` layers of hexes
    /// when `nz >= 1`.
    pub fn generate(
        &self,
        nx: usize,
        ny: usize,
        nz: usize,
        options: &TilerOptions,
    ) -> Result<Node, MeshError> {
        if nx == 0 || ny == 0 {
            return Err(MeshError::InvalidGeometry(format!(
                "tile grid must be at least 1 x 1, got {nx} x {ny}"
            )));
        }
        let pattern = options.tile.as_ref().unwrap_or(&self.pattern);
        pattern.validate()?;

        let placement = Self::placement(pattern, nx, ny, nz, options);
        debug!("tiler placement {placement:?}");
        let grid = Self::place_tiles(pattern, nx, ny, &placement);
        let points_per_plane = grid.num_points();

        let mut conn: Vec<i64> = Vec::new();
        let mut sizes: Vec<i64> = Vec::new();
        let (x, y, z) = if nz == 0 {
            for tile in &grid.tiles {
                let ids = tile.point_ids();
                for q in &pattern.quads {
                    conn.extend(q.iter().map(|&c| ids[c] as i64));
                    sizes.push(4);
                }
            }
            (grid.x.clone(), grid.y.clone(), None)
        } else {
            let planes = nz + 1;
            let mut x = Vec::with_capacity(points_per_plane * planes);
            let mut y = Vec::with_capacity(points_per_plane * planes);
            let mut z = Vec::with_capacity(points_per_plane * planes);
            let oz = placement.origin[2];
            for p in 0..planes {
                let t = p as f64 / nz as f64;
                let zp = (1.0 - t) * oz + t * placement.z_top;
                x.extend_from_slice(&grid.x);
                y.extend_from_slice(&grid.y);
                z.extend(std::iter::repeat_n(zp, points_per_plane));
            }
            for k in 0..nz {
                let lower = k * points_per_plane;
                let upper = lower + points_per_plane;
                for tile in &grid.tiles {
                    let ids = tile.point_ids();
                    for q in &pattern.quads {
                        conn.extend(q.iter().map(|&c| (lower + ids[c]) as i64));
                        conn.extend(q.iter().map(|&c| (upper + ids[c]) as i64));
                        sizes.push(8);
                    }
                }
            }
            (x, y, Some(z))
        };

        let index = options.index_type.data_type();
        let mut res = Node::new();
        res.set("coordsets/coords/type", "explicit");
        if options.fields {
            add_debug_fields(&mut res, &x, &y, z.as_deref(), sizes.len());
        }
        res.set("coordsets/coords/values/x", x);
        res.set("coordsets/coords/values/y", y);
        if let Some(z) = z {
            res.set("coordsets/coords/values/z", z);
        }
        res.set("topologies/mesh/type", "unstructured");
        res.set("topologies/mesh/coordset", "coords");
        res.set(
            "topologies/mesh/elements/shape",
            if nz == 0 { "quad" } else { "hex" },
        );
        res.set(
            "topologies/mesh/elements/connectivity",
            DataArray::from(conn).convert(index),
        );
        res.set(
            "topologies/mesh/elements/sizes",
            DataArray::from(sizes).convert(index),
        );

        let old2new = if options.reorder {
            let offsets = generate_offsets(res.fetch_existing("topologies/mesh")?)?;
            res.set(
                "topologies/mesh/elements/offsets",
                DataArray::from(offsets).convert(index),
            );
            let order = spatial_ordering(
                res.fetch_existing("coordsets/coords")?,
                res.fetch_existing("topologies/mesh")?,
            )?;
            Some(reorder_unstructured(&mut res, "mesh", &order)?)
        } else {
            None
        };

        let flags = BoundaryFlags::from_decomposition(options.decomposition.as_ref());
        let boundary = if nz == 0 {
            boundary_2d(&grid, pattern, flags)
        } else {
            boundary_3d(&grid, pattern, nz, points_per_plane, flags)
        };
        if !boundary.is_empty() {
            write_boundary(&mut res, &boundary, old2new.as_deref(), nz == 0, index);
        }
        Ok(res)
    }
}

fn write_boundary(
    res: &mut Node,
    boundary: &[BoundaryElement],
    old2new: Option<&[usize]>,
    is_2d: bool,
    index: DataType,
) {
    let renumber = |id: usize| old2new.map_or(id, |m| m[id]) as i64;
    let conn: Vec<i64> = boundary
        .iter()
        .flat_map(|b| b.ids.iter().map(|&id| renumber(id)))
        .collect();
    let sizes: Vec<i64> = boundary.iter().map(|b| b.ids.len() as i64).collect();
    let sides: Vec<i32> = boundary.iter().map(|b| b.side.code()).collect();

    res.set("topologies/boundary/type", "unstructured");
    res.set("topologies/boundary/coordset", "coords");
    res.set(
        "topologies/boundary/elements/shape",
        if is_2d { "line" } else { "quad" },
    );
    res.set(
        "topologies/boundary/elements/connectivity",
        DataArray::from(conn).convert(index),
    );
    res.set(
        "topologies/boundary/elements/sizes",
        DataArray::from(sizes).convert(index),
    );
    res.set("fields/boundary_type/topology", "boundary");
    res.set("fields/boundary_type/association", "element");
    res.set("fields/boundary_type/values", sides);
}

/// Vertex ids, element ids and distance from the origin, used to check that
/// reordering moves fields along with the mesh.
fn add_debug_fields(res: &mut Node, x: &[f64], y: &[f64], z: Option<&[f64]>, num_elements: usize) {
    let dist: Vec<f64> = (0..x.len())
        .map(|i| {
            let zi = z.map_or(0.0, |z| z[i]);
            (x[i] * x[i] + y[i] * y[i] + zi * zi).sqrt()
        })
        .collect();
    res.set("fields/nodeids/topology", "mesh");
    res.set("fields/nodeids/association", "vertex");
    res.set("fields/nodeids/values", (0..x.len() as i64).collect::<Vec<_>>());
    res.set("fields/elemids/topology", "mesh");
    res.set("fields/elemids/association", "element");
    res.set(
        "fields/elemids/values",
        (0..num_elements as i64).collect::<Vec<_>>(),
    );
    res.set("fields/dist/topology", "mesh");
    res.set("fields/dist/association", "vertex");
    res.set("fields/dist/values", dist);
}
