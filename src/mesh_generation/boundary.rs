//! Boundary edges (2D) and faces (3D) of a tiled mesh, tagged by side.
//!
//! Sides are visited in a fixed order and each side's tiles in a fixed
//! direction: left top-to-bottom, bottom left-to-right, right bottom-to-top,
//! top right-to-left. 3D side quads join an edge at plane `k` to the same
//! edge at plane `k + 1`; back faces reverse the template winding, front
//! faces keep it.

use super::options::Decomposition;
use super::pattern::TilePattern;
use super::tile::TileGrid;
use itertools::Itertools;

/// Side code stored in the `boundary_type` field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum BoundarySide {
    Left = 0,
    Right = 1,
    Bottom = 2,
    Top = 3,
    Back = 4,
    Front = 5,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 6] = [
        BoundarySide::Left,
        BoundarySide::Right,
        BoundarySide::Bottom,
        BoundarySide::Top,
        BoundarySide::Back,
        BoundarySide::Front,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// Which sides lie on the global exterior.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundaryFlags([bool; 6]);

impl BoundaryFlags {
    pub fn all() -> Self {
        Self([true; 6])
    }

    /// In a decomposition of more than one domain only sides touching the
    /// outside of the domain grid are active; otherwise every side is.
    pub fn from_decomposition(decomposition: Option<&Decomposition>) -> Self {
        match decomposition {
            Some(d) if d.num_domains() > 1 => {
                let [i, j, k] = d.domain;
                let [ni, nj, nk] = d.domains;
                Self([i == 0, i == ni - 1, j == 0, j == nj - 1, k == 0, k == nk - 1])
            }
            _ => Self::all(),
        }
    }

    pub fn is_active(&self, side: BoundarySide) -> bool {
        self.0[side as usize]
    }
}

/// One boundary element: 2 point ids (2D) or 4 (3D).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryElement {
    pub side: BoundarySide,
    pub ids: Vec<usize>,
}

/// Edge segments along one lateral side, in traversal order.
fn edge_pairs(grid: &TileGrid, pattern: &TilePattern, side: BoundarySide) -> Vec<(usize, usize)> {
    let (nx, ny) = (grid.nx, grid.ny);
    let forward = |ids: Vec<usize>| {
        ids.into_iter()
            .tuple_windows::<(usize, usize)>()
            .collect::<Vec<_>>()
    };
    let backward = |ids: Vec<usize>| {
        ids.into_iter()
            .rev()
            .tuple_windows::<(usize, usize)>()
            .collect::<Vec<_>>()
    };
    match side {
        BoundarySide::Left => (0..ny)
            .rev()
            .flat_map(|j| backward(grid.tile(0, j).ids_at(&pattern.left)))
            .collect(),
        BoundarySide::Bottom => (0..nx)
            .flat_map(|i| forward(grid.tile(i, 0).ids_at(&pattern.bottom)))
            .collect(),
        BoundarySide::Right => (0..ny)
            .flat_map(|j| forward(grid.tile(nx - 1, j).ids_at(&pattern.right)))
            .collect(),
        BoundarySide::Top => (0..nx)
            .rev()
            .flat_map(|i| backward(grid.tile(i, ny - 1).ids_at(&pattern.top)))
            .collect(),
        BoundarySide::Back | BoundarySide::Front => Vec::new(),
    }
}

/// Boundary edges of a 2D tiling: left, bottom, right, top.
pub fn boundary_2d(
    grid: &TileGrid,
    pattern: &TilePattern,
    flags: BoundaryFlags,
) -> Vec<BoundaryElement> {
    if grid.tiles.is_empty() {
        return Vec::new();
    }
    [
        BoundarySide::Left,
        BoundarySide::Bottom,
        BoundarySide::Right,
        BoundarySide::Top,
    ]
    .into_iter()
    .filter(|&side| flags.is_active(side))
    .flat_map(|side| {
        edge_pairs(grid, pattern, side)
            .into_iter()
            .map(move |(a, b)| BoundaryElement {
                side,
                ids: vec![a, b],
            })
    })
    .collect()
}

/// Template quads of tile `(i, j)` as point ids shifted by `offset`.
fn tile_faces(
    grid: &TileGrid,
    pattern: &TilePattern,
    (i, j): (usize, usize),
    offset: usize,
    reverse: bool,
) -> impl Iterator<Item = Vec<usize>> {
    let ids = grid.tile(i, j).point_ids().to_vec();
    pattern.quads.clone().into_iter().map(move |q| {
        let order: [usize; 4] = if reverse { [3, 2, 1, 0] } else { [0, 1, 2, 3] };
        order.iter().map(|&c| offset + ids[q[c]]).collect()
    })
}

/// Boundary quads of a 3D extrusion with `nz` layers of
/// `points_per_plane` points: left, right, bottom, top, back, front.
pub fn boundary_3d(
    grid: &TileGrid,
    pattern: &TilePattern,
    nz: usize,
    points_per_plane: usize,
    flags: BoundaryFlags,
) -> Vec<BoundaryElement> {
    let mut out = Vec::new();
    if grid.tiles.is_empty() || nz == 0 {
        return out;
    }
    let (nx, ny) = (grid.nx, grid.ny);
    for side in [
        BoundarySide::Left,
        BoundarySide::Right,
        BoundarySide::Bottom,
        BoundarySide::Top,
    ] {
        if !flags.is_active(side) {
            continue;
        }
        let pairs = edge_pairs(grid, pattern, side);
        for k in 0..nz {
            let o1 = k * points_per_plane;
            let o2 = o1 + points_per_plane;
            out.extend(pairs.iter().map(|&(a, b)| BoundaryElement {
                side,
                ids: vec![o1 + a, o1 + b, o2 + b, o2 + a],
            }));
        }
    }
    if flags.is_active(BoundarySide::Back) {
        for j in 0..ny {
            for i in (0..nx).rev() {
                out.extend(
                    tile_faces(grid, pattern, (i, j), 0, true).map(|ids| BoundaryElement {
                        side: BoundarySide::Back,
                        ids,
                    }),
                );
            }
        }
    }
    if flags.is_active(BoundarySide::Front) {
        let offset = nz * points_per_plane;
        for j in 0..ny {
            for i in 0..nx {
                out.extend(
                    tile_faces(grid, pattern, (i, j), offset, false).map(|ids| {
                        BoundaryElement {
                            side: BoundarySide::Front,
                            ids,
                        }
                    }),
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for s in BoundarySide::ALL {
            assert_eq!(BoundarySide::from_code(s.code()), Some(s));
        }
        assert_eq!(BoundarySide::Front.code(), 5);
        assert_eq!(BoundarySide::from_code(6), None);
    }

    #[test]
    fn interior_domain_has_no_lateral_sides() {
        let d = Decomposition {
            domain: [1, 1, 0],
            domains: [3, 3, 1],
        };
        let f = BoundaryFlags::from_decomposition(Some(&d));
        assert!(!f.is_active(BoundarySide::Left));
        assert!(!f.is_active(BoundarySide::Right));
        assert!(!f.is_active(BoundarySide::Bottom));
        assert!(!f.is_active(BoundarySide::Top));
        assert!(f.is_active(BoundarySide::Back));
        assert!(f.is_active(BoundarySide::Front));
    }

    #[test]
    fn single_domain_is_all_exterior() {
        let d = Decomposition {
            domain: [0, 0, 0],
            domains: [1, 1, 1],
        };
        assert_eq!(BoundaryFlags::from_decomposition(Some(&d)), BoundaryFlags::all());
        assert_eq!(BoundaryFlags::from_decomposition(None), BoundaryFlags::all());
    }
}
