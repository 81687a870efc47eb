//! The 2D point/quad template replicated by the tiler.

use crate::document::{DataArray, Node};
use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};

/// Template of points and quads placed once per tile.
///
/// `left`/`right` and `bottom`/`top` list the template points lying on each
/// edge, in matching traversal order, so that a tile's `right` points can be
/// reused as its right neighbour's `left` points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TilePattern {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub quads: Vec<[usize; 4]>,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub bottom: Vec<usize>,
    pub top: Vec<usize>,
}

impl Default for TilePattern {
    /// 33 points, 24 quads over a 20 x 20 square.
    fn default() -> Self {
        #[rustfmt::skip]
        let x = vec![
            0., 3., 10., 17., 20.,
            0., 3., 17., 20.,
            5., 15.,
            7., 10., 13.,
            0., 7., 10., 13., 20.,
            7., 10., 13.,
            5., 15.,
            0., 3., 17., 20.,
            0., 3., 10., 17., 20.,
        ];
        #[rustfmt::skip]
        let y = vec![
            0., 0., 0., 0., 0.,
            3., 3., 3., 3.,
            5., 5.,
            7., 7., 7.,
            10., 10., 10., 10., 10.,
            13., 13., 13.,
            15., 15.,
            17., 17., 17., 17.,
            20., 20., 20., 20., 20.,
        ];
        let quads = vec![
            // lower-left
            [0, 1, 6, 5],
            [1, 2, 9, 6],
            [2, 12, 11, 9],
            [5, 6, 9, 14],
            [9, 11, 15, 14],
            [11, 12, 16, 15],
            // lower-right
            [2, 3, 7, 10],
            [3, 4, 8, 7],
            [7, 8, 18, 10],
            [2, 10, 13, 12],
            [12, 13, 17, 16],
            [10, 18, 17, 13],
            // upper-left
            [14, 22, 25, 24],
            [14, 15, 19, 22],
            [15, 16, 20, 19],
            [24, 25, 29, 28],
            [22, 30, 29, 25],
            [19, 20, 30, 22],
            // upper-right
            [16, 17, 21, 20],
            [17, 18, 23, 21],
            [18, 27, 26, 23],
            [20, 21, 23, 30],
            [23, 26, 31, 30],
            [26, 27, 32, 31],
        ];
        Self {
            x,
            y,
            quads,
            left: vec![0, 5, 14, 24, 28],
            right: vec![4, 8, 18, 27, 32],
            bottom: vec![0, 1, 2, 3, 4],
            top: vec![28, 29, 30, 31, 32],
        }
    }
}

fn indices(tile: &Node, key: &str) -> Result<Vec<usize>, MeshError> {
    let values = tile.array_at(key)?.to_i64_vec();
    values
        .into_iter()
        .map(|v| {
            usize::try_from(v)
                .map_err(|_| MeshError::InvalidPattern(format!("negative index {v} in `{key}`")))
        })
        .collect()
}

fn extent(values: &[f64]) -> f64 {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo.is_finite() { hi - lo } else { 0.0 }
}

impl TilePattern {
    /// Read a pattern override from a `tile` options node. Every one of `x`,
    /// `y`, `quads`, `left`, `right`, `bottom`, `top` is required.
    pub fn from_node(tile: &Node) -> Result<Self, MeshError> {
        let x = tile.array_at("x").map(DataArray::to_f64_vec)?;
        let y = tile.array_at("y").map(DataArray::to_f64_vec)?;
        let flat = indices(tile, "quads")?;
        if flat.len() % 4 != 0 {
            return Err(MeshError::InvalidPattern(format!(
                "`quads` holds {} indices, not a multiple of 4",
                flat.len()
            )));
        }
        let quads = flat
            .chunks_exact(4)
            .map(|q| [q[0], q[1], q[2], q[3]])
            .collect();
        let pattern = Self {
            x,
            y,
            quads,
            left: indices(tile, "left")?,
            right: indices(tile, "right")?,
            bottom: indices(tile, "bottom")?,
            top: indices(tile, "top")?,
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Check the pattern is internally consistent.
    pub fn validate(&self) -> Result<(), MeshError> {
        let bad = |msg: String| Err(MeshError::InvalidPattern(msg));
        if self.x.len() != self.y.len() {
            return bad(format!("{} x values but {} y values", self.x.len(), self.y.len()));
        }
        if self.x.is_empty() {
            return bad("pattern has no points".into());
        }
        if self.left.len() != self.right.len() {
            return bad(format!(
                "left edge has {} points, right edge {}",
                self.left.len(),
                self.right.len()
            ));
        }
        if self.bottom.len() != self.top.len() {
            return bad(format!(
                "bottom edge has {} points, top edge {}",
                self.bottom.len(),
                self.top.len()
            ));
        }
        if self.left.len() < 2 || self.bottom.len() < 2 {
            return bad("each edge needs at least 2 points".into());
        }
        let n = self.num_points();
        let edges = [&self.left, &self.right, &self.bottom, &self.top];
        let out_of_range = self
            .quads
            .iter()
            .flatten()
            .chain(edges.into_iter().flatten())
            .find(|&&i| i >= n);
        if let Some(i) = out_of_range {
            return bad(format!("point index {i} out of range for {n} points"));
        }
        if self.width() <= 0.0 || self.height() <= 0.0 {
            return bad("pattern has zero width or height".into());
        }
        Ok(())
    }

    pub fn num_points(&self) -> usize {
        self.x.len()
    }

    pub fn num_quads(&self) -> usize {
        self.quads.len()
    }

    pub fn width(&self) -> f64 {
        extent(&self.x)
    }

    pub fn height(&self) -> f64 {
        extent(&self.y)
    }
}
