//! Per-grid-cell point id bindings.

/// Point ids bound to one placed copy of the template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    point_ids: Vec<usize>,
}

impl Tile {
    /// Slot value for a template point that has no id yet.
    pub const INVALID_POINT: usize = usize::MAX;

    pub fn new(num_points: usize) -> Self {
        Self {
            point_ids: vec![Self::INVALID_POINT; num_points],
        }
    }

    pub fn point_ids(&self) -> &[usize] {
        &self.point_ids
    }

    /// Ids at the given template indices, in order.
    pub fn ids_at(&self, indices: &[usize]) -> Vec<usize> {
        indices.iter().map(|&i| self.point_ids[i]).collect()
    }

    /// Bind `ids[k]` to template slot `indices[k]`.
    pub fn set_ids_at(&mut self, indices: &[usize], ids: &[usize]) {
        for (&slot, &id) in indices.iter().zip(ids) {
            self.point_ids[slot] = id;
        }
    }

    /// Give every unbound slot the next id from `next`; returns the template
    /// indices that were bound.
    pub fn bind_unassigned(&mut self, next: &mut usize) -> Vec<usize> {
        let mut created = Vec::new();
        for (slot, id) in self.point_ids.iter_mut().enumerate() {
            if *id == Self::INVALID_POINT {
                *id = *next;
                *next += 1;
                created.push(slot);
            }
        }
        created
    }

    pub fn is_complete(&self) -> bool {
        self.point_ids.iter().all(|&id| id != Self::INVALID_POINT)
    }
}

/// Every tile of an `nx` x `ny` placement, row-major (`j` outer), plus the
/// generated 2D point coordinates.
#[derive(Clone, Debug)]
pub struct TileGrid {
    pub nx: usize,
    pub ny: usize,
    pub tiles: Vec<Tile>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl TileGrid {
    pub fn tile(&self, i: usize, j: usize) -> &Tile {
        &self.tiles[j * self.nx + i]
    }

    /// Number of distinct 2D points.
    pub fn num_points(&self) -> usize {
        self.x.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_slots_are_not_rebound() {
        let mut t = Tile::new(4);
        t.set_ids_at(&[0, 3], &[10, 11]);
        let mut next = 20;
        assert_eq!(t.bind_unassigned(&mut next), vec![1, 2]);
        assert_eq!(t.point_ids(), &[10, 20, 21, 11]);
        assert_eq!(next, 22);
        assert!(t.is_complete());
        assert_eq!(t.ids_at(&[3, 0]), vec![11, 10]);
    }
}
