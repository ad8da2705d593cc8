// Spatial hash grid for collision candidate lookup.
//
// Instead of checking every node pair, nodes are bucketed into square cells
// and a query only visits the cells its circle overlaps. Cell size should be
// roughly the largest collision diameter.

use std::collections::HashMap;

use super::PointF;

/// Uniform grid over arena indices.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { 1.0 };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, p: PointF) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Insert node `index` at point `p`.
    pub fn insert(&mut self, index: usize, p: PointF) {
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Indices of nodes that may lie within `radius` of `p`, ascending.
    /// May include false positives; the caller does the exact distance check.
    pub fn query(&self, p: PointF, radius: f64) -> Vec<usize> {
        let radius = radius.max(0.0);
        let (min_x, min_y) = self.cell_of(PointF::new(p.x - radius, p.y - radius));
        let (max_x, max_y) = self.cell_of(PointF::new(p.x + radius, p.y + radius));

        let mut result = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                if let Some(indices) = self.cells.get(&(cx, cy)) {
                    result.extend_from_slice(indices);
                }
            }
        }
        // each index lives in exactly one cell, so no dedup needed
        result.sort_unstable();
        result
    }
}
