// Circle (ring) radius table.
//
// Ring k occupies the band (outer radius of the previous configured ring,
// outer radius of k]. Ring 1's inner bound is 0. Radii must strictly increase
// with index; entries that do not are left out of the table.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Viewport;

/// Radial band [inner, outer] measured from the diagram center.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Band {
    pub inner: f64,
    pub outer: f64,
}

impl Band {
    pub fn mid(&self) -> f64 {
        (self.inner + self.outer) / 2.0
    }

    pub fn contains(&self, radius: f64, tolerance: f64) -> bool {
        radius >= self.inner - tolerance && radius <= self.outer + tolerance
    }

    pub fn clamp(&self, radius: f64) -> f64 {
        radius.clamp(self.inner, self.outer)
    }
}

/// A `circle_radius` entry that could not become a ring.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SkippedRing {
    pub index: u32,
    pub radius: f64,
    /// Outer radius of the last accepted ring inside it (0 for none).
    pub inner: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingTable {
    /// (index, outer radius), sorted by index.
    rings: Vec<(u32, f64)>,
}

impl RingTable {
    /// Build from the document's `circle_radius` table. Entries with index 0,
    /// a non-finite or non-positive radius, or a radius not larger than the
    /// previous accepted ring are skipped and returned alongside the table.
    pub fn from_radii(table: &BTreeMap<u32, f64>) -> (Self, Vec<SkippedRing>) {
        let mut rings = Vec::with_capacity(table.len());
        let mut skipped = Vec::new();
        let mut inner = 0.0;

        for (&index, &radius) in table {
            if index == 0 || !radius.is_finite() || radius <= inner {
                skipped.push(SkippedRing { index, radius, inner });
                continue;
            }
            rings.push((index, radius));
            inner = radius;
        }

        (Self { rings }, skipped)
    }

    /// Three rings scaled to the viewport, used when the document has no radius table.
    pub fn for_viewport(viewport: Viewport) -> Self {
        let max = viewport.min_dimension() * 0.45;
        Self {
            rings: vec![(1, max * 0.4), (2, max * 0.7), (3, max)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Band for a configured circle index.
    pub fn band(&self, index: u32) -> Option<Band> {
        let pos = self.rings.iter().position(|&(i, _)| i == index)?;
        Some(self.band_at(pos))
    }

    /// Index and band of the outermost configured circle.
    pub fn outermost(&self) -> Option<(u32, Band)> {
        let pos = self.rings.len().checked_sub(1)?;
        Some((self.rings[pos].0, self.band_at(pos)))
    }

    pub fn outer_radius(&self) -> Option<f64> {
        self.rings.last().map(|&(_, r)| r)
    }

    /// All (index, band) pairs, innermost first.
    pub fn bands(&self) -> Vec<(u32, Band)> {
        (0..self.rings.len()).map(|pos| (self.rings[pos].0, self.band_at(pos))).collect()
    }

    fn band_at(&self, pos: usize) -> Band {
        let inner = if pos == 0 { 0.0 } else { self.rings[pos - 1].1 };
        Band { inner, outer: self.rings[pos].1 }
    }
}
