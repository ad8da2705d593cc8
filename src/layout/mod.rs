// Constrained radial layout.
//
// A central entity sits at the viewport center; everyone else lives in a
// sector (angular wedge) and a circle (radial band). Layout happens in two
// stages:
// - sectors: deterministic angle assignment per entity
// - force_sim: iterative relaxation (repulsion, collision, links) with a soft
//   boundary correction that keeps every node inside its legal region
//
// Angles are compass degrees: 0 = up (12 o'clock), increasing clockwise, in
// screen coordinates (y grows downward).
//
// Submodules:
// - rings: circle radius table and radial bands
// - region: legal regions and the drag projector
// - adjacency: link degree counts
// - spatial_grid: collision candidate lookup
// - forces: the individual forces, applied in a fixed order
// - force_sim: the simulation engine

use serde::Serialize;

use crate::error::LayoutError;

pub mod adjacency;
pub mod force_sim;
pub mod forces;
pub mod region;
pub mod rings;
pub mod sectors;
pub mod spatial_grid;

pub use force_sim::{ForceConfig, ForceSimulation};
pub use region::{AngularSpan, Region, project};
pub use rings::{Band, RingTable};
pub use sectors::{Sector, SortValue, partition_sectors};

/// Tolerance for "on the boundary" comparisons, in degrees or pixels.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PointF) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Drawing surface size; the diagram center is the middle of it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, LayoutError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(LayoutError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn center(&self) -> PointF {
        PointF::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Normalize an angle into [0, 360).
pub fn normalize_angle(deg: f64) -> f64 {
    let a = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Shortest angular distance between two angles, in [0, 180].
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = normalize_angle(a - b);
    d.min(360.0 - d)
}

/// Point at `radius` from `center` in compass direction `angle_deg`.
pub fn polar(center: PointF, angle_deg: f64, radius: f64) -> PointF {
    let rad = angle_deg.to_radians();
    PointF::new(center.x + radius * rad.sin(), center.y - radius * rad.cos())
}

/// Compass angle of `p` seen from `center`, in [0, 360).
pub fn compass_angle(center: PointF, p: PointF) -> f64 {
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    normalize_angle(dx.atan2(-dy).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_compass_convention() {
        let c = PointF::new(400.0, 300.0);

        let up = polar(c, 0.0, 100.0);
        assert!(close(up.x, 400.0) && close(up.y, 200.0));

        let right = polar(c, 90.0, 100.0);
        assert!(close(right.x, 500.0) && close(right.y, 300.0));

        let down = polar(c, 180.0, 100.0);
        assert!(close(down.x, 400.0) && close(down.y, 400.0));

        assert!(close(compass_angle(c, right), 90.0));
        assert!(close(compass_angle(c, polar(c, 270.0, 50.0)), 270.0));
        assert!(close(compass_angle(c, up), 0.0));
    }

    #[test]
    fn test_angle_helpers() {
        assert!(close(normalize_angle(-10.0), 350.0));
        assert!(close(normalize_angle(725.0), 5.0));
        assert!(normalize_angle(-1e-18) < 360.0);

        assert!(close(angular_distance(350.0, 10.0), 20.0));
        assert!(close(angular_distance(10.0, 350.0), 20.0));
        assert!(close(angular_distance(0.0, 180.0), 180.0));
    }

    #[test]
    fn test_viewport_validation() {
        assert!(Viewport::new(800.0, 600.0).is_ok());
        assert!(Viewport::new(0.0, 600.0).is_err());
        assert!(Viewport::new(f64::NAN, 600.0).is_err());

        let vp = Viewport::new(800.0, 600.0).unwrap();
        assert_eq!(vp.center(), PointF::new(400.0, 300.0));
        assert_eq!(vp.min_dimension(), 600.0);
    }
}
