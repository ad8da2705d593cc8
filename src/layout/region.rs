// Legal regions and the drag projector.
//
// A node's legal region is the intersection of its sector's angular span and
// its circle's radial band. Either part may be missing (unknown sector,
// degenerate geometry, no radius table), in which case that dimension is
// unconstrained.
//
// The nearest legal point is found per dimension:
// - radius: clamp into the band along the radius vector
// - angle: keep it if inside the span, otherwise snap to whichever boundary
//   is angularly closer (across the 0/360 seam), preferring `start` on ties
//
// Points already inside are returned untouched, which makes projection
// idempotent.

use serde::Serialize;

use super::rings::Band;
use super::{EPSILON, PointF, angular_distance, compass_angle, normalize_angle, polar};

/// Clockwise angular span starting at `start` and covering `sweep` degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct AngularSpan {
    /// Normalized into [0, 360).
    pub start: f64,
    /// In [0, 360].
    pub sweep: f64,
}

impl AngularSpan {
    /// Span from `start` clockwise to `end`. Equal angles mean an empty span;
    /// pass `start + 360` for a full circle.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: normalize_angle(start),
            sweep: (end - start).clamp(0.0, 360.0),
        }
    }

    pub fn end(&self) -> f64 {
        normalize_angle(self.start + self.sweep)
    }

    pub fn mid(&self) -> f64 {
        normalize_angle(self.start + self.sweep / 2.0)
    }

    pub fn is_full(&self) -> bool {
        self.sweep >= 360.0 - EPSILON
    }

    pub fn contains(&self, angle: f64, tolerance: f64) -> bool {
        if self.is_full() {
            return true;
        }
        let offset = normalize_angle(angle - self.start);
        offset <= self.sweep + tolerance || offset >= 360.0 - tolerance
    }

    /// The boundary (start or end) angularly closest to `angle`.
    pub fn nearest_boundary(&self, angle: f64) -> f64 {
        let to_start = angular_distance(angle, self.start);
        let to_end = angular_distance(angle, self.end());
        if to_start <= to_end + EPSILON {
            self.start
        } else {
            self.end()
        }
    }
}

/// Where a node is allowed to be, relative to the diagram center.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Region {
    pub span: Option<AngularSpan>,
    pub band: Option<Band>,
}

impl Region {
    pub const FREE: Region = Region { span: None, band: None };

    pub fn is_free(&self) -> bool {
        self.span.is_none() && self.band.is_none()
    }

    /// Whether `p` lies inside the region, within the given tolerances.
    pub fn contains(&self, center: PointF, p: PointF, angle_tolerance: f64, radius_tolerance: f64) -> bool {
        let r = p.distance(center);
        let radius_ok = self.band.is_none_or(|b| b.contains(r, radius_tolerance));
        // the angle of the center point itself is meaningless
        let angle_ok = r <= EPSILON
            || self.span.is_none_or(|s| s.contains(compass_angle(center, p), angle_tolerance));
        radius_ok && angle_ok
    }

    /// Nearest point of the region to `p`. Returns `p` itself when already inside.
    pub fn nearest_legal(&self, center: PointF, p: PointF) -> PointF {
        let r = p.distance(center);

        let (angle, angle_ok) = if r <= EPSILON {
            (self.span.map_or(0.0, |s| s.mid()), true)
        } else {
            let a = compass_angle(center, p);
            (a, self.span.is_none_or(|s| s.contains(a, EPSILON)))
        };
        let radius_ok = self.band.is_none_or(|b| b.contains(r, EPSILON));

        if angle_ok && radius_ok {
            return p;
        }

        let legal_angle = match self.span {
            Some(span) if !angle_ok => span.nearest_boundary(angle),
            _ => angle,
        };
        let legal_radius = self.band.map_or(r, |b| b.clamp(r));
        polar(center, legal_angle, legal_radius)
    }
}

/// Nearest legal position for a proposed drag point.
///
/// The center node always projects to the diagram center.
pub fn project(region: &Region, center: PointF, candidate: PointF, is_center: bool) -> PointF {
    if is_center {
        center
    } else {
        region.nearest_legal(center, candidate)
    }
}
