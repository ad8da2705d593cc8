// Simulation forces.
//
// Each force is a pure function over the node arena returning one velocity
// delta per node. The engine applies them in FORCE_ORDER, adding each force's
// deltas to the velocities before the next force runs (collision and link
// read predicted positions `x + vx`, like d3-force).
//
// Forces:
// - repulsion: many-body charge, w = strength * alpha / l^2, cut off at
//   `charge_distance_max`
// - collision: pairwise separation of overlapping circles, heavier circles
//   move less (radius-squared weighting)
// - link: spring toward a rest length, split between endpoints by degree
// - boundary: soft impulse toward the nearest legal point for nodes outside
//   their region, and a velocity trim that stops nodes inside from leaving

use super::force_sim::ForceConfig;
use super::region::Region;
use super::spatial_grid::SpatialGrid;
use super::PointF;

/// Per-node velocity change produced by one force.
pub type VelocityDelta = PointF;

/// Mutable simulation record for one node. Index in the arena = graph `NodeId`.
#[derive(Debug, Clone)]
pub struct SimNode {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Fixed position while dragged.
    pub pin: Option<PointF>,
    pub region: Region,
    pub collision_radius: f64,
    pub is_center: bool,
}

impl SimNode {
    pub fn position(&self) -> PointF {
        PointF::new(self.x, self.y)
    }

    fn predicted(&self) -> PointF {
        PointF::new(self.x + self.vx, self.y + self.vy)
    }

    /// Whether the engine positions this node itself rather than integrating it.
    pub fn is_fixed(&self) -> bool {
        self.is_center || self.pin.is_some()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
    /// Rest length.
    pub distance: f64,
    pub strength: f64,
    /// Share of the correction applied to `target`.
    pub bias: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Force {
    Repulsion,
    Collision,
    Link,
    Boundary,
}

/// The order forces are applied in every tick.
pub const FORCE_ORDER: [Force; 4] = [Force::Repulsion, Force::Collision, Force::Link, Force::Boundary];

impl Force {
    pub fn name(self) -> &'static str {
        match self {
            Force::Repulsion => "repulsion",
            Force::Collision => "collision",
            Force::Link => "link",
            Force::Boundary => "boundary",
        }
    }
}

/// Seeded linear congruential generator for separating coincident points.
#[derive(Debug, Clone)]
pub struct Jiggle {
    state: u32,
}

impl Jiggle {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next value in [-0.5, 0.5).
    pub fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.state >> 16) & 0xFFFF) as f64 / 65536.0 - 0.5
    }

    /// A tiny offset in [-5e-7, 5e-7).
    fn nudge(&mut self) -> f64 {
        self.next() * 1e-6
    }
}

/// Many-body repulsion between all pairs within the cutoff distance.
pub fn repulsion(nodes: &[SimNode], config: &ForceConfig, alpha: f64, jiggle: &mut Jiggle) -> Vec<VelocityDelta> {
    let mut deltas = vec![VelocityDelta::default(); nodes.len()];
    let min2 = config.charge_distance_min * config.charge_distance_min;
    let max2 = config.charge_distance_max * config.charge_distance_max;

    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let mut dx = nodes[j].x - nodes[i].x;
            let mut dy = nodes[j].y - nodes[i].y;
            let mut l = dx * dx + dy * dy;
            if l >= max2 {
                continue;
            }

            if dx == 0.0 {
                dx = jiggle.nudge();
                l += dx * dx;
            }
            if dy == 0.0 {
                dy = jiggle.nudge();
                l += dy * dy;
            }
            if l < min2 {
                l = (min2 * l).sqrt();
            }

            // strength is negative, so i is pushed away from j
            let w = config.charge_strength * alpha / l;
            deltas[i].x += dx * w;
            deltas[i].y += dy * w;
            deltas[j].x -= dx * w;
            deltas[j].y -= dy * w;
        }
    }

    deltas
}

/// Separate circles that will overlap after this tick's motion.
pub fn collision(nodes: &[SimNode], config: &ForceConfig, jiggle: &mut Jiggle) -> Vec<VelocityDelta> {
    let mut deltas = vec![VelocityDelta::default(); nodes.len()];
    let max_radius = nodes.iter().map(|n| n.collision_radius).fold(0.0, f64::max);
    if max_radius <= 0.0 {
        return deltas;
    }

    let predicted: Vec<PointF> = nodes.iter().map(SimNode::predicted).collect();
    let mut grid = SpatialGrid::new(max_radius * 2.0);
    for (i, p) in predicted.iter().enumerate() {
        grid.insert(i, *p);
    }

    for i in 0..nodes.len() {
        let ri = nodes[i].collision_radius;
        let ri2 = ri * ri;

        for j in grid.query(predicted[i], ri + max_radius) {
            // each pair once
            if j <= i {
                continue;
            }
            let rj = nodes[j].collision_radius;
            let r = ri + rj;

            let mut x = predicted[i].x - predicted[j].x;
            let mut y = predicted[i].y - predicted[j].y;
            let mut l = x * x + y * y;
            if l >= r * r {
                continue;
            }

            if x == 0.0 {
                x = jiggle.nudge();
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle.nudge();
                l += y * y;
            }
            let dist = l.sqrt();
            let push = (r - dist) / dist * config.collision_strength;
            x *= push;
            y *= push;

            let rj2 = rj * rj;
            let share = rj2 / (ri2 + rj2);
            deltas[i].x += x * share;
            deltas[i].y += y * share;
            deltas[j].x -= x * (1.0 - share);
            deltas[j].y -= y * (1.0 - share);
        }
    }

    deltas
}

/// Pull (or push) linked nodes toward their rest length.
pub fn link(nodes: &[SimNode], links: &[SimLink], alpha: f64, jiggle: &mut Jiggle) -> Vec<VelocityDelta> {
    let mut deltas = vec![VelocityDelta::default(); nodes.len()];

    for link in links {
        let (Some(source), Some(target)) = (nodes.get(link.source), nodes.get(link.target)) else {
            continue;
        };
        let s = source.predicted();
        let t = target.predicted();

        let mut x = t.x - s.x;
        let mut y = t.y - s.y;
        if x == 0.0 {
            x = jiggle.nudge();
        }
        if y == 0.0 {
            y = jiggle.nudge();
        }
        let l = (x * x + y * y).sqrt();
        let k = (l - link.distance) / l * alpha * link.strength;
        x *= k;
        y *= k;

        deltas[link.target].x -= x * link.bias;
        deltas[link.target].y -= y * link.bias;
        deltas[link.source].x += x * (1.0 - link.bias);
        deltas[link.source].y += y * (1.0 - link.bias);
    }

    deltas
}

/// Keep nodes inside their region.
///
/// A node outside its region gets an impulse toward the nearest legal point,
/// scaled by alpha (never below `boundary_alpha_floor`) and then damped. A
/// node inside its region whose velocity would carry it out this tick has
/// that velocity trimmed so integration lands it on the nearest legal point
/// to where it was heading; it slides along the boundary instead of crossing
/// it.
pub fn boundary(nodes: &[SimNode], center: PointF, config: &ForceConfig, alpha: f64) -> Vec<VelocityDelta> {
    let keep = 1.0 - config.velocity_decay;

    nodes
        .iter()
        .map(|node| {
            if node.is_fixed() || node.region.is_free() {
                return VelocityDelta::default();
            }
            let p = node.position();
            let legal = node.region.nearest_legal(center, p);

            if legal != p {
                let gain = config.boundary_gain * alpha.max(config.boundary_alpha_floor);
                let vx = (node.vx + (legal.x - p.x) * gain) * config.boundary_damping;
                let vy = (node.vy + (legal.y - p.y) * gain) * config.boundary_damping;
                return VelocityDelta::new(vx - node.vx, vy - node.vy);
            }

            if keep <= 0.0 {
                return VelocityDelta::default();
            }
            let heading = PointF::new(p.x + node.vx * keep, p.y + node.vy * keep);
            let landing = node.region.nearest_legal(center, heading);
            if landing == heading {
                return VelocityDelta::default();
            }
            let vx = (landing.x - p.x) / keep;
            let vy = (landing.y - p.y) / keep;
            VelocityDelta::new(vx - node.vx, vy - node.vy)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::region::AngularSpan;
    use crate::layout::rings::Band;
    use crate::layout::polar;

    fn node(x: f64, y: f64) -> SimNode {
        SimNode {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            pin: None,
            region: Region::FREE,
            collision_radius: 10.0,
            is_center: false,
        }
    }

    #[test]
    fn test_force_order_is_fixed() {
        let names: Vec<&str> = FORCE_ORDER.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["repulsion", "collision", "link", "boundary"]);
    }

    #[test]
    fn test_jiggle_is_seeded() {
        let mut a = Jiggle::new(12345);
        let mut b = Jiggle::new(12345);
        let xs: Vec<f64> = (0..5).map(|_| a.next()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.next()).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|v| v.abs() <= 0.5));
        assert_ne!(xs[0], xs[1]);
    }

    #[test]
    fn test_repulsion_pushes_apart_symmetrically() {
        let config = ForceConfig::default();
        let nodes = vec![node(0.0, 0.0), node(10.0, 0.0)];
        let d = repulsion(&nodes, &config, 1.0, &mut Jiggle::new(1));

        // -30 * 1 / 100 * 10 = -3
        assert!((d[0].x + 3.0).abs() < 1e-12);
        assert!((d[1].x - 3.0).abs() < 1e-12);
        // dy == 0 is jiggled, so only a negligible vertical component
        assert!(d[0].y.abs() < 1e-6);
    }

    #[test]
    fn test_repulsion_cutoff() {
        let config = ForceConfig { charge_distance_max: 50.0, ..ForceConfig::default() };
        let nodes = vec![node(0.0, 0.0), node(60.0, 0.0)];
        let d = repulsion(&nodes, &config, 1.0, &mut Jiggle::new(1));
        assert_eq!(d[0], VelocityDelta::default());
        assert_eq!(d[1], VelocityDelta::default());
    }

    #[test]
    fn test_repulsion_separates_coincident_nodes() {
        let config = ForceConfig::default();
        let nodes = vec![node(5.0, 5.0), node(5.0, 5.0)];
        let d = repulsion(&nodes, &config, 1.0, &mut Jiggle::new(7));
        assert!(d[0].x != 0.0 || d[0].y != 0.0);
        assert!((d[0].x + d[1].x).abs() < 1e-9);
    }

    #[test]
    fn test_collision_separates_overlapping_nodes() {
        let config = ForceConfig::default();
        let nodes = vec![node(0.0, 0.0), node(10.0, 0.0), node(100.0, 0.0)];
        let d = collision(&nodes, &config, &mut Jiggle::new(1));

        // overlap 10, strength 0.7, equal radii split it in half
        assert!((d[0].x + 3.5).abs() < 1e-9);
        assert!((d[1].x - 3.5).abs() < 1e-9);
        assert_eq!(d[2], VelocityDelta::default());
    }

    #[test]
    fn test_collision_moves_smaller_node_more() {
        let config = ForceConfig::default();
        let mut big = node(0.0, 0.0);
        big.collision_radius = 20.0;
        let small = node(20.0, 0.0);
        let d = collision(&[big, small], &config, &mut Jiggle::new(1));
        assert!(d[1].x.abs() > d[0].x.abs());
    }

    #[test]
    fn test_link_pulls_toward_rest_length() {
        let nodes = vec![node(0.0, 0.0), node(100.0, 0.0)];
        let links = [SimLink { source: 0, target: 1, distance: 60.0, strength: 1.0, bias: 0.5 }];
        let d = link(&nodes, &links, 1.0, &mut Jiggle::new(1));

        // stretched by 40: each end moves 20 toward the other
        assert!((d[0].x - 20.0).abs() < 1e-9);
        assert!((d[1].x + 20.0).abs() < 1e-9);

        let close = vec![node(0.0, 0.0), node(30.0, 0.0)];
        let d = link(&close, &links, 1.0, &mut Jiggle::new(1));
        assert!(d[0].x < 0.0 && d[1].x > 0.0);
    }

    #[test]
    fn test_boundary_impulse_points_to_legal_region() {
        let config = ForceConfig::default();
        let center = PointF::new(0.0, 0.0);
        let region = Region {
            span: Some(AngularSpan::new(0.0, 90.0)),
            band: Some(Band { inner: 50.0, outer: 100.0 }),
        };

        let mut inside = node(0.0, 0.0);
        let p = polar(center, 45.0, 75.0);
        inside.x = p.x;
        inside.y = p.y;
        inside.region = region;

        let mut outside = node(0.0, 0.0);
        let q = polar(center, 45.0, 150.0);
        outside.x = q.x;
        outside.y = q.y;
        outside.region = region;

        let mut pinned = outside.clone();
        pinned.pin = Some(q);

        let d = boundary(&[inside, outside, pinned], center, &config, 0.5);
        assert_eq!(d[0], VelocityDelta::default());
        assert_eq!(d[2], VelocityDelta::default());

        // pointed back toward the center along the radius: 50 * 0.6 * 0.5 * 0.85
        let expected = 50.0 * 0.6 * 0.5 * 0.85;
        assert!((d[1].x.hypot(d[1].y) - expected).abs() < 1e-9);
        assert!(d[1].x < 0.0 && d[1].y > 0.0);
    }

    #[test]
    fn test_boundary_impulse_has_an_alpha_floor() {
        let config = ForceConfig::default();
        let center = PointF::new(0.0, 0.0);
        let mut n = node(0.0, -150.0);
        n.vx = 10.0;
        n.region = Region { span: None, band: Some(Band { inner: 50.0, outer: 100.0 }) };

        // alpha 0 still pulls back, at the floor: 50 * 0.6 * 0.1, then damped
        let d = boundary(&[n], center, &config, 0.0);
        assert!((d[0].x - (10.0 * 0.85 - 10.0)).abs() < 1e-9);
        assert!((d[0].y - 50.0 * 0.6 * 0.1 * 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_stops_inside_nodes_from_leaving() {
        let config = ForceConfig::default();
        let keep = 1.0 - config.velocity_decay;
        let center = PointF::new(0.0, 0.0);
        let region = Region {
            span: Some(AngularSpan::new(0.0, 90.0)),
            band: Some(Band { inner: 50.0, outer: 100.0 }),
        };

        // heading straight out through the outer edge at 45 degrees
        let mut outward = node(0.0, 0.0);
        let p = polar(center, 45.0, 95.0);
        let v = polar(PointF::new(0.0, 0.0), 45.0, 20.0);
        outward.x = p.x;
        outward.y = p.y;
        outward.vx = v.x;
        outward.vy = v.y;
        outward.region = region;

        // moving well within the region
        let mut calm = outward.clone();
        let q = polar(center, 45.0, 75.0);
        calm.x = q.x;
        calm.y = q.y;

        let d = boundary(&[outward.clone(), calm], center, &config, 1.0);
        assert_eq!(d[1], VelocityDelta::default());

        let landed = PointF::new(
            outward.x + (outward.vx + d[0].x) * keep,
            outward.y + (outward.vy + d[0].y) * keep,
        );
        assert!(landed.distance(polar(center, 45.0, 100.0)) < 1e-9);
    }

    #[test]
    fn test_boundary_keeps_motion_along_the_edge() {
        let config = ForceConfig::default();
        let keep = 1.0 - config.velocity_decay;
        let center = PointF::new(0.0, 0.0);
        let mut n = node(0.0, 0.0);
        let p = polar(center, 85.0, 75.0);
        n.x = p.x;
        n.y = p.y;
        // roughly tangential, clockwise past the 90 degree edge
        n.vx = 0.0;
        n.vy = 20.0;
        n.region = Region { span: Some(AngularSpan::new(0.0, 90.0)), band: Some(Band { inner: 50.0, outer: 100.0 }) };

        let d = boundary(&[n.clone()], center, &config, 1.0);
        let landed = PointF::new(n.x + (n.vx + d[0].x) * keep, n.y + (n.vy + d[0].y) * keep);
        assert!((crate::layout::compass_angle(center, landed) - 90.0).abs() < 1e-9);
        assert!(n.region.contains(center, landed, 1e-6, 1e-6));
    }
}
