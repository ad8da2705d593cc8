//! Output types for the renderer.
//!
//! These structs are serialized to JSON and handed to the drawing layer,
//! once per tick or once on settle.

use serde::Serialize;

use crate::document::{Graph, NodeKind};
use crate::error::{LayoutError, Warning};
use crate::layout::{ForceSimulation, PointF, polar};
use crate::style::{LinkStyle, NodeStyle, StyleResolver};

/// A positioned node
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub id: String,
    /// "center" or "person"
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle: Option<u32>,
    pub importance: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_group: Option<String>,
    /// Angle assigned by the sector partitioner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Held in place (center, or currently dragged)
    pub pinned: bool,
    pub style: NodeStyle,
}

/// A link with resolved endpoints
#[derive(Debug, Clone, Serialize)]
pub struct LinkOutput {
    pub from: String,
    pub to: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub strength: &'static str,
    pub direction: &'static str,
    pub quality: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_group: Option<String>,
    pub style: LinkStyle,
}

/// Sector guide geometry
#[derive(Debug, Clone, Serialize)]
pub struct SectorOutput {
    pub name: String,
    pub start_angle: f64,
    pub end_angle: f64,
    pub center_angle: f64,
    pub people_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_start_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_end_angle: Option<f64>,
    /// Where the sector's boundary line ends (start angle, outermost radius)
    pub boundary: PointF,
    /// Label anchor, just outside the outermost circle
    pub label: PointF,
}

/// Ring guide geometry
#[derive(Debug, Clone, Serialize)]
pub struct RingOutput {
    pub index: u32,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

/// Error information for the host UI
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
}

/// The combined output sent to the renderer
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<PointF>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sectors: Vec<SectorOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rings: Vec<RingOutput>,
    pub alpha: f64,
    pub tick: usize,
    pub settled: bool,
    pub show_sector_labels: bool,
    pub show_circles: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Label anchor distance as a multiple of the outermost radius.
const LABEL_RADIUS_FACTOR: f64 = 1.1;

impl LayoutOutput {
    /// Current state of a running simulation over `graph`.
    pub fn snapshot(graph: &Graph, sim: &ForceSimulation) -> Self {
        let styles = StyleResolver::new(&graph.display);
        let center = sim.center();
        let position = |i: usize| sim.position(i).unwrap_or(center);

        let nodes = graph
            .nodes
            .iter()
            .zip(sim.nodes())
            .map(|(n, s)| NodeOutput {
                id: n.id.clone(),
                kind: n.kind,
                x: s.x,
                y: s.y,
                sector: n.sector.clone(),
                circle: n.circle,
                importance: n.importance.as_str(),
                color_group: n.color_group.clone(),
                angle: n.angle,
                pinned: s.is_fixed(),
                style: styles.node_style(n),
            })
            .collect();

        let links = graph
            .links
            .iter()
            .map(|l| {
                let a = position(l.from.0);
                let b = position(l.to.0);
                LinkOutput {
                    from: graph.node(l.from).id.clone(),
                    to: graph.node(l.to).id.clone(),
                    x1: a.x,
                    y1: a.y,
                    x2: b.x,
                    y2: b.y,
                    strength: l.strength.as_str(),
                    direction: l.direction.as_str(),
                    quality: l.quality.as_str(),
                    color_group: l.color_group.clone(),
                    style: styles.link_style(l),
                }
            })
            .collect();

        let outer = graph.rings.outer_radius().unwrap_or(center.x.min(center.y) * 0.9);
        let sectors = graph
            .sectors
            .iter()
            .map(|s| SectorOutput {
                name: s.name.clone(),
                start_angle: s.start_angle,
                end_angle: s.end_angle,
                center_angle: s.center_angle,
                people_count: s.people_count,
                actual_start_angle: s.actual_start_angle,
                actual_end_angle: s.actual_end_angle,
                boundary: polar(center, s.start_angle, outer),
                label: polar(center, s.center_angle, outer * LABEL_RADIUS_FACTOR),
            })
            .collect();

        let rings = graph
            .rings
            .bands()
            .into_iter()
            .map(|(index, band)| RingOutput {
                index,
                inner_radius: band.inner,
                outer_radius: band.outer,
            })
            .collect();

        Self {
            center: graph.center.map(|_| center),
            nodes,
            links,
            sectors,
            rings,
            alpha: sim.alpha(),
            tick: sim.tick_count(),
            settled: sim.is_settled(),
            show_sector_labels: graph.display.show_sector_labels,
            show_circles: graph.display.show_circles,
            warnings: graph.warnings.clone(),
            error: None,
        }
    }

    /// An empty output carrying only an error.
    pub fn from_error(err: &LayoutError) -> Self {
        Self {
            error: Some(ErrorInfo { message: err.to_string() }),
            ..Self::default()
        }
    }
}
