//
// Compile step: GraphDocument (input document) -> Graph (engine working set)
//
// What this does:
// - Creates the center node first (NodeId(0)) when the document names one,
//   merging in the center's own entity entry if it is also listed
// - Flattens entities into an indexed node vector in document order
// - Enforces uniqueness of entity identities
// - Runs the sector partitioner and attaches angle + legal region per node
// - Resolves relationship endpoints from identity -> NodeId
//
// Structural problems are errors. Dangling references and degenerate geometry
// (zero-width sectors, unusable circle radii) become warnings; the affected
// node falls back to a looser constraint or loses it.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{
    DisplayDoc, Direction, EntityDoc, GraphDocument, Importance, Quality, Scalar, Strength, parse_category,
};
use crate::error::{LayoutError, Warning, WarningKind};
use crate::layout::sectors::{DEFAULT_SECTOR_USAGE, Member, Partition};
use crate::layout::{Band, Region, RingTable, Sector, SortValue, Viewport, partition_sectors};

#[derive(Debug, Clone)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub sectors: Vec<Sector>,
    pub rings: RingTable,
    pub center: Option<NodeId>,
    pub display: DisplayDoc,
    pub warnings: Vec<Warning>,
    node_by_id: BTreeMap<String, NodeId>,
}

impl Graph {
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.node_by_id.get(id).copied()
    }

    pub fn node(&self, nid: NodeId) -> &Node {
        &self.nodes[nid.0]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Center,
    Person,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub nid: NodeId,
    pub id: String,
    pub kind: NodeKind,
    /// Declared sector name, even if it did not resolve.
    pub sector: Option<String>,
    /// Ring the node is constrained to (after fallback).
    pub circle: Option<u32>,
    pub importance: Importance,
    pub color_group: Option<String>,
    /// Angle from the sector partitioner.
    pub angle: Option<f64>,
    pub region: Region,
    /// Stable document order index.
    pub order: usize,
}

impl Node {
    pub fn is_center(&self) -> bool {
        self.kind == NodeKind::Center
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub strength: Strength,
    pub direction: Direction,
    pub quality: Quality,
    pub color_group: Option<String>,
    /// Index of the relationship in the document.
    pub order: usize,
}

pub fn compile(doc: &GraphDocument, viewport: Viewport) -> Result<Graph, LayoutError> {
    let layout = doc.layout.as_ref().ok_or(LayoutError::MissingLayout)?;
    let distribution = layout
        .sector_distribution
        .as_ref()
        .filter(|d| !d.is_empty())
        .ok_or(LayoutError::MissingSectorDistribution)?;

    let (rings, skipped) = match &layout.circle_radius {
        Some(table) => RingTable::from_radii(table),
        None => (RingTable::for_viewport(viewport), Vec::new()),
    };

    let mut ctx = CompileCtx::new(rings);
    for ring in skipped {
        ctx.warn(
            WarningKind::DegenerateCircle,
            format!("circle {}", ring.index),
            format!(
                "radius {} is not a positive radius beyond {}; circle ignored",
                ring.radius, ring.inner
            ),
        );
    }
    ctx.compile_center(doc);
    ctx.compile_people(doc)?;

    let sort_by = layout
        .positioning_rules
        .as_ref()
        .map(|r| r.sort_by.as_slice())
        .unwrap_or(&[]);
    let members: Vec<Member> = ctx
        .pending_people
        .iter()
        .map(|&(_, entity)| Member {
            sector: entity.sector.as_ref().map(Scalar::as_label),
            sort_keys: sort_by.iter().map(|field| sort_value(entity, field)).collect(),
        })
        .collect();
    let partition = partition_sectors(
        distribution.specs(),
        &members,
        layout.start_angle.unwrap_or(0.0),
        layout.sector_usage.unwrap_or(DEFAULT_SECTOR_USAGE),
    );
    ctx.apply_partition(&partition);

    ctx.resolve_links(doc);

    let graph = ctx.finish(partition.sectors, doc.display.clone().unwrap_or_default());
    tracing::debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        sectors = graph.sectors.len(),
        rings = graph.rings.len(),
        warnings = graph.warnings.len(),
        "compiled graph"
    );
    Ok(graph)
}

struct CompileCtx<'a> {
    nodes: Vec<Node>,
    links: Vec<Link>,
    rings: RingTable,
    center: Option<NodeId>,
    warnings: Vec<Warning>,

    node_by_id: BTreeMap<String, NodeId>,

    // Non-center people, waiting for the partitioner
    pending_people: Vec<(NodeId, &'a EntityDoc)>,
}

impl<'a> CompileCtx<'a> {
    fn new(rings: RingTable) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            rings,
            center: None,
            warnings: Vec::new(),
            node_by_id: BTreeMap::new(),
            pending_people: Vec::new(),
        }
    }

    fn finish(self, sectors: Vec<Sector>, display: DisplayDoc) -> Graph {
        Graph {
            nodes: self.nodes,
            links: self.links,
            sectors,
            rings: self.rings,
            center: self.center,
            display,
            warnings: self.warnings,
            node_by_id: self.node_by_id,
        }
    }

    fn warn(&mut self, kind: WarningKind, subject: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Warning::new(kind, subject, message));
    }

    fn new_node(&mut self, id: String, kind: NodeKind) -> NodeId {
        let nid = NodeId(self.nodes.len());
        self.nodes.push(Node {
            nid,
            id: id.clone(),
            kind,
            sector: None,
            circle: None,
            importance: Importance::Normal,
            color_group: None,
            angle: None,
            region: Region::FREE,
            order: nid.0,
        });
        self.node_by_id.insert(id, nid);
        nid
    }

    fn compile_center(&mut self, doc: &GraphDocument) {
        let Some(center) = &doc.center else {
            return;
        };
        let id = center.as_label();
        if id.is_empty() {
            self.warn(WarningKind::BlankCenter, "center", "center is blank; no center node created");
            return;
        }
        self.center = Some(self.new_node(id, NodeKind::Center));
    }

    fn compile_people(&mut self, doc: &'a GraphDocument) -> Result<(), LayoutError> {
        let mut center_merged = false;

        for (index, entity) in doc.people.iter().enumerate() {
            let id = entity.identity().ok_or(LayoutError::UnnamedEntity(index))?;

            if let Some(&existing) = self.node_by_id.get(&id) {
                // the center may also be listed among the people, once
                if Some(existing) == self.center && !center_merged {
                    center_merged = true;
                    let node = &mut self.nodes[existing.0];
                    node.importance = parse_category(entity.importance.as_deref());
                    node.color_group = entity.color_group.clone();
                    continue;
                }
                return Err(LayoutError::DuplicateEntity(id));
            }

            let nid = self.new_node(id, NodeKind::Person);
            let node = &mut self.nodes[nid.0];
            node.sector = entity.sector.as_ref().map(Scalar::as_label);
            node.importance = parse_category(entity.importance.as_deref());
            node.color_group = entity.color_group.clone();
            self.pending_people.push((nid, entity));
        }

        Ok(())
    }

    fn apply_partition(&mut self, partition: &Partition) {
        let pending = std::mem::take(&mut self.pending_people);

        for (member, &(nid, entity)) in pending.iter().enumerate() {
            let sector = partition.sector_of[member].map(|s| &partition.sectors[s]);
            let span = match sector {
                Some(s) if s.is_degenerate() => {
                    let id = self.nodes[nid.0].id.clone();
                    self.warn(
                        WarningKind::DegenerateSector,
                        id,
                        format!("sector '{}' has no angular width; angle is unconstrained", s.name),
                    );
                    None
                }
                Some(s) => s.span(),
                None => {
                    let id = self.nodes[nid.0].id.clone();
                    let message = match &self.nodes[nid.0].sector {
                        Some(name) => format!("sector '{name}' is not in the layout; angle is unconstrained"),
                        None => "no sector given; angle is unconstrained".to_string(),
                    };
                    self.warn(WarningKind::UnknownSector, id, message);
                    None
                }
            };

            let (circle, band) = self.resolve_circle(nid, entity.circle.as_ref());

            let node = &mut self.nodes[nid.0];
            node.angle = partition.angles[member];
            node.circle = circle;
            node.region = Region { span, band };
        }
    }

    /// Ring index and band for a declared circle, falling back to the outermost ring.
    fn resolve_circle(&mut self, nid: NodeId, declared: Option<&Scalar>) -> (Option<u32>, Option<Band>) {
        if self.rings.is_empty() {
            return (None, None);
        }

        let requested = declared.map(|c| (c.as_label(), circle_index(c)));
        if let Some((_, Some(index))) = &requested {
            if let Some(band) = self.rings.band(*index) {
                return (Some(*index), Some(band));
            }
        }

        let id = self.nodes[nid.0].id.clone();
        match requested {
            Some((label, _)) => self.warn(
                WarningKind::UnknownCircle,
                id,
                format!("circle '{label}' has no configured radius; using the outermost circle"),
            ),
            None => self.warn(WarningKind::MissingCircle, id, "no circle given; using the outermost circle"),
        }

        let outermost = self.rings.outermost();
        (outermost.map(|(i, _)| i), outermost.map(|(_, b)| b))
    }

    fn resolve_links(&mut self, doc: &GraphDocument) {
        for (order, rel) in doc.relationships.iter().enumerate() {
            let from = rel.from.as_ref().map(Scalar::as_label).unwrap_or_default();
            let to = rel.to.as_ref().map(Scalar::as_label).unwrap_or_default();
            let subject = format!("{from} -> {to}");

            let (Some(&from_id), Some(&to_id)) = (self.node_by_id.get(&from), self.node_by_id.get(&to)) else {
                let missing = if self.node_by_id.contains_key(&from) { &to } else { &from };
                let message = format!("endpoint '{missing}' is not a known entity; relationship skipped");
                self.warn(WarningKind::UnknownEndpoint, subject, message);
                continue;
            };

            if from_id == to_id {
                self.warn(WarningKind::SelfLink, subject, "relationship links an entity to itself; skipped");
                continue;
            }

            self.links.push(Link {
                from: from_id,
                to: to_id,
                strength: parse_category(rel.strength.as_deref()),
                direction: parse_category(rel.direction.as_deref()),
                quality: parse_category(rel.quality.as_deref()),
                color_group: rel.color_group.clone(),
                order,
            });
        }
    }
}

/// A positive integral circle index, if the scalar is one.
fn circle_index(value: &Scalar) -> Option<u32> {
    let n = value.as_number()?;
    (n.fract() == 0.0 && n >= 1.0 && n <= u32::MAX as f64).then_some(n as u32)
}

/// Sort key of one entity for one `sort_by` field.
fn sort_value(entity: &EntityDoc, field: &str) -> SortValue {
    let scalar = match field {
        "name" => entity.name.as_ref(),
        "id" => entity.id.as_ref(),
        "sector" => entity.sector.as_ref(),
        "circle" => entity.circle.as_ref(),
        "importance" => {
            return entity.importance.clone().map_or(SortValue::Missing, SortValue::Text);
        }
        "color_group" => {
            return entity.color_group.clone().map_or(SortValue::Missing, SortValue::Text);
        }
        _ => return entity.extra.get(field).map_or(SortValue::Missing, json_sort_value),
    };

    match scalar {
        Some(Scalar::Number(n)) => SortValue::Number(*n),
        Some(other) => SortValue::Text(other.as_label()),
        None => SortValue::Missing,
    }
}

fn json_sort_value(value: &serde_json::Value) -> SortValue {
    match value {
        serde_json::Value::Null => SortValue::Missing,
        serde_json::Value::Number(n) => n.as_f64().map_or(SortValue::Missing, SortValue::Number),
        serde_json::Value::String(s) => SortValue::Text(s.clone()),
        other => SortValue::Text(other.to_string()),
    }
}
