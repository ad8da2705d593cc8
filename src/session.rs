//! One live layout: a compiled graph plus the simulation running over it.
//!
//! A session is built fresh from a document; loading a new document means
//! building a new session. Drag entry points take entity ids and delegate
//! to the simulation.

use crate::document::{Graph, GraphDocument, compile};
use crate::error::{LayoutError, Warning};
use crate::layout::{ForceSimulation, PointF, Viewport};
use crate::output::LayoutOutput;

pub struct LayoutSession {
    graph: Graph,
    sim: ForceSimulation,
}

impl LayoutSession {
    /// Compile `doc` and place its nodes. Simulation constants come from
    /// `layout.simulation`, falling back to the defaults.
    pub fn new(doc: &GraphDocument, viewport: Viewport) -> Result<Self, LayoutError> {
        let graph = compile(doc, viewport)?;
        let config = doc
            .layout
            .as_ref()
            .and_then(|l| l.simulation.clone())
            .unwrap_or_default();
        let sim = ForceSimulation::new(&graph, viewport, config);
        Ok(Self { graph, sim })
    }

    /// Parse YAML or JSON source and build a session from it.
    pub fn from_source(source: &str, width: f64, height: f64) -> Result<Self, LayoutError> {
        let viewport = Viewport::new(width, height)?;
        let doc = GraphDocument::parse(source)?;
        Self::new(&doc, viewport)
    }

    pub fn tick(&mut self) -> bool {
        self.sim.tick()
    }

    pub fn run_until_settled(&mut self) -> usize {
        self.sim.run_until_settled()
    }

    pub fn is_settled(&self) -> bool {
        self.sim.is_settled()
    }

    pub fn drag_start(&mut self, id: &str) -> bool {
        self.graph.find(id).is_some_and(|nid| self.sim.drag_start(nid.0))
    }

    /// Projected position for the proposed drag point, or `None` for an unknown id.
    pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> Option<PointF> {
        let nid = self.graph.find(id)?;
        self.sim.drag_move(nid.0, PointF::new(x, y))
    }

    pub fn drag_end(&mut self, id: &str) -> bool {
        self.graph.find(id).is_some_and(|nid| self.sim.drag_end(nid.0))
    }

    pub fn position(&self, id: &str) -> Option<PointF> {
        self.sim.position(self.graph.find(id)?.0)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.graph.warnings
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.sim
    }

    pub fn snapshot(&self) -> LayoutOutput {
        LayoutOutput::snapshot(&self.graph, &self.sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compass_angle, polar};

    const SOURCE: &str = r#"
center: Me
people:
  - {name: Ann, sector: family, circle: 1, importance: high}
  - {name: Ben, sector: family, circle: 2}
  - {name: Cat, sector: work, circle: 2}
  - {name: Dan, sector: work, circle: 3}
  - {name: Eve, sector: hobby, circle: 7}
relationships:
  - {from: Me, to: Ann, strength: strong}
  - {from: Ann, to: Ben}
  - {from: Cat, to: Dan, strength: weak}
layout:
  sector_distribution:
    family: 120
    work: 120
    hobby: 120
  circle_radius: {1: 60, 2: 120, 3: 180}
  simulation:
    max_ticks: 400
"#;

    #[test]
    fn test_session_settles_and_reports() {
        let mut session = LayoutSession::from_source(SOURCE, 800.0, 600.0).unwrap();
        assert_eq!(session.simulation().config().max_ticks, 400);
        assert_eq!(session.warnings().len(), 1);

        let ticks = session.run_until_settled();
        assert!(ticks > 0 && ticks <= 400);
        assert!(session.is_settled());
        assert!(session.simulation().violations().is_empty());

        let out = session.snapshot();
        assert!(out.settled);
        assert_eq!(out.nodes.len(), 6);
        assert_eq!(out.links.len(), 3);
        assert_eq!(out.warnings[0].subject, "Eve");
    }

    #[test]
    fn test_drag_by_id() {
        let mut session = LayoutSession::from_source(SOURCE, 800.0, 600.0).unwrap();
        session.run_until_settled();
        let center = session.simulation().center();

        assert!(session.drag_start("Cat"));
        // work spans [120, 240); propose a point deep in the family sector
        let proposed = polar(center, 60.0, 90.0);
        let p = session.drag_move("Cat", proposed.x, proposed.y).unwrap();
        assert!((compass_angle(center, p) - 120.0).abs() < 1e-9);
        assert!((p.distance(center) - 90.0).abs() < 1e-9);
        assert_eq!(session.position("Cat"), Some(p));

        session.tick();
        assert!(session.snapshot().nodes.iter().any(|n| n.id == "Cat" && n.pinned));

        assert!(session.drag_end("Cat"));
        session.run_until_settled();
        assert!(session.simulation().violations().is_empty());

        assert!(!session.drag_start("Nobody"));
        assert_eq!(session.drag_move("Nobody", 0.0, 0.0), None);
        assert!(!session.drag_end("Nobody"));
    }

    #[test]
    fn test_center_drag_projects_to_center() {
        let mut session = LayoutSession::from_source(SOURCE, 800.0, 600.0).unwrap();
        assert_eq!(session.drag_move("Me", 5.0, 5.0), Some(PointF::new(400.0, 300.0)));
    }

    #[test]
    fn test_errors_surface_from_source() {
        assert!(matches!(
            LayoutSession::from_source(SOURCE, 0.0, 600.0),
            Err(LayoutError::InvalidViewport { .. })
        ));
        assert!(matches!(
            LayoutSession::from_source("people: []", 800.0, 600.0),
            Err(LayoutError::MissingLayout)
        ));
    }
}
