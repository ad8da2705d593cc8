//! Style resolver.
//!
//! Maps categorical attributes to rendering parameters. Every lookup falls
//! back in the same order: the document's `display` tables, then the
//! built-in palette, then a fixed default. It never fails.

use serde::Serialize;

use crate::document::{DisplayDoc, Link, Node};

pub const DEFAULT_NODE_FILL: &str = "#999";
pub const DEFAULT_CENTER_FILL: &str = "#333";
pub const DEFAULT_LINK_STROKE: &str = "#666";
/// Point size when `point_styles` has no entry; display radius is twice this.
pub const DEFAULT_POINT_SIZE: f64 = 6.0;
pub const DEFAULT_CENTER_RADIUS: f64 = 15.0;
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const DASH_PATTERN: [f64; 2] = [5.0, 5.0];

/// Built-in color for a named color group.
pub fn palette_color(group: &str) -> Option<&'static str> {
    match group.trim().to_lowercase().as_str() {
        "red" => Some("#FF6B6B"),
        "blue" => Some("#4ECDC4"),
        "green" => Some("#45B7D1"),
        "yellow" => Some("#96CEB4"),
        "purple" => Some("#FFEAA7"),
        "orange" => Some("#DDA0DD"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStyle {
    pub fill: String,
    pub radius: f64,
    /// false = draw as an outline
    pub filled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStyle {
    pub stroke: String,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
}

pub struct StyleResolver<'a> {
    display: &'a DisplayDoc,
}

impl<'a> StyleResolver<'a> {
    pub fn new(display: &'a DisplayDoc) -> Self {
        Self { display }
    }

    fn color(&self, group: Option<&str>) -> Option<String> {
        let group = group?;
        self.display
            .colors
            .get(group)
            .cloned()
            .or_else(|| palette_color(group).map(str::to_string))
    }

    pub fn node_style(&self, node: &Node) -> NodeStyle {
        let point = if node.is_center() {
            self.display.point_styles.get("center")
        } else {
            node.importance
                .style_keys()
                .iter()
                .find_map(|key| self.display.point_styles.get(*key))
        };

        let fallback_radius = if node.is_center() {
            DEFAULT_CENTER_RADIUS
        } else {
            DEFAULT_POINT_SIZE * 2.0
        };
        let radius = point
            .and_then(|p| p.size)
            .filter(|s| s.is_finite() && *s > 0.0)
            .map_or(fallback_radius, |s| s * 2.0);

        let filled = !point
            .and_then(|p| p.style.as_deref())
            .is_some_and(|s| s.eq_ignore_ascii_case("outline"));

        let default_fill = if node.is_center() { DEFAULT_CENTER_FILL } else { DEFAULT_NODE_FILL };
        let fill = self
            .color(node.color_group.as_deref())
            .unwrap_or_else(|| default_fill.to_string());

        NodeStyle { fill, radius, filled }
    }

    pub fn link_style(&self, link: &Link) -> LinkStyle {
        let line = self.display.line_styles.get(link.strength.as_str());

        let width = line
            .and_then(|l| l.width)
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(DEFAULT_STROKE_WIDTH);
        let dashed = line
            .and_then(|l| l.style.as_deref())
            .is_some_and(|s| s.eq_ignore_ascii_case("dashed"));

        LinkStyle {
            stroke: self
                .color(link.color_group.as_deref())
                .unwrap_or_else(|| DEFAULT_LINK_STROKE.to_string()),
            width,
            dash: dashed.then(|| DASH_PATTERN.to_vec()),
        }
    }
}
