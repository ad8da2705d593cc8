use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::layout::force_sim::ForceConfig;

/// A scalar that may be written as text or as a number (YAML is loose about this).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Canonical text form. Integral numbers print without a fractional part.
    pub fn as_label(&self) -> String {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Bool(_) => None,
        }
    }
}

/// The structured graph document handed over by the document parser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub center: Option<Scalar>,
    #[serde(default, alias = "nodes")]
    pub people: Vec<EntityDoc>,
    #[serde(default, alias = "peer_connections")]
    pub relationships: Vec<RelationshipDoc>,
    #[serde(default)]
    pub layout: Option<LayoutDoc>,
    #[serde(default)]
    pub display: Option<DisplayDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityDoc {
    #[serde(default)]
    pub name: Option<Scalar>,
    #[serde(default)]
    pub id: Option<Scalar>,
    #[serde(default)]
    pub sector: Option<Scalar>,
    #[serde(default)]
    pub circle: Option<Scalar>,
    #[serde(default)]
    pub importance: Option<String>,
    #[serde(default)]
    pub color_group: Option<String>,
    /// Any other fields; usable as sort keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl EntityDoc {
    /// Identity of the entity: its name, falling back to its id.
    pub fn identity(&self) -> Option<String> {
        self.name
            .as_ref()
            .or(self.id.as_ref())
            .map(Scalar::as_label)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipDoc {
    #[serde(default)]
    pub from: Option<Scalar>,
    #[serde(default)]
    pub to: Option<Scalar>,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub color_group: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutDoc {
    #[serde(default)]
    pub sector_distribution: Option<SectorDistribution>,
    /// Outer radius per circle index (1 = innermost).
    #[serde(default)]
    pub circle_radius: Option<BTreeMap<u32, f64>>,
    #[serde(default)]
    pub positioning_rules: Option<PositioningRules>,
    /// Fraction of a sector's span used to spread its members.
    #[serde(default)]
    pub sector_usage: Option<f64>,
    /// Compass angle where the first sector starts.
    #[serde(default)]
    pub start_angle: Option<f64>,
    #[serde(default)]
    pub simulation: Option<ForceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositioningRules {
    #[serde(default)]
    pub sort_by: Vec<String>,
}

/// One named sector with its relative size.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorSpec {
    pub name: String,
    pub size: f64,
}

/// Sectors in document order.
///
/// Accepts either a mapping (`friends: 90`) or a list of `{name, size}` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorDistribution(pub Vec<SectorSpec>);

impl SectorDistribution {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn specs(&self) -> &[SectorSpec] {
        &self.0
    }
}

#[derive(Deserialize)]
struct SectorEntry {
    name: Scalar,
    size: f64,
}

impl<'de> Deserialize<'de> for SectorDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = SectorDistribution;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of sector name to size, or a list of {name, size}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut specs = Vec::new();
                while let Some((name, size)) = map.next_entry::<Scalar, f64>()? {
                    specs.push(SectorSpec { name: name.as_label(), size });
                }
                Ok(SectorDistribution(specs))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut specs = Vec::new();
                while let Some(entry) = seq.next_element::<SectorEntry>()? {
                    specs.push(SectorSpec { name: entry.name.as_label(), size: entry.size });
                }
                Ok(SectorDistribution(specs))
            }
        }

        deserializer.deserialize_any(DistributionVisitor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DisplayDoc {
    pub colors: BTreeMap<String, String>,
    pub line_styles: BTreeMap<String, LineStyleDoc>,
    pub point_styles: BTreeMap<String, PointStyleDoc>,
    pub show_sector_labels: bool,
    pub show_circles: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineStyleDoc {
    pub width: Option<f64>,
    /// "solid" or "dashed"
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PointStyleDoc {
    pub size: Option<f64>,
    /// "filled" or "outline"
    pub style: Option<String>,
}

// ============================================================================
// Categorical attributes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl std::str::FromStr for Importance {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" | "important" => Self::High,
            _ => Self::Normal,
        })
    }
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    /// Keys this importance may be listed under in `display.point_styles`.
    pub fn style_keys(self) -> &'static [&'static str] {
        match self {
            Self::Low => &["low"],
            Self::Normal => &["normal"],
            Self::High => &["high", "important"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Strength {
    Weak,
    #[default]
    Normal,
    Strong,
}

impl std::str::FromStr for Strength {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "weak" => Self::Weak,
            "strong" => Self::Strong,
            _ => Self::Normal,
        })
    }
}

impl Strength {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Normal => "normal",
            Self::Strong => "strong",
        }
    }

    /// Relative weight used by the link force.
    pub fn weight(self) -> f64 {
        match self {
            Self::Weak => 1.0,
            Self::Normal => 2.0,
            Self::Strong => 3.0,
        }
    }
}

/// Descriptive only; never affects the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Mutual,
    Incoming,
    Outgoing,
}

impl std::str::FromStr for Direction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "incoming" => Self::Incoming,
            "outgoing" => Self::Outgoing,
            _ => Self::Mutual,
        })
    }
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mutual => "mutual",
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

/// Descriptive only; never affects the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl std::str::FromStr for Quality {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        })
    }
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Parse a categorical attribute, defaulting when absent.
pub fn parse_category<T>(raw: Option<&str>) -> T
where
    T: std::str::FromStr<Err = std::convert::Infallible> + Default,
{
    raw.map(|s| s.parse().unwrap_or_default()).unwrap_or_default()
}
