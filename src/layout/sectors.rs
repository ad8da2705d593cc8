// Sector partitioner.
//
// Sectors are walked in document order from a reference angle. Each sector's
// span is its share of the full circle (size / total size * 360), so sizes do
// not need to add up to 360. The last sector always closes exactly at
// reference + 360.
//
// Members of a sector are stable-sorted by their sort keys and spread over
// the middle `usage` fraction of the span:
//   n == 1: center angle
//   n  > 1: start + margin + i * usable / (n - 1)
//
// Angle assignment is fully deterministic. Members naming an unknown sector
// or a zero-size sector get no angle.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::normalize_angle;
use super::region::AngularSpan;
use crate::document::SectorSpec;

/// Default fraction of a sector's span used for its members.
pub const DEFAULT_SECTOR_USAGE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sector {
    pub name: String,
    pub size: f64,
    /// Normalized into [0, 360).
    pub start_angle: f64,
    /// Normalized into [0, 360); equals the next sector's start.
    pub end_angle: f64,
    pub center_angle: f64,
    /// Angular width in degrees.
    pub sweep: f64,
    pub people_count: usize,
    /// Smallest and largest member angle actually used (diagnostic only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_start_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_end_angle: Option<f64>,
}

impl Sector {
    pub fn is_degenerate(&self) -> bool {
        self.sweep <= 0.0
    }

    /// The sector as an angular span, or `None` when it has no width.
    pub fn span(&self) -> Option<AngularSpan> {
        if self.is_degenerate() {
            None
        } else {
            Some(AngularSpan::new(self.start_angle, self.start_angle + self.sweep))
        }
    }
}

/// One value of a member's sort key tuple.
///
/// Numbers order before text, and missing values order last.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
    Missing,
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Text(_) => 1,
            SortValue::Missing => 2,
        }
    }
}

impl Eq for SortValue {}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An entity as seen by the partitioner.
#[derive(Debug, Clone, Default)]
pub struct Member {
    pub sector: Option<String>,
    pub sort_keys: Vec<SortValue>,
}

#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub sectors: Vec<Sector>,
    /// Per member (input order): index into `sectors`, if the name resolved.
    pub sector_of: Vec<Option<usize>>,
    /// Per member (input order): assigned angle, if any.
    pub angles: Vec<Option<f64>>,
}

/// Compute sector spans and member angles.
pub fn partition_sectors(specs: &[SectorSpec], members: &[Member], start_angle: f64, usage: f64) -> Partition {
    let usage = if usage.is_finite() { usage.clamp(0.0, 1.0) } else { DEFAULT_SECTOR_USAGE };
    let reference = if start_angle.is_finite() { start_angle } else { 0.0 };
    let mut sectors = compute_spans(specs, reference);

    // first occurrence wins for duplicate sector names
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (i, spec) in specs.iter().enumerate() {
        by_name.entry(spec.name.as_str()).or_insert(i);
    }

    let sector_of: Vec<Option<usize>> = members
        .iter()
        .map(|m| m.sector.as_deref().and_then(|name| by_name.get(name).copied()))
        .collect();

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); sectors.len()];
    for (member, sector) in sector_of.iter().enumerate() {
        if let Some(s) = sector {
            groups[*s].push(member);
        }
    }

    let mut angles = vec![None; members.len()];
    for (sector, group) in sectors.iter_mut().zip(groups.iter_mut()) {
        sector.people_count = group.len();
        if sector.is_degenerate() || group.is_empty() {
            continue;
        }

        // sort_by is stable, so ties keep document order
        group.sort_by(|&a, &b| members[a].sort_keys.cmp(&members[b].sort_keys));

        let n = group.len();
        let usable = sector.sweep * usage;
        let margin = (sector.sweep - usable) / 2.0;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;

        for (i, &member) in group.iter().enumerate() {
            let offset = if n == 1 {
                sector.sweep / 2.0
            } else {
                margin + i as f64 * (usable / (n - 1) as f64)
            };
            lo = lo.min(offset);
            hi = hi.max(offset);
            angles[member] = Some(normalize_angle(sector.start_angle + offset));
        }

        sector.actual_start_angle = Some(normalize_angle(sector.start_angle + lo));
        sector.actual_end_angle = Some(normalize_angle(sector.start_angle + hi));
    }

    Partition { sectors, sector_of, angles }
}

fn compute_spans(specs: &[SectorSpec], reference: f64) -> Vec<Sector> {
    let weight = |size: f64| if size.is_finite() && size > 0.0 { size } else { 0.0 };
    let total: f64 = specs.iter().map(|s| weight(s.size)).sum();
    let last_positive = specs.iter().rposition(|s| weight(s.size) > 0.0);

    let mut current = reference;
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let start = current;
            let end = if total <= 0.0 || weight(spec.size) == 0.0 {
                start
            } else if Some(i) == last_positive {
                // close the circle exactly, whatever rounding accumulated
                reference + 360.0
            } else {
                start + 360.0 * weight(spec.size) / total
            };
            current = end;

            let sweep = end - start;
            Sector {
                name: spec.name.clone(),
                size: spec.size,
                start_angle: normalize_angle(start),
                end_angle: normalize_angle(end),
                center_angle: normalize_angle(start + sweep / 2.0),
                sweep,
                people_count: 0,
                actual_start_angle: None,
                actual_end_angle: None,
            }
        })
        .collect()
}
