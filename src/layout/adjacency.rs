// Link adjacency for the simulation.
//
// Degree counts drive the link force the same way d3 does it:
// - bias: the lower-degree endpoint moves more
// - strength: 1 / min(degree) keeps hubs from being yanked around
//
// Links are counted in both directions; self links never reach this point.

/// Connectivity over arena indices.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// Link count per node index.
    degree: Vec<usize>,
}

impl Adjacency {
    /// Build from `(source, target)` index pairs over `node_count` nodes.
    /// Pairs referencing indices out of range are ignored.
    pub fn from_links(node_count: usize, links: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut degree = vec![0; node_count];
        for (a, b) in links {
            if a >= node_count || b >= node_count || a == b {
                continue;
            }
            degree[a] += 1;
            degree[b] += 1;
        }

        Self { degree }
    }

    pub fn degree(&self, node: usize) -> usize {
        self.degree.get(node).copied().unwrap_or(0)
    }

    /// Share of a link's correction applied to `target` (d3 `bias`).
    pub fn bias(&self, source: usize, target: usize) -> f64 {
        let s = self.degree(source) as f64;
        let t = self.degree(target) as f64;
        if s + t == 0.0 { 0.5 } else { s / (s + t) }
    }

    /// d3's default link strength: 1 / min(degree(source), degree(target)).
    pub fn base_strength(&self, source: usize, target: usize) -> f64 {
        let min = self.degree(source).min(self.degree(target)).max(1);
        1.0 / min as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_counts_both_directions() {
        // 0 - 1 - 2, plus a duplicate 1 -> 0
        let adj = Adjacency::from_links(4, [(0, 1), (1, 2), (1, 0)]);

        assert_eq!(adj.degree(0), 2);
        assert_eq!(adj.degree(1), 3);
        assert_eq!(adj.degree(2), 1);
        assert_eq!(adj.degree(3), 0);
        assert_eq!(adj.degree(99), 0);
    }

    #[test]
    fn test_self_links_and_out_of_range_are_ignored() {
        let adj = Adjacency::from_links(2, [(0, 0), (0, 5), (1, 0)]);
        assert_eq!(adj.degree(0), 1);
        assert_eq!(adj.degree(1), 1);
    }

    #[test]
    fn test_bias_and_strength() {
        // star: 0 is the hub
        let adj = Adjacency::from_links(4, [(0, 1), (0, 2), (0, 3)]);

        // leaf -> hub: the hub target takes only a quarter of the correction
        assert_eq!(adj.bias(1, 0), 0.25);
        assert_eq!(adj.bias(0, 1), 0.75);
        assert_eq!(adj.base_strength(0, 1), 1.0);

        let pair = Adjacency::from_links(2, [(0, 1)]);
        assert_eq!(pair.bias(0, 1), 0.5);

        let empty = Adjacency::from_links(2, []);
        assert_eq!(empty.bias(0, 1), 0.5);
        assert_eq!(empty.base_strength(0, 1), 1.0);
    }
}
