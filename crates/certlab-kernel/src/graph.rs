//! Simple undirected graphs in canonical edge-list form.

use serde::{Deserialize, Serialize};

/// A simple undirected graph on vertices `0..vertices`.
///
/// Canonical form: every edge `(u, v)` has `u < v`, and the edge list is
/// strictly ascending. Generators always emit canonical graphs; decoders
/// reject anything else so that two equal graphs always hash equally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Graph {
    /// Number of vertices.
    pub vertices: u32,
    /// Sorted, duplicate-free edge list.
    pub edges: Vec<(u32, u32)>,
}

impl Graph {
    /// Build a canonical graph from arbitrary edges.
    ///
    /// Endpoints are ordered, the list is sorted and duplicates are removed.
    /// Self-loops and out-of-range endpoints are reported as errors.
    pub fn from_edges(
        vertices: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> Result<Self, String> {
        let mut canonical = Vec::new();
        for (a, b) in edges {
            if a == b {
                return Err(format!("self-loop on vertex {a}"));
            }
            if a >= vertices || b >= vertices {
                return Err(format!(
                    "edge ({a}, {b}) references a vertex outside 0..{vertices}"
                ));
            }
            canonical.push((a.min(b), a.max(b)));
        }
        canonical.sort_unstable();
        canonical.dedup();
        Ok(Self {
            vertices,
            edges: canonical,
        })
    }

    /// Number of unordered vertex pairs, i.e. the edge count of the complete graph.
    pub fn max_edges(vertices: u32) -> u64 {
        let n = u64::from(vertices);
        n * n.saturating_sub(1) / 2
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Adjacency test in `O(log m)` on the canonical edge list.
    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        if a == b {
            return false;
        }
        self.edges.binary_search(&(a.min(b), a.max(b))).is_ok()
    }

    /// Check the canonical-form invariants.
    pub fn validate(&self) -> Result<(), String> {
        let mut previous: Option<(u32, u32)> = None;
        for &(u, v) in &self.edges {
            if u >= v {
                return Err(format!("edge ({u}, {v}) is not ordered as u < v"));
            }
            if v >= self.vertices {
                return Err(format!(
                    "edge ({u}, {v}) references a vertex outside 0..{}",
                    self.vertices
                ));
            }
            if let Some(prev) = previous {
                if prev >= (u, v) {
                    return Err(format!(
                        "edge list is not strictly ascending at ({u}, {v})"
                    ));
                }
            }
            previous = Some((u, v));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_edges_orders_sorts_and_dedups() {
        let graph = Graph::from_edges(4, [(3, 1), (0, 2), (1, 3), (2, 0)]).unwrap();
        assert_eq!(graph.edges, vec![(0, 2), (1, 3)]);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn from_edges_rejects_loops_and_out_of_range() {
        assert!(Graph::from_edges(3, [(1, 1)]).unwrap_err().contains("self-loop"));
        assert!(Graph::from_edges(3, [(0, 3)])
            .unwrap_err()
            .contains("outside 0..3"));
    }

    #[test]
    fn has_edge_is_symmetric() {
        let graph = Graph::from_edges(3, [(0, 1)]).unwrap();
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(1, 2));
        assert!(!graph.has_edge(1, 1));
    }

    #[test]
    fn validate_flags_non_canonical_lists() {
        let unordered = Graph {
            vertices: 3,
            edges: vec![(1, 0)],
        };
        assert!(unordered.validate().is_err());

        let duplicated = Graph {
            vertices: 3,
            edges: vec![(0, 1), (0, 1)],
        };
        assert!(duplicated
            .validate()
            .unwrap_err()
            .contains("strictly ascending"));

        let escaping = Graph {
            vertices: 2,
            edges: vec![(0, 2)],
        };
        assert!(escaping.validate().is_err());
    }

    #[test]
    fn max_edges_handles_tiny_graphs() {
        assert_eq!(Graph::max_edges(0), 0);
        assert_eq!(Graph::max_edges(1), 0);
        assert_eq!(Graph::max_edges(4), 6);
    }
}
