//! Witness schemas and checkers for graph claims.
//!
//! Each claim decodes its witness into a typed shape first. A witness that
//! does not fit the shape is a malformed certificate; a witness that fits but
//! names bad vertices, non-edges or too few elements refutes the claim.
//! Every checker runs in at most `O(s^2 log m)` for a witness of size `s`.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::certificate::{Certificate, ClaimType};
use crate::graph::Graph;
use crate::verify::{Verdict, VerifyError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EdgeWitness {
    edge: [u64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VertexSetWitness {
    vertices: Vec<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColoringWitness {
    colors: Vec<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpanningTreeWitness {
    spanning_tree: Vec<[u64; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CycleWitness {
    cycle: Vec<u64>,
}

/// Check a certificate's claim against a graph.
pub fn check_graph_claim(graph: &Graph, certificate: &Certificate) -> Result<Verdict, VerifyError> {
    let claim = certificate.claim_type;
    let bound = claim_bound(claim, certificate.bound)?;
    let witness = &certificate.witness;

    let outcome = match claim {
        ClaimType::HasEdge => {
            let w: EdgeWitness = decode_witness(claim, witness)?;
            check_has_edge(graph, w.edge)
        }
        ClaimType::IndependentSet => {
            let w: VertexSetWitness = decode_witness(claim, witness)?;
            check_independent_set(graph, &w.vertices, bound)
        }
        ClaimType::Clique => {
            let w: VertexSetWitness = decode_witness(claim, witness)?;
            check_clique(graph, &w.vertices, bound)
        }
        ClaimType::VertexCover => {
            let w: VertexSetWitness = decode_witness(claim, witness)?;
            check_vertex_cover(graph, &w.vertices, bound)
        }
        ClaimType::ProperColoring => {
            let w: ColoringWitness = decode_witness(claim, witness)?;
            check_proper_coloring(graph, &w.colors, bound)
        }
        ClaimType::Connected => {
            let w: SpanningTreeWitness = decode_witness(claim, witness)?;
            check_connected(graph, &w.spanning_tree)
        }
        ClaimType::OddCycle => {
            let w: CycleWitness = decode_witness(claim, witness)?;
            check_odd_cycle(graph, &w.cycle)
        }
        ClaimType::HamiltonianCycle => {
            let w: CycleWitness = decode_witness(claim, witness)?;
            check_hamiltonian_cycle(graph, &w.cycle)
        }
    };

    Ok(match outcome {
        Ok(()) => Verdict::Holds,
        Err(reason) => Verdict::Refuted(reason),
    })
}

/// Bounded claims need a bound and unbounded claims must not carry one.
/// Returns the bound, or 0 for unbounded claims.
fn claim_bound(claim: ClaimType, bound: Option<u64>) -> Result<u64, VerifyError> {
    match (claim.takes_bound(), bound) {
        (true, Some(k)) => Ok(k),
        (true, None) => Err(VerifyError::malformed(format!(
            "claim '{claim}' requires an integer bound"
        ))),
        (false, Some(_)) => Err(VerifyError::malformed(format!(
            "claim '{claim}' does not take a bound"
        ))),
        (false, None) => Ok(0),
    }
}

fn decode_witness<T: DeserializeOwned>(
    claim: ClaimType,
    witness: &serde_json::Value,
) -> Result<T, VerifyError> {
    T::deserialize(witness).map_err(|e| {
        VerifyError::malformed(format!("witness does not match the '{claim}' schema: {e}"))
    })
}

fn vertex(graph: &Graph, raw: u64) -> Result<u32, String> {
    u32::try_from(raw)
        .ok()
        .filter(|v| *v < graph.vertices)
        .ok_or_else(|| {
            format!(
                "vertex {raw} is out of range (graph has {} vertices)",
                graph.vertices
            )
        })
}

/// Resolve a witness vertex list into distinct in-range vertices, in order.
fn distinct_vertices(graph: &Graph, raw: &[u64]) -> Result<Vec<u32>, String> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for &r in raw {
        let v = vertex(graph, r)?;
        if !seen.insert(v) {
            return Err(format!("vertex {v} is listed more than once"));
        }
        out.push(v);
    }
    Ok(out)
}

fn check_has_edge(graph: &Graph, edge: [u64; 2]) -> Result<(), String> {
    let u = vertex(graph, edge[0])?;
    let v = vertex(graph, edge[1])?;
    if graph.has_edge(u, v) {
        Ok(())
    } else {
        Err(format!("({u}, {v}) is not an edge of the graph"))
    }
}

fn check_independent_set(graph: &Graph, raw: &[u64], bound: u64) -> Result<(), String> {
    let set = distinct_vertices(graph, raw)?;
    if (set.len() as u64) < bound {
        return Err(format!(
            "independent set has {} vertices, fewer than the claimed {bound}",
            set.len()
        ));
    }
    let members: HashSet<u32> = set.into_iter().collect();
    if let Some((u, v)) = graph
        .edges
        .iter()
        .find(|(u, v)| members.contains(u) && members.contains(v))
    {
        return Err(format!("vertices {u} and {v} are adjacent"));
    }
    Ok(())
}

fn check_clique(graph: &Graph, raw: &[u64], bound: u64) -> Result<(), String> {
    let set = distinct_vertices(graph, raw)?;
    if (set.len() as u64) < bound {
        return Err(format!(
            "clique has {} vertices, fewer than the claimed {bound}",
            set.len()
        ));
    }
    for (i, &u) in set.iter().enumerate() {
        for &v in &set[i + 1..] {
            if !graph.has_edge(u, v) {
                return Err(format!("vertices {u} and {v} are not adjacent"));
            }
        }
    }
    Ok(())
}

fn check_vertex_cover(graph: &Graph, raw: &[u64], bound: u64) -> Result<(), String> {
    let set = distinct_vertices(graph, raw)?;
    if set.len() as u64 > bound {
        return Err(format!(
            "vertex cover has {} vertices, more than the claimed {bound}",
            set.len()
        ));
    }
    let members: HashSet<u32> = set.into_iter().collect();
    if let Some((u, v)) = graph
        .edges
        .iter()
        .find(|(u, v)| !members.contains(u) && !members.contains(v))
    {
        return Err(format!("edge ({u}, {v}) is not covered"));
    }
    Ok(())
}

fn check_proper_coloring(graph: &Graph, colors: &[u64], bound: u64) -> Result<(), String> {
    if colors.len() as u64 != u64::from(graph.vertices) {
        return Err(format!(
            "coloring assigns {} colors but the graph has {} vertices",
            colors.len(),
            graph.vertices
        ));
    }
    if let Some((v, c)) = colors.iter().enumerate().find(|(_, c)| **c >= bound) {
        return Err(format!(
            "vertex {v} uses color {c}, outside the claimed palette 0..{bound}"
        ));
    }
    if let Some((u, v)) = graph
        .edges
        .iter()
        .find(|(u, v)| colors[*u as usize] == colors[*v as usize])
    {
        return Err(format!(
            "edge ({u}, {v}) joins two vertices of color {}",
            colors[*u as usize]
        ));
    }
    Ok(())
}

fn check_connected(graph: &Graph, tree: &[[u64; 2]]) -> Result<(), String> {
    if graph.vertices == 0 {
        return Err("the empty graph has no spanning tree".into());
    }
    let expected = graph.vertices as usize - 1;
    if tree.len() != expected {
        return Err(format!(
            "spanning tree has {} edges, expected exactly {expected}",
            tree.len()
        ));
    }
    let mut components = DisjointSets::new(graph.vertices as usize);
    for pair in tree {
        let u = vertex(graph, pair[0])?;
        let v = vertex(graph, pair[1])?;
        if !graph.has_edge(u, v) {
            return Err(format!("({u}, {v}) is not an edge of the graph"));
        }
        if !components.union(u as usize, v as usize) {
            return Err(format!("edge ({u}, {v}) closes a cycle in the spanning tree"));
        }
    }
    // n-1 acyclic edges on n vertices always form a spanning tree.
    Ok(())
}

fn check_cycle_edges(graph: &Graph, cycle: &[u32]) -> Result<(), String> {
    for (i, &u) in cycle.iter().enumerate() {
        let v = cycle[(i + 1) % cycle.len()];
        if !graph.has_edge(u, v) {
            return Err(format!("cycle step ({u}, {v}) is not an edge of the graph"));
        }
    }
    Ok(())
}

fn check_odd_cycle(graph: &Graph, raw: &[u64]) -> Result<(), String> {
    if raw.len() < 3 {
        return Err(format!(
            "cycle has {} vertices; a cycle needs at least 3",
            raw.len()
        ));
    }
    if raw.len() % 2 == 0 {
        return Err(format!("cycle length {} is even", raw.len()));
    }
    let cycle = distinct_vertices(graph, raw)?;
    check_cycle_edges(graph, &cycle)
}

fn check_hamiltonian_cycle(graph: &Graph, raw: &[u64]) -> Result<(), String> {
    if graph.vertices < 3 {
        return Err(format!(
            "a graph with {} vertices has no Hamiltonian cycle",
            graph.vertices
        ));
    }
    if raw.len() != graph.vertices as usize {
        return Err(format!(
            "cycle visits {} vertices but the graph has {}",
            raw.len(),
            graph.vertices
        ));
    }
    let cycle = distinct_vertices(graph, raw)?;
    check_cycle_edges(graph, &cycle)
}

/// Union-find over `0..n` with path halving and union by size.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; `false` when they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }
}
