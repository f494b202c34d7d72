//! Graph sampling for each random model.
//!
//! Every sampler draws from the caller's RNG only, in a fixed order, and
//! returns canonical edge lists (`u < v`, strictly ascending).

use std::collections::BTreeSet;

use certlab_kernel::Graph;
use rand::seq::index;
use rand::Rng;

use crate::config::GraphModel;

/// A sampled graph plus the vertices planted as a clique, if any.
pub(crate) struct Sample {
    pub graph: Graph,
    pub planted: Option<Vec<u32>>,
}

pub(crate) fn sample<R: Rng>(rng: &mut R, vertices: u32, model: &GraphModel) -> Sample {
    match model {
        GraphModel::Gnp { edge_probability } => Sample {
            graph: canonical(vertices, gnp_edges(rng, vertices, *edge_probability)),
            planted: None,
        },
        GraphModel::Gnm { edges } => Sample {
            graph: canonical(vertices, gnm_edges(rng, vertices, *edges)),
            planted: None,
        },
        GraphModel::PlantedClique {
            edge_probability,
            clique_size,
        } => {
            let mut edges = gnp_edges(rng, vertices, *edge_probability);
            let mut clique: Vec<u32> = index::sample(rng, vertices as usize, *clique_size as usize)
                .into_iter()
                .map(|v| v as u32)
                .collect();
            clique.sort_unstable();
            for (i, &u) in clique.iter().enumerate() {
                for &v in &clique[i + 1..] {
                    edges.insert((u, v));
                }
            }
            Sample {
                graph: canonical(vertices, edges),
                planted: Some(clique),
            }
        }
    }
}

fn canonical(vertices: u32, edges: BTreeSet<(u32, u32)>) -> Graph {
    Graph {
        vertices,
        edges: edges.into_iter().collect(),
    }
}

fn gnp_edges<R: Rng>(rng: &mut R, n: u32, p: f64) -> BTreeSet<(u32, u32)> {
    let mut edges = BTreeSet::new();
    for u in 0..n {
        for v in u + 1..n {
            if rng.gen_bool(p) {
                edges.insert((u, v));
            }
        }
    }
    edges
}

/// Uniform `m`-subset of the vertex pairs.
///
/// Dense requests pick the pairs to leave out instead, so the rejection loop
/// always runs against a set at most half full.
fn gnm_edges<R: Rng>(rng: &mut R, n: u32, m: u64) -> BTreeSet<(u32, u32)> {
    let max = Graph::max_edges(n);
    if m * 2 <= max {
        return random_pairs(rng, n, m);
    }
    let excluded = random_pairs(rng, n, max - m);
    let mut edges = BTreeSet::new();
    for u in 0..n {
        for v in u + 1..n {
            if !excluded.contains(&(u, v)) {
                edges.insert((u, v));
            }
        }
    }
    edges
}

fn random_pairs<R: Rng>(rng: &mut R, n: u32, count: u64) -> BTreeSet<(u32, u32)> {
    let mut pairs = BTreeSet::new();
    while (pairs.len() as u64) < count {
        let a = rng.gen_range(0..n);
        let b = rng.gen_range(0..n);
        if a != b {
            pairs.insert((a.min(b), a.max(b)));
        }
    }
    pairs
}
