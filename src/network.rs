use crate::config::{NetworkConfig, NetworkType};
use crate::error::EngineError;
use fnv::FnvHashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

pub type NodeId = u32;

/// Undirected contact graph over the agent population. Generated once per
/// repetition from the repetition's sub-seeded generator and immutable
/// afterwards. Neighbor lists are sorted ascending so edge iteration order is
/// reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkGraph {
    n: usize,
    n_edges: usize,
    // Indexed by node id; (neighbor id, contact weight)
    adjacency: Vec<Vec<(NodeId, f32)>>,
}

impl NetworkGraph {
    pub fn generate(conf: &NetworkConfig, rng: &mut StdRng) -> Result<NetworkGraph, EngineError> {
        validate(conf)?;
        let edges = match conf.kind {
            NetworkType::Random => random_edges(conf.n, conf.k, rng),
            NetworkType::SmallWorld => small_world_edges(conf.n, conf.k, conf.beta, rng),
            NetworkType::ScaleFree => scale_free_edges(conf.n, conf.k, rng),
        };
        Ok(NetworkGraph::from_edges(conf.n, &edges))
    }

    pub(crate) fn from_edges(n: usize, edges: &FnvHashSet<(NodeId, NodeId)>) -> NetworkGraph {
        let mut adjacency: Vec<Vec<(NodeId, f32)>> = vec![Vec::new(); n];
        for &(a, b) in edges.iter() {
            adjacency[a as usize].push((b, 1.));
            adjacency[b as usize].push((a, 1.));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_by_key(|(id, _)| *id);
        }
        NetworkGraph {
            n,
            n_edges: edges.len(),
            adjacency,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.n
    }

    pub fn n_edges(&self) -> usize {
        self.n_edges
    }

    pub fn degree(&self, id: usize) -> usize {
        self.adjacency[id].len()
    }

    pub fn avg_degree(&self) -> f32 {
        2. * self.n_edges as f32 / self.n as f32
    }

    // O(degree) iteration, ascending neighbor id
    pub fn neighbors(&self, id: usize) -> &[(NodeId, f32)] {
        &self.adjacency[id]
    }
}

fn validate(conf: &NetworkConfig) -> Result<(), EngineError> {
    if conf.n < 2 {
        return Err(EngineError::InvalidNetworkConfig(format!(
            "n must be at least 2, got {}",
            conf.n
        )));
    }
    if conf.k < 2 || conf.k >= conf.n {
        return Err(EngineError::InvalidNetworkConfig(format!(
            "k must satisfy 2 <= k < n, got k={} n={}",
            conf.k, conf.n
        )));
    }
    if !conf.beta.is_finite() || conf.beta < 0. || conf.beta > 1. {
        return Err(EngineError::InvalidNetworkConfig(format!(
            "beta must be in [0, 1], got {}",
            conf.beta
        )));
    }
    Ok(())
}

fn norm(a: usize, b: usize) -> (NodeId, NodeId) {
    if a < b {
        (a as NodeId, b as NodeId)
    } else {
        (b as NodeId, a as NodeId)
    }
}

// Erdos-Renyi G(n, p) with p = k/(n-1), via geometric skip sampling so large
// populations stay O(n + m) instead of O(n^2).
fn random_edges(n: usize, k: usize, rng: &mut StdRng) -> FnvHashSet<(NodeId, NodeId)> {
    let mut edges = FnvHashSet::default();
    let p = k as f64 / (n as f64 - 1.);
    if p >= 1. {
        for a in 0..n {
            for b in (a + 1)..n {
                edges.insert(norm(a, b));
            }
        }
        return edges;
    }

    let lp = (1. - p).ln();
    let mut v: i64 = 1;
    let mut w: i64 = -1;
    while (v as usize) < n {
        let r: f64 = rng.gen();
        let skip = ((1. - r).ln() / lp).floor() as i64;
        w = w + 1 + skip;
        while w >= v && (v as usize) < n {
            w -= v;
            v += 1;
        }
        if (v as usize) < n {
            edges.insert(norm(w as usize, v as usize));
        }
    }
    edges
}

// Watts-Strogatz: ring lattice joining each node to its k/2 nearest
// neighbors per side, then each lattice edge rewired with probability beta
// to a uniformly random target, avoiding self-loops and duplicates. Nodes
// adjacent to everyone are skipped.
fn small_world_edges(n: usize, k: usize, beta: f32, rng: &mut StdRng) -> FnvHashSet<(NodeId, NodeId)> {
    let half = k / 2;
    let mut edges = FnvHashSet::default();
    let mut degree = vec![0usize; n];

    for u in 0..n {
        for off in 1..=half {
            let v = (u + off) % n;
            if u != v && edges.insert(norm(u, v)) {
                degree[u] += 1;
                degree[v] += 1;
            }
        }
    }

    for off in 1..=half {
        for u in 0..n {
            let v = (u + off) % n;
            if u == v || rng.gen::<f32>() >= beta {
                continue;
            }
            if degree[u] >= n - 1 {
                continue;
            }
            let mut w = rng.gen_range(0, n);
            while w == u || edges.contains(&norm(u, w)) {
                w = rng.gen_range(0, n);
            }
            if edges.remove(&norm(u, v)) {
                degree[u] -= 1;
                degree[v] -= 1;
            }
            edges.insert(norm(u, w));
            degree[u] += 1;
            degree[w] += 1;
        }
    }
    edges
}

// Barabasi-Albert preferential attachment: a seed clique of m+1 nodes, then
// each new node attaches to m = k/2 distinct existing nodes chosen with
// probability proportional to current degree (repeated-endpoints sampling).
fn scale_free_edges(n: usize, k: usize, rng: &mut StdRng) -> FnvHashSet<(NodeId, NodeId)> {
    let m = (k / 2).max(1);
    let m0 = (m + 1).min(n);
    let mut edges = FnvHashSet::default();

    // Each edge contributes both endpoints, so a draw from this list is a
    // degree-proportional draw.
    let mut endpoints: Vec<NodeId> = Vec::new();
    for a in 0..m0 {
        for b in (a + 1)..m0 {
            edges.insert(norm(a, b));
            endpoints.push(a as NodeId);
            endpoints.push(b as NodeId);
        }
    }

    for v in m0..n {
        let mut targets = FnvHashSet::default();
        while targets.len() < m {
            let t = *endpoints.choose(rng).unwrap();
            targets.insert(t);
        }
        let mut targets: Vec<NodeId> = targets.into_iter().collect();
        targets.sort();
        for t in targets {
            edges.insert(norm(v, t as usize));
            endpoints.push(t);
            endpoints.push(v as NodeId);
        }
    }
    edges
}
