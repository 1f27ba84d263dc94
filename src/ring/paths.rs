// ring/paths.rs - Shortest-Path Enumeration and Key Selection

use std::collections::VecDeque;

use ed25519_dalek::VerifyingKey;

use super::graph::{NodeHandle, TrustGraph};

/// All shortest paths from a fixed root, as hop distances plus the full
/// predecessor sets. Unit edge weights, so plain BFS.
///
/// Predecessors are recorded in discovery order; together with the graph's
/// insertion-ordered adjacency this makes path enumeration, and therefore
/// key tie-breaking, deterministic.
#[derive(Debug)]
pub(crate) struct ShortestPaths {
    dist: Vec<Option<usize>>,
    preds: Vec<Vec<NodeHandle>>,
}

impl ShortestPaths {
    /// Run BFS over the current graph from `root`
    pub fn compute(graph: &TrustGraph, root: NodeHandle) -> Self {
        let n = graph.node_count();
        let mut dist: Vec<Option<usize>> = vec![None; n];
        let mut preds: Vec<Vec<NodeHandle>> = vec![Vec::new(); n];

        dist[root.index()] = Some(0);
        let mut queue = VecDeque::new();
        queue.push_back((root, 0usize));

        while let Some((u, du)) = queue.pop_front() {
            for &v in graph.neighbors(u) {
                let dv = du + 1;
                match dist[v.index()] {
                    None => {
                        dist[v.index()] = Some(dv);
                        preds[v.index()].push(u);
                        queue.push_back((v, dv));
                    }
                    // another equally-short way in
                    Some(d) if d == dv => preds[v.index()].push(u),
                    Some(_) => {}
                }
            }
        }

        Self { dist, preds }
    }

    /// Hop distance from the root, `None` when unreachable
    pub fn distance(&self, to: NodeHandle) -> Option<usize> {
        self.dist[to.index()]
    }

    /// Every shortest root->target path, each as root..=target.
    ///
    /// Unreachable targets yield no paths; the root itself yields the
    /// single trivial path.
    pub fn all_paths_to(&self, target: NodeHandle) -> Vec<Vec<NodeHandle>> {
        if self.dist[target.index()].is_none() {
            return Vec::new();
        }

        let mut paths = Vec::new();
        let mut suffix = Vec::new();
        self.collect(target, &mut suffix, &mut paths);
        paths
    }

    // Backtrack through the predecessor sets; `suffix` holds the path from
    // the target back to the current node.
    fn collect(&self, node: NodeHandle, suffix: &mut Vec<NodeHandle>, out: &mut Vec<Vec<NodeHandle>>) {
        suffix.push(node);
        let preds = &self.preds[node.index()];
        if preds.is_empty() {
            // only the root has no shortest-path predecessor
            out.push(suffix.iter().rev().copied().collect());
        } else {
            for &p in preds {
                self.collect(p, suffix, out);
            }
        }
        suffix.pop();
    }
}

/// Pick the winning key among equally-shortest paths and retain only the
/// paths endorsing it.
///
/// The winner is the key asserted by the final edge of the most paths;
/// ties go to the key of the first path observed in traversal order. An
/// empty path set (or paths without a final edge) yields no key.
pub(crate) fn select_best_paths(
    graph: &TrustGraph,
    paths: Vec<Vec<NodeHandle>>,
) -> (Vec<Vec<NodeHandle>>, Option<VerifyingKey>) {
    // tally in first-observed order
    let mut tally: Vec<([u8; 32], usize)> = Vec::new();
    for p in &paths {
        if p.len() < 2 {
            continue;
        }
        let bytes = final_edge_key(graph, p).to_bytes();
        match tally.iter_mut().find(|(k, _)| *k == bytes) {
            Some((_, n)) => *n += 1,
            None => tally.push((bytes, 1)),
        }
    }

    let mut winner: Option<[u8; 32]> = None;
    let mut max = 0usize;
    for &(key, n) in &tally {
        // strictly greater, so a tie keeps the earlier key
        if n > max {
            max = n;
            winner = Some(key);
        }
    }
    let Some(winner) = winner else {
        return (Vec::new(), None);
    };

    let mut best_key = None;
    let retained: Vec<Vec<NodeHandle>> = paths
        .into_iter()
        .filter(|p| {
            if p.len() < 2 {
                return false;
            }
            let key = final_edge_key(graph, p);
            if key.to_bytes() == winner {
                best_key = Some(*key);
                true
            } else {
                false
            }
        })
        .collect();

    (retained, best_key)
}

/// Probability that at least one of the given shortest endorsement chains
/// holds: each path contributes the product of the trust probabilities of
/// its internal nodes (the root counts as 1.0 and the terminal is
/// excluded), and the paths combine as a disjunction.
pub(crate) fn min_paths_probability(graph: &TrustGraph, paths: &[Vec<NodeHandle>]) -> f64 {
    if paths.is_empty() {
        return 0.0;
    }

    let mut all_chains_fail = 1.0;
    for p in paths {
        if p.len() < 2 {
            continue;
        }
        let mut chain_holds = 1.0;
        for &h in &p[1..p.len() - 1] {
            chain_holds *= graph.probability(h);
        }
        all_chains_fail *= 1.0 - chain_holds;
    }
    1.0 - all_chains_fail
}

fn final_edge_key<'a>(graph: &'a TrustGraph, path: &[NodeHandle]) -> &'a VerifyingKey {
    let s = path[path.len() - 2];
    let t = path[path.len() - 1];
    match graph.edge_key(s, t) {
        Some(key) => key,
        None => panic!(
            "signing edge {} -> {} vanished during path traversal",
            graph.name(s),
            graph.name(t)
        ),
    }
}
