// ring/graph.rs - Directed Signing Graph

use std::collections::HashMap;

use ed25519_dalek::VerifyingKey;
use thiserror::Error;

/// Errors raised by edge insertion
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown edge endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("self-signature edge rejected for: {0}")]
    SelfEdge(String),
}

/// Stable handle to a node in the signing graph.
///
/// Handles index an append-only arena, so they stay valid for the lifetime
/// of the graph and are safe to hold across mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    /// Arena index of the handle
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct NodeEntry {
    name: String,
    probability: f64,
}

/// Directed graph of signing relations.
///
/// Nodes are identities carrying a trust probability; an edge
/// (signer, target) carries the public key the signer asserted for the
/// target. Each ordered pair resolves to at most one edge; a later insert
/// for the same pair replaces the asserted key. Nodes are never removed.
///
/// Out-neighbors are kept in insertion order, which makes every traversal
/// of the graph deterministic.
#[derive(Debug, Default)]
pub struct TrustGraph {
    nodes: Vec<NodeEntry>,
    index: HashMap<String, NodeHandle>,
    out: Vec<Vec<NodeHandle>>,
    edges: HashMap<(NodeHandle, NodeHandle), VerifyingKey>,
}

impl TrustGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a node with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Handle of the named node
    pub fn handle(&self, name: &str) -> Option<NodeHandle> {
        self.index.get(name).copied()
    }

    /// Name of the node behind a handle
    pub fn name(&self, h: NodeHandle) -> &str {
        &self.nodes[h.0].name
    }

    /// Current trust probability of the node
    pub fn probability(&self, h: NodeHandle) -> f64 {
        self.nodes[h.0].probability
    }

    /// Overwrite the trust probability of an existing node
    pub fn set_probability(&mut self, h: NodeHandle, probability: f64) {
        self.nodes[h.0].probability = probability;
    }

    /// Insert a node, or update its probability if the name is known.
    /// Returns the node's handle either way.
    pub fn add_node(&mut self, name: &str, probability: f64) -> NodeHandle {
        if let Some(&h) = self.index.get(name) {
            self.nodes[h.0].probability = probability;
            return h;
        }

        let h = NodeHandle(self.nodes.len());
        self.nodes.push(NodeEntry {
            name: name.to_owned(),
            probability,
        });
        self.out.push(Vec::new());
        self.index.insert(name.to_owned(), h);
        h
    }

    /// Insert or replace the (signer, target) edge with the asserted key.
    ///
    /// Both endpoints must already exist and a node cannot sign its own
    /// key.
    pub fn add_edge(
        &mut self,
        signer: &str,
        target: &str,
        key: VerifyingKey,
    ) -> Result<(), GraphError> {
        let s = self
            .handle(signer)
            .ok_or_else(|| GraphError::UnknownEndpoint(signer.to_owned()))?;
        let t = self
            .handle(target)
            .ok_or_else(|| GraphError::UnknownEndpoint(target.to_owned()))?;
        if s == t {
            return Err(GraphError::SelfEdge(signer.to_owned()));
        }

        if self.edges.insert((s, t), key).is_none() {
            self.out[s.0].push(t);
        }
        Ok(())
    }

    /// Out-neighbors of a node, in edge insertion order
    pub fn neighbors(&self, h: NodeHandle) -> &[NodeHandle] {
        &self.out[h.0]
    }

    /// Key asserted on the (signer, target) edge, if that edge exists
    pub fn edge_key(&self, signer: NodeHandle, target: NodeHandle) -> Option<&VerifyingKey> {
        self.edges.get(&(signer, target))
    }

    /// All node handles, in insertion order
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        (0..self.nodes.len()).map(NodeHandle)
    }

    /// All edges as (signer, target, asserted key)
    pub fn edges(&self) -> impl Iterator<Item = (NodeHandle, NodeHandle, &VerifyingKey)> + '_ {
        self.edges.iter().map(|(&(s, t), key)| (s, t, key))
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
